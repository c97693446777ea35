//! GPU backend seam
//!
//! Every GPU-touching operation goes through [`GpuBackend`], so resource
//! lifecycle and draw orchestration can run against the in-memory
//! [`HeadlessBackend`](crate::HeadlessBackend) as well as Vulkan.

use aina_assets::TextureAsset;
use aina_core::{Color, PartId, RenderMode};
use glam::Mat4;

use crate::error::RenderError;

/// Opaque handle to a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(u64);

impl BufferHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque handle to a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u64);

impl TextureHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Vertex stream stored in a float buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Positions,
    Normals,
    TexCoords,
}

impl BufferKind {
    /// Floats per vertex
    pub fn components(self) -> usize {
        match self {
            BufferKind::Positions | BufferKind::Normals => 3,
            BufferKind::TexCoords => 2,
        }
    }
}

/// Minification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinFilter {
    Linear,
    /// Trilinear; requires a mipmap chain
    LinearMipmapLinear,
}

/// How a texture is sampled. Magnification is always linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSettings {
    pub min_filter: MinFilter,
    /// Repeat on both axes when set, clamp to edge otherwise.
    pub repeat: bool,
}

impl SamplerSettings {
    /// Mipmapped, repeating
    pub const TRILINEAR: SamplerSettings = SamplerSettings {
        min_filter: MinFilter::LinearMipmapLinear,
        repeat: true,
    };

    /// Single level, repeating
    pub const LINEAR: SamplerSettings = SamplerSettings {
        min_filter: MinFilter::Linear,
        repeat: true,
    };

    pub fn wants_mipmaps(&self) -> bool {
        self.min_filter == MinFilter::LinearMipmapLinear
    }
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self::TRILINEAR
    }
}

/// Per-frame parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub model_view: Mat4,
    pub projection: Mat4,
    pub clear_color: Color,
    pub mode: RenderMode,
}

/// Result of starting a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Draw calls will be recorded
    Ready,
    /// No image available (minimized, swapchain out of date); skip drawing.
    Skipped,
}

/// One draw of one part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub part: PartId,
    pub positions: BufferHandle,
    pub normals: Option<BufferHandle>,
    /// Only bound when `texture` is set.
    pub tex_coords: Option<BufferHandle>,
    pub texture: Option<TextureHandle>,
    /// Indexed draw when present, array draw otherwise.
    pub indices: Option<BufferHandle>,
    /// Indices (or vertices) to draw: `face_count * 3`.
    pub element_count: u32,
    pub mode: RenderMode,
}

/// Operations the resource manager and render loop need from a GPU.
pub trait GpuBackend {
    /// Upload a float vertex stream (`kind.components()` floats per vertex).
    fn create_vertex_buffer(
        &mut self,
        kind: BufferKind,
        data: &[f32],
    ) -> Result<BufferHandle, RenderError>;

    /// Replace the contents of a vertex buffer. The length must not change.
    fn update_vertex_buffer(&mut self, handle: BufferHandle, data: &[f32])
        -> Result<(), RenderError>;

    fn create_index_buffer(&mut self, data: &[u32]) -> Result<BufferHandle, RenderError>;

    /// Release a buffer. Unknown handles are ignored.
    fn delete_buffer(&mut self, handle: BufferHandle);

    /// Upload an RGBA8 texture. Fails with [`RenderError::Unsupported`] when
    /// the sampler asks for mipmaps the backend cannot generate.
    fn create_texture(
        &mut self,
        texture: &TextureAsset,
        sampler: SamplerSettings,
    ) -> Result<TextureHandle, RenderError>;

    /// Release a texture. Unknown handles are ignored.
    fn delete_texture(&mut self, handle: TextureHandle);

    fn supports_render_mode(&self, _mode: RenderMode) -> bool {
        true
    }

    fn begin_frame(&mut self, frame: &FrameParams) -> Result<FrameStatus, RenderError>;

    fn draw(&mut self, call: &DrawCall) -> Result<(), RenderError>;

    fn end_frame(&mut self) -> Result<(), RenderError>;
}

impl<B: GpuBackend + ?Sized> GpuBackend for Box<B> {
    fn create_vertex_buffer(
        &mut self,
        kind: BufferKind,
        data: &[f32],
    ) -> Result<BufferHandle, RenderError> {
        (**self).create_vertex_buffer(kind, data)
    }

    fn update_vertex_buffer(
        &mut self,
        handle: BufferHandle,
        data: &[f32],
    ) -> Result<(), RenderError> {
        (**self).update_vertex_buffer(handle, data)
    }

    fn create_index_buffer(&mut self, data: &[u32]) -> Result<BufferHandle, RenderError> {
        (**self).create_index_buffer(data)
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        (**self).delete_buffer(handle)
    }

    fn create_texture(
        &mut self,
        texture: &TextureAsset,
        sampler: SamplerSettings,
    ) -> Result<TextureHandle, RenderError> {
        (**self).create_texture(texture, sampler)
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        (**self).delete_texture(handle)
    }

    fn supports_render_mode(&self, mode: RenderMode) -> bool {
        (**self).supports_render_mode(mode)
    }

    fn begin_frame(&mut self, frame: &FrameParams) -> Result<FrameStatus, RenderError> {
        (**self).begin_frame(frame)
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        (**self).draw(call)
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        (**self).end_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components() {
        assert_eq!(BufferKind::Positions.components(), 3);
        assert_eq!(BufferKind::Normals.components(), 3);
        assert_eq!(BufferKind::TexCoords.components(), 2);
    }

    #[test]
    fn test_sampler_defaults_to_mipmaps() {
        assert!(SamplerSettings::default().wants_mipmaps());
        assert!(!SamplerSettings::LINEAR.wants_mipmaps());
    }
}
