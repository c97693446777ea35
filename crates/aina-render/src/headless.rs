//! In-memory backend
//!
//! Keeps every buffer and texture in host memory and records each frame's
//! draw calls. Used by tests and by the `--inspect` command line mode.

use std::collections::{HashMap, HashSet};

use aina_assets::TextureAsset;
use aina_core::RenderMode;
use tracing::debug;

use crate::backend::{
    BufferHandle, BufferKind, DrawCall, FrameParams, FrameStatus, GpuBackend, SamplerSettings,
    TextureHandle,
};
use crate::error::RenderError;

/// Allocation class that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationKind {
    Vertex(BufferKind),
    Index,
    Texture,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BufferContents {
    Vertex { kind: BufferKind, data: Vec<f32> },
    Index(Vec<u32>),
}

impl BufferContents {
    /// Vertices for vertex buffers, indices for index buffers.
    pub fn element_count(&self) -> usize {
        match self {
            BufferContents::Vertex { kind, data } => data.len() / kind.components(),
            BufferContents::Index(indices) => indices.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessTexture {
    pub image_index: usize,
    pub width: u32,
    pub height: u32,
    pub sampler: SamplerSettings,
}

/// Draw calls issued between one `begin_frame`/`end_frame` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub params: FrameParams,
    pub draws: Vec<DrawCall>,
}

pub struct HeadlessBackend {
    next_handle: u64,
    buffers: HashMap<BufferHandle, BufferContents>,
    textures: HashMap<TextureHandle, HeadlessTexture>,
    failing: HashSet<AllocationKind>,
    mipmaps_supported: bool,
    supported_modes: HashSet<RenderMode>,
    current: Option<RecordedFrame>,
    frames: Vec<RecordedFrame>,
    buffers_created: usize,
    textures_created: usize,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            failing: HashSet::new(),
            mipmaps_supported: true,
            supported_modes: [RenderMode::Solid, RenderMode::Wireframe, RenderMode::Points]
                .into_iter()
                .collect(),
            current: None,
            frames: Vec::new(),
            buffers_created: 0,
            textures_created: 0,
        }
    }

    /// Make every future allocation of `kind` fail.
    pub fn fail_allocations(&mut self, kind: AllocationKind) {
        self.failing.insert(kind);
    }

    pub fn clear_failures(&mut self) {
        self.failing.clear();
    }

    /// Whether mipmapped textures can be created.
    pub fn set_mipmaps_supported(&mut self, supported: bool) {
        self.mipmaps_supported = supported;
    }

    pub fn set_render_mode_supported(&mut self, mode: RenderMode, supported: bool) {
        if supported {
            self.supported_modes.insert(mode);
        } else {
            self.supported_modes.remove(&mode);
        }
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Total buffers ever created, including deleted ones
    pub fn buffers_created(&self) -> usize {
        self.buffers_created
    }

    pub fn textures_created(&self) -> usize {
        self.textures_created
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<&BufferContents> {
        self.buffers.get(&handle)
    }

    /// Float contents of a vertex buffer
    pub fn vertex_data(&self, handle: BufferHandle) -> Option<&[f32]> {
        match self.buffers.get(&handle)? {
            BufferContents::Vertex { data, .. } => Some(data),
            BufferContents::Index(_) => None,
        }
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&HeadlessTexture> {
        self.textures.get(&handle)
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    fn allocate(&mut self, kind: AllocationKind) -> Result<u64, RenderError> {
        if self.failing.contains(&kind) {
            return Err(RenderError::Allocation(format!(
                "injected failure for {:?}",
                kind
            )));
        }
        let raw = self.next_handle;
        self.next_handle += 1;
        Ok(raw)
    }

    fn check_buffer(&self, handle: BufferHandle, what: &str) -> Result<&BufferContents, RenderError> {
        self.buffers
            .get(&handle)
            .ok_or_else(|| RenderError::UnknownHandle(format!("{} buffer {:?}", what, handle)))
    }
}

impl GpuBackend for HeadlessBackend {
    fn create_vertex_buffer(
        &mut self,
        kind: BufferKind,
        data: &[f32],
    ) -> Result<BufferHandle, RenderError> {
        if data.len() % kind.components() != 0 {
            return Err(RenderError::Allocation(format!(
                "{} floats is not a whole number of {:?} vertices",
                data.len(),
                kind
            )));
        }
        let handle = BufferHandle::from_raw(self.allocate(AllocationKind::Vertex(kind))?);
        self.buffers.insert(
            handle,
            BufferContents::Vertex {
                kind,
                data: data.to_vec(),
            },
        );
        self.buffers_created += 1;
        Ok(handle)
    }

    fn update_vertex_buffer(
        &mut self,
        handle: BufferHandle,
        data: &[f32],
    ) -> Result<(), RenderError> {
        match self.buffers.get_mut(&handle) {
            Some(BufferContents::Vertex { data: stored, .. }) if stored.len() == data.len() => {
                stored.copy_from_slice(data);
                Ok(())
            }
            Some(BufferContents::Vertex { data: stored, .. }) => Err(RenderError::Allocation(
                format!("update of {} floats into a buffer of {}", data.len(), stored.len()),
            )),
            Some(BufferContents::Index(_)) | None => Err(RenderError::UnknownHandle(format!(
                "vertex buffer {:?}",
                handle
            ))),
        }
    }

    fn create_index_buffer(&mut self, data: &[u32]) -> Result<BufferHandle, RenderError> {
        let handle = BufferHandle::from_raw(self.allocate(AllocationKind::Index)?);
        self.buffers
            .insert(handle, BufferContents::Index(data.to_vec()));
        self.buffers_created += 1;
        Ok(handle)
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        if self.buffers.remove(&handle).is_none() {
            debug!("Ignoring delete of unknown buffer {:?}", handle);
        }
    }

    fn create_texture(
        &mut self,
        texture: &TextureAsset,
        sampler: SamplerSettings,
    ) -> Result<TextureHandle, RenderError> {
        if sampler.wants_mipmaps() && !self.mipmaps_supported {
            return Err(RenderError::Unsupported("mipmap generation".into()));
        }
        let expected = texture.width as usize * texture.height as usize * 4;
        if texture.data.len() != expected {
            return Err(RenderError::Allocation(format!(
                "texture data is {} bytes, expected {}",
                texture.data.len(),
                expected
            )));
        }
        let handle = TextureHandle::from_raw(self.allocate(AllocationKind::Texture)?);
        self.textures.insert(
            handle,
            HeadlessTexture {
                image_index: texture.image_index,
                width: texture.width,
                height: texture.height,
                sampler,
            },
        );
        self.textures_created += 1;
        Ok(handle)
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        if self.textures.remove(&handle).is_none() {
            debug!("Ignoring delete of unknown texture {:?}", handle);
        }
    }

    fn supports_render_mode(&self, mode: RenderMode) -> bool {
        self.supported_modes.contains(&mode)
    }

    fn begin_frame(&mut self, frame: &FrameParams) -> Result<FrameStatus, RenderError> {
        if self.current.is_some() {
            return Err(RenderError::Frame("frame already in progress".into()));
        }
        self.current = Some(RecordedFrame {
            params: *frame,
            draws: Vec::new(),
        });
        Ok(FrameStatus::Ready)
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        if self.current.is_none() {
            return Err(RenderError::Frame("draw outside of a frame".into()));
        }

        let vertices = self.check_buffer(call.positions, "position")?.element_count();
        for (what, handle) in [("normal", call.normals), ("uv", call.tex_coords)] {
            if let Some(handle) = handle {
                self.check_buffer(handle, what)?;
            }
        }
        if let Some(texture) = call.texture {
            if !self.textures.contains_key(&texture) {
                return Err(RenderError::UnknownHandle(format!("texture {:?}", texture)));
            }
        }
        let available = match call.indices {
            Some(handle) => self.check_buffer(handle, "index")?.element_count(),
            None => vertices,
        };
        if call.element_count as usize > available {
            return Err(RenderError::Frame(format!(
                "part {} draws {} elements but only {} are bound",
                call.part, call.element_count, available
            )));
        }

        if let Some(frame) = self.current.as_mut() {
            frame.draws.push(*call);
        }
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        let frame = self
            .current
            .take()
            .ok_or_else(|| RenderError::Frame("end_frame without begin_frame".into()))?;
        self.frames.push(frame);
        Ok(())
    }
}
