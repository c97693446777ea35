//! GPU resource manager
//!
//! Owns every per-part buffer handle and every texture handle created for the
//! current model. Optional streams live inside [`PartBuffers`], next to the
//! mandatory position buffer, so a part can never be textured, lit, or
//! indexed without position data.

use std::collections::BTreeMap;

use aina_assets::{PartData, TextureAsset};
use aina_core::{PartId, PartInfo, RenderMode};
use tracing::{debug, info, warn};

use crate::backend::{BufferHandle, BufferKind, DrawCall, GpuBackend, SamplerSettings, TextureHandle};
use crate::error::RenderError;

/// GPU buffers of one part.
#[derive(Debug, Clone, PartialEq)]
pub struct PartBuffers {
    pub positions: BufferHandle,
    pub normals: Option<BufferHandle>,
    pub tex_coords: Option<BufferHandle>,
    /// `None` means array drawing.
    pub indices: Option<BufferHandle>,
    pub vertex_count: usize,
    pub face_count: usize,
    /// Host copy of the uploaded positions, kept for normalization.
    cpu_positions: Vec<[f32; 3]>,
}

impl PartBuffers {
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.cpu_positions
    }

    fn handles(&self) -> impl Iterator<Item = BufferHandle> + '_ {
        std::iter::once(self.positions)
            .chain(self.normals)
            .chain(self.tex_coords)
            .chain(self.indices)
    }
}

/// A loaded part as seen by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct PartRecord {
    pub id: PartId,
    pub name: String,
    /// Base-color image index from the material, if any
    pub image: Option<usize>,
    /// `None` when the part could not be decoded or uploaded.
    pub buffers: Option<PartBuffers>,
}

#[derive(Debug, Default)]
pub struct GpuResources {
    parts: BTreeMap<PartId, PartRecord>,
    textures: BTreeMap<usize, TextureHandle>,
}

impl GpuResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release every buffer and texture and forget all parts.
    ///
    /// Idempotent. The visibility map is not owned here and is left alone.
    pub fn clear<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        if self.parts.is_empty() && self.textures.is_empty() {
            return;
        }

        let mut released = 0;
        for record in std::mem::take(&mut self.parts).into_values() {
            if let Some(buffers) = record.buffers {
                for handle in buffers.handles() {
                    backend.delete_buffer(handle);
                    released += 1;
                }
            }
        }
        let texture_count = self.textures.len();
        for handle in std::mem::take(&mut self.textures).into_values() {
            backend.delete_texture(handle);
        }

        debug!(
            "Released {} buffers and {} textures",
            released, texture_count
        );
    }

    /// Upload decoded textures, keyed by image index.
    ///
    /// Mipmapped sampling is tried first; a backend that cannot build the
    /// chain gets a single-level linear texture instead.
    pub fn upload_textures<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        textures: &[TextureAsset],
    ) {
        for texture in textures {
            let handle = match backend.create_texture(texture, SamplerSettings::TRILINEAR) {
                Ok(handle) => Ok(handle),
                Err(RenderError::Unsupported(reason)) => {
                    warn!(
                        "Texture {}: {} unavailable, falling back to linear filtering",
                        texture.image_index, reason
                    );
                    backend.create_texture(texture, SamplerSettings::LINEAR)
                }
                Err(e) => Err(e),
            };

            match handle {
                Ok(handle) => {
                    if let Some(old) = self.textures.insert(texture.image_index, handle) {
                        backend.delete_texture(old);
                    }
                }
                Err(e) => warn!("Failed to upload texture {}: {}", texture.image_index, e),
            }
        }
    }

    /// Create the GPU buffers of one part.
    ///
    /// Never fails: allocation problems are logged and the affected stream is
    /// recorded as absent. A part whose position buffer cannot be created is
    /// kept by name only.
    pub fn create<B: GpuBackend + ?Sized>(&mut self, backend: &mut B, part: &PartData) {
        let buffers = part
            .geometry
            .as_ref()
            .and_then(|geometry| {
                let positions = match backend
                    .create_vertex_buffer(BufferKind::Positions, flatten(&geometry.positions))
                {
                    Ok(handle) => handle,
                    Err(e) => {
                        warn!("Part {} ('{}'): vertex buffer failed: {}", part.id, part.name, e);
                        return None;
                    }
                };

                let vertex_count = geometry.vertex_count();
                let normals = geometry
                    .normals
                    .as_ref()
                    .filter(|normals| matches_vertex_count(normals.len(), vertex_count, "normal", part))
                    .and_then(|normals| {
                        optional_stream(backend, BufferKind::Normals, flatten(normals), part)
                    });
                let tex_coords = geometry
                    .tex_coords
                    .as_ref()
                    .filter(|uvs| matches_vertex_count(uvs.len(), vertex_count, "texcoord", part))
                    .and_then(|uvs| {
                        optional_stream(backend, BufferKind::TexCoords, flatten(uvs), part)
                    });

                let mut face_count = geometry.face_count();
                let indices = geometry.indices.as_ref().and_then(|indices| {
                    if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                        face_count = vertex_count / 3;
                        warn!(
                            "Part {} ('{}'): index {} out of range for {} vertices, drawing unindexed",
                            part.id, part.name, bad, vertex_count
                        );
                        return None;
                    }
                    match backend.create_index_buffer(indices) {
                        Ok(handle) => Some(handle),
                        Err(e) => {
                            face_count = vertex_count / 3;
                            warn!(
                                "Part {} ('{}'): index buffer failed, drawing {} faces unindexed: {}",
                                part.id, part.name, face_count, e
                            );
                            None
                        }
                    }
                });

                Some(PartBuffers {
                    positions,
                    normals,
                    tex_coords,
                    indices,
                    vertex_count,
                    face_count,
                    cpu_positions: geometry.positions.clone(),
                })
            });

        let record = PartRecord {
            id: part.id,
            name: part.name.clone(),
            image: part.base_color_image,
            buffers,
        };
        if let Some(old) = self.parts.insert(part.id, record) {
            warn!("Part {} created twice; releasing the earlier buffers", part.id);
            if let Some(buffers) = old.buffers {
                for handle in buffers.handles() {
                    backend.delete_buffer(handle);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty() && self.textures.is_empty()
    }

    /// Parts in ascending id order
    pub fn parts(&self) -> impl Iterator<Item = &PartRecord> {
        self.parts.values()
    }

    pub fn part(&self, id: PartId) -> Option<&PartRecord> {
        self.parts.get(&id)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Ordered `(id, name)` list
    pub fn part_infos(&self) -> Vec<PartInfo> {
        self.parts
            .values()
            .map(|record| PartInfo {
                id: record.id,
                name: record.name.clone(),
            })
            .collect()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Texture bound to a part through its material
    pub fn texture_for(&self, id: PartId) -> Option<TextureHandle> {
        let image = self.parts.get(&id)?.image?;
        self.textures.get(&image).copied()
    }

    /// Host copies of every uploaded position stream
    pub fn position_streams(&self) -> impl Iterator<Item = &[[f32; 3]]> {
        self.parts
            .values()
            .filter_map(|record| record.buffers.as_ref())
            .map(PartBuffers::positions)
    }

    /// Apply `transform` to every vertex and re-upload each position buffer.
    pub fn transform_positions<B, F>(&mut self, backend: &mut B, transform: F) -> Result<(), RenderError>
    where
        B: GpuBackend + ?Sized,
        F: Fn([f32; 3]) -> [f32; 3],
    {
        for record in self.parts.values_mut() {
            let Some(buffers) = record.buffers.as_mut() else {
                continue;
            };
            for position in buffers.cpu_positions.iter_mut() {
                *position = transform(*position);
            }
            backend.update_vertex_buffer(buffers.positions, flatten(&buffers.cpu_positions))?;
        }
        Ok(())
    }

    /// Draw call for a part, or `None` if it has nothing to draw.
    ///
    /// UVs are bound only together with a texture.
    pub fn draw_call(&self, id: PartId, mode: RenderMode) -> Option<DrawCall> {
        let record = self.parts.get(&id)?;
        let buffers = record.buffers.as_ref()?;
        if buffers.face_count == 0 {
            return None;
        }
        let texture = self.texture_for(id);
        Some(DrawCall {
            part: id,
            positions: buffers.positions,
            normals: buffers.normals,
            tex_coords: texture.and(buffers.tex_coords),
            texture,
            indices: buffers.indices,
            element_count: u32::try_from(buffers.face_count * 3).unwrap_or(u32::MAX),
            mode,
        })
    }

    /// Log a one-line summary of what is resident
    pub fn log_summary(&self) {
        let drawable = self.parts.values().filter(|r| r.buffers.is_some()).count();
        info!(
            "GPU resources: {} parts ({} drawable), {} textures",
            self.parts.len(),
            drawable,
            self.textures.len()
        );
    }
}

fn optional_stream<B: GpuBackend + ?Sized>(
    backend: &mut B,
    kind: BufferKind,
    data: &[f32],
    part: &PartData,
) -> Option<BufferHandle> {
    match backend.create_vertex_buffer(kind, data) {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Part {} ('{}'): {:?} buffer failed: {}", part.id, part.name, kind, e);
            None
        }
    }
}

fn matches_vertex_count(len: usize, vertex_count: usize, stream: &str, part: &PartData) -> bool {
    if len == vertex_count {
        return true;
    }
    warn!(
        "Part {} ('{}'): {} {} values for {} vertices, stream dropped",
        part.id, part.name, len, stream, vertex_count
    );
    false
}

fn flatten<const N: usize>(values: &[[f32; N]]) -> &[f32] {
    values.as_flattened()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{AllocationKind, HeadlessBackend};
    use aina_assets::PartGeometry;

    fn part(id: PartId, indexed: bool, with_uvs: bool, image: Option<usize>) -> PartData {
        let positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
        PartData {
            id,
            name: format!("part{}", id),
            mesh_index: id,
            primitive_index: 0,
            material: image,
            base_color_image: image,
            geometry: Some(PartGeometry {
                normals: Some(vec![[0.0, 0.0, 1.0]; positions.len()]),
                tex_coords: with_uvs.then(|| vec![[0.0, 1.0]; positions.len()]),
                indices: indexed.then(|| vec![0, 1, 2, 2, 1, 3]),
                positions,
            }),
        }
    }

    fn texture(image_index: usize) -> TextureAsset {
        TextureAsset {
            image_index,
            width: 2,
            height: 2,
            data: vec![128; 16],
        }
    }

    #[test]
    fn test_create_and_clear_releases_everything() {
        let mut backend = HeadlessBackend::new();
        let mut resources = GpuResources::new();

        resources.upload_textures(&mut backend, &[texture(0)]);
        resources.create(&mut backend, &part(0, true, true, Some(0)));
        resources.create(&mut backend, &part(1, false, false, None));

        assert_eq!(backend.live_buffers(), 4 + 2);
        assert_eq!(backend.live_textures(), 1);
        assert_eq!(resources.part_count(), 2);

        resources.clear(&mut backend);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.live_textures(), 0);
        assert!(resources.is_empty());

        resources.clear(&mut backend);
        assert!(resources.is_empty());
    }

    #[test]
    fn test_draw_call_binds_uvs_only_with_texture() {
        let mut backend = HeadlessBackend::new();
        let mut resources = GpuResources::new();
        resources.create(&mut backend, &part(0, true, true, Some(3)));

        let call = resources.draw_call(0, RenderMode::Solid).unwrap();
        assert_eq!(call.texture, None);
        assert_eq!(call.tex_coords, None);
        assert_eq!(call.element_count, 6);

        resources.upload_textures(&mut backend, &[texture(3)]);
        let call = resources.draw_call(0, RenderMode::Solid).unwrap();
        assert!(call.texture.is_some());
        assert!(call.tex_coords.is_some());
    }

    #[test]
    fn test_failed_vertex_buffer_keeps_name_only() {
        let mut backend = HeadlessBackend::new();
        backend.fail_allocations(AllocationKind::Vertex(BufferKind::Positions));
        let mut resources = GpuResources::new();
        resources.create(&mut backend, &part(0, true, true, None));

        let record = resources.part(0).unwrap();
        assert_eq!(record.name, "part0");
        assert!(record.buffers.is_none());
        assert_eq!(backend.live_buffers(), 0);
        assert!(resources.draw_call(0, RenderMode::Solid).is_none());
    }

    #[test]
    fn test_failed_optional_streams_are_absent() {
        let mut backend = HeadlessBackend::new();
        backend.fail_allocations(AllocationKind::Vertex(BufferKind::Normals));
        backend.fail_allocations(AllocationKind::Vertex(BufferKind::TexCoords));
        let mut resources = GpuResources::new();
        resources.create(&mut backend, &part(0, true, true, None));

        let buffers = resources.part(0).unwrap().buffers.as_ref().unwrap();
        assert!(buffers.normals.is_none());
        assert!(buffers.tex_coords.is_none());
        assert!(buffers.indices.is_some());
    }

    #[test]
    fn test_failed_index_buffer_falls_back_to_arrays() {
        let mut backend = HeadlessBackend::new();
        backend.fail_allocations(AllocationKind::Index);
        let mut resources = GpuResources::new();
        resources.create(&mut backend, &part(0, true, false, None));

        let buffers = resources.part(0).unwrap().buffers.as_ref().unwrap();
        assert!(buffers.indices.is_none());
        assert_eq!(buffers.face_count, 1);
        let call = resources.draw_call(0, RenderMode::Solid).unwrap();
        assert_eq!(call.element_count, 3);
        assert_eq!(call.indices, None);
    }

    #[test]
    fn test_out_of_range_indices_and_short_streams_are_dropped() {
        let mut backend = HeadlessBackend::new();
        let mut resources = GpuResources::new();
        let mut broken = part(0, true, true, None);
        if let Some(geometry) = broken.geometry.as_mut() {
            geometry.indices = Some(vec![0, 1, 7]);
            geometry.normals = Some(vec![[0.0, 0.0, 1.0]; 2]);
        }
        resources.create(&mut backend, &broken);

        let buffers = resources.part(0).unwrap().buffers.as_ref().unwrap();
        assert!(buffers.indices.is_none());
        assert!(buffers.normals.is_none());
        assert!(buffers.tex_coords.is_some());
        assert_eq!(buffers.face_count, 1);
    }

    #[test]
    fn test_texture_falls_back_without_mipmaps() {
        let mut backend = HeadlessBackend::new();
        backend.set_mipmaps_supported(false);
        let mut resources = GpuResources::new();
        resources.upload_textures(&mut backend, &[texture(0)]);
        resources.create(&mut backend, &part(0, false, true, Some(0)));

        let handle = resources.texture_for(0).unwrap();
        assert_eq!(backend.texture(handle).unwrap().sampler, SamplerSettings::LINEAR);
    }

    #[test]
    fn test_undecoded_part_has_no_buffers() {
        let mut backend = HeadlessBackend::new();
        let mut resources = GpuResources::new();
        let mut broken = part(0, false, false, None);
        broken.geometry = None;
        resources.create(&mut backend, &broken);

        assert_eq!(resources.part_infos()[0].name, "part0");
        assert!(resources.part(0).unwrap().buffers.is_none());
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_transform_positions_reuploads() {
        let mut backend = HeadlessBackend::new();
        let mut resources = GpuResources::new();
        resources.create(&mut backend, &part(0, false, false, None));

        resources
            .transform_positions(&mut backend, |[x, y, z]| [x * 2.0, y * 2.0, z])
            .unwrap();

        let handle = resources.part(0).unwrap().buffers.as_ref().unwrap().positions;
        assert_eq!(&backend.vertex_data(handle).unwrap()[3..6], &[2.0, 0.0, 0.0]);
        assert_eq!(resources.position_streams().next().unwrap()[1], [2.0, 0.0, 0.0]);
    }
}
