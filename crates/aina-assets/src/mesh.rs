use aina_core::PartId;

/// Decoded vertex streams of one glTF primitive (renderer-agnostic).
#[derive(Debug, Clone, PartialEq)]
pub struct PartGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    /// Texture coordinates with V already flipped (`v' = 1 - v`).
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub indices: Option<Vec<u32>>,
}

impl PartGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Triangle count: indices / 3 when indexed, otherwise vertices / 3.
    pub fn face_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }
}

/// A single drawable unit produced from one mesh primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct PartData {
    pub id: PartId,
    /// Mesh name, or `Mesh_<i>_Prim_<j>` when the mesh is unnamed.
    pub name: String,
    pub mesh_index: usize,
    pub primitive_index: usize,
    pub material: Option<usize>,
    /// Image bound through the material's base-color texture.
    pub base_color_image: Option<usize>,
    /// `None` when the primitive was skipped (missing or undecodable attributes).
    pub geometry: Option<PartGeometry>,
}

/// Texture references of one material.
///
/// Only `base_color_image` is bound for rendering; the other channels are kept
/// for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialInfo {
    pub index: usize,
    pub name: Option<String>,
    pub base_color_image: Option<usize>,
    pub metallic_roughness_image: Option<usize>,
    pub normal_image: Option<usize>,
    pub occlusion_image: Option<usize>,
    pub emissive_image: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_count_prefers_indices() {
        let mut geometry = PartGeometry {
            positions: vec![[0.0; 3]; 100],
            normals: None,
            tex_coords: None,
            indices: Some((0..300).map(|i| i % 100).collect()),
        };
        assert_eq!(geometry.face_count(), 100);

        geometry.indices = None;
        assert_eq!(geometry.face_count(), 33);
    }
}
