//! Per-part shader parameters

use glam::Mat4;

/// Push constants for part rendering (128 bytes, the guaranteed minimum).
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PartPushConstants {
    pub mvp: [[f32; 4]; 4],
    /// Inverse-transpose of the model-view, for eye-space normals
    pub normal_matrix: [[f32; 4]; 4],
}

impl PartPushConstants {
    pub fn new(model_view: Mat4, projection: Mat4) -> Self {
        Self {
            mvp: (projection * model_view).to_cols_array_2d(),
            normal_matrix: model_view.inverse().transpose().to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_fits_minimum_push_constant_range() {
        assert_eq!(std::mem::size_of::<PartPushConstants>(), 128);
    }

    #[test]
    fn test_rotation_normal_matrix_is_rotation() {
        let rotation = Mat4::from_rotation_y(0.7);
        let pc = PartPushConstants::new(rotation, Mat4::IDENTITY);
        let normal = Mat4::from_cols_array_2d(&pc.normal_matrix);
        let n = normal.transform_vector3(Vec3::X);
        let r = rotation.transform_vector3(Vec3::X);
        assert!((n - r).length() < 1e-5);
    }
}
