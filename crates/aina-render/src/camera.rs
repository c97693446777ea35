//! Orbit camera for the pet model

use glam::{Mat4, Vec2, Vec3};

/// Near clip plane distance
pub const NEAR: f32 = 2.0;
/// Far clip plane distance
pub const FAR: f32 = 100.0;

/// Pointer sensitivities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Degrees of rotation per pixel dragged
    pub rotate_sensitivity: f32,
    /// World units of pan per pixel dragged
    pub pan_sensitivity: f32,
    /// World units of zoom per wheel unit (120 units per notch)
    pub zoom_sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            rotate_sensitivity: 0.5,
            pan_sensitivity: 0.01,
            zoom_sensitivity: 0.01,
        }
    }
}

/// Orbit rotation, pan, and signed zoom distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub config: CameraConfig,
    /// Rotation about X in degrees
    pub pitch: f32,
    /// Rotation about Y in degrees
    pub yaw: f32,
    pub pan: Vec2,
    /// Translation along Z; negative moves the model away
    pub zoom: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            config: CameraConfig::default(),
            pitch: 30.0,
            yaw: 30.0,
            pan: Vec2::ZERO,
            zoom: -4.0,
        }
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotate by a pointer drag in pixels: horizontal spins about Y,
    /// vertical tilts about X.
    pub fn rotate_by(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.config.rotate_sensitivity;
        self.pitch += dy * self.config.rotate_sensitivity;
    }

    /// Pan by a pointer drag in pixels. Screen Y grows downwards.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan.x += dx * self.config.pan_sensitivity;
        self.pan.y -= dy * self.config.pan_sensitivity;
    }

    /// Zoom by wheel units; positive moves the model closer.
    pub fn zoom_by(&mut self, delta: f32) {
        self.zoom += delta * self.config.zoom_sensitivity;
    }

    /// Model-view: translate(pan) * translate(0, 0, zoom) * rotX(pitch) * rotY(yaw)
    pub fn model_view(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(self.pan.x, self.pan.y, 0.0))
            * Mat4::from_translation(Vec3::new(0.0, 0.0, self.zoom))
            * Mat4::from_rotation_x(self.pitch.to_radians())
            * Mat4::from_rotation_y(self.yaw.to_radians())
    }

    /// Frustum spanning `[-aspect, aspect] x [-1, 1]` at the near plane,
    /// in Vulkan clip space (Y down, depth 0..1).
    pub fn projection(aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        let fov_y = 2.0 * (1.0 / NEAR).atan();
        let flip_y = Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0));
        flip_y * Mat4::perspective_rh(fov_y, aspect, NEAR, FAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_defaults() {
        let camera = OrbitCamera::default();
        assert_eq!((camera.pitch, camera.yaw, camera.zoom), (30.0, 30.0, -4.0));
        assert_eq!(camera.pan, Vec2::ZERO);
    }

    #[test]
    fn test_input_sensitivities() {
        let mut camera = OrbitCamera::default();
        camera.rotate_by(10.0, -4.0);
        assert_eq!(camera.yaw, 35.0);
        assert_eq!(camera.pitch, 28.0);

        camera.pan_by(100.0, 50.0);
        assert!(approx(camera.pan.x, 1.0));
        assert!(approx(camera.pan.y, -0.5));

        camera.zoom_by(120.0);
        assert!(approx(camera.zoom, -2.8));
    }

    #[test]
    fn test_transform_order() {
        let mut camera = OrbitCamera::default();
        camera.pitch = 0.0;
        camera.yaw = 90.0;
        camera.pan = Vec2::new(1.0, 2.0);
        camera.zoom = -5.0;

        // Yaw first: +X rotates to -Z, then zoom and pan translate.
        let p = camera.model_view() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!(approx(p.x, 1.0));
        assert!(approx(p.y, 2.0));
        assert!(approx(p.z, -6.0));
    }

    #[test]
    fn test_projection_matches_frustum() {
        let aspect = 1.5;
        let projection = OrbitCamera::projection(aspect);

        // Right edge of the near plane maps to x = 1, top edge to y = -1.
        let right = projection * Vec4::new(aspect, 0.0, -NEAR, 1.0);
        assert!(approx(right.x / right.w, 1.0));
        assert!(approx(right.z / right.w, 0.0));

        let top = projection * Vec4::new(0.0, 1.0, -NEAR, 1.0);
        assert!(approx(top.y / top.w, -1.0));

        let far = projection * Vec4::new(0.0, 0.0, -FAR, 1.0);
        assert!(approx(far.z / far.w, 1.0));
    }
}
