//! First-person observer camera.

use glam::{Mat4, Quat, Vec3};

use crate::params::RenderConfig;

/// Perspective camera described by a position and yaw/pitch angles
///
/// Yaw 0 and pitch 0 look down -Z, matching the bodies' forward axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,

    /// Rotation around +Y (radians)
    pub yaw: f32,

    /// Rotation around the camera's right axis (radians, positive looks up)
    pub pitch: f32,

    fov_y_rad: f32,
    aspect: f32,
    near_m: f32,
    far_m: f32,
}

impl Camera {
    /// Create camera from rendering configuration
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            position: Vec3::from_array(config.camera_start),
            yaw: 0.0,
            pitch: 0.0,
            fov_y_rad: config.fov_degrees.to_radians(),
            aspect: config.aspect_ratio(),
            near_m: config.near_plane_m,
            far_m: config.far_plane_m,
        }
    }

    /// World-space orientation
    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    /// Unit view direction
    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    /// Unit right vector (always horizontal, the camera never rolls)
    pub fn right(&self) -> Vec3 {
        self.orientation() * Vec3::X
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_rad, self.aspect, self.near_m, self.far_m)
    }

    pub fn view_proj_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Transform a world-space direction into view space
    pub fn direction_to_view(&self, world_dir: Vec3) -> Vec3 {
        self.view_matrix().transform_vector3(world_dir).normalize_or_zero()
    }

    /// Update projection for a new viewport size (pixels)
    ///
    /// Zero-sized viewports (minimized windows) are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_looks_down_negative_z() {
        let camera = Camera::new(&RenderConfig::default());
        assert!(camera.forward().distance(Vec3::NEG_Z) < 1e-6);
        assert!(camera.right().distance(Vec3::X) < 1e-6);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_view_proj_matrix_generation() {
        let camera = Camera::new(&RenderConfig::default());
        let view_proj = camera.view_proj_matrix();

        assert_ne!(view_proj, Mat4::IDENTITY);
        assert_ne!(view_proj, Mat4::ZERO);
        assert!(view_proj.is_finite());
    }

    #[test]
    fn test_direction_to_view_for_default_camera() {
        let camera = Camera::new(&RenderConfig::default());
        // Unrotated camera: world and view axes coincide
        let dir = camera.direction_to_view(Vec3::new(1.0, 1.0, 1.0));
        assert!(dir.distance(Vec3::ONE.normalize()) < 1e-5);
    }

    #[test]
    fn test_set_viewport_ignores_zero_size() {
        let mut camera = Camera::new(&RenderConfig::default());
        let before = camera.aspect();
        camera.set_viewport(0, 600);
        assert_eq!(camera.aspect(), before);
        camera.set_viewport(800, 400);
        assert_eq!(camera.aspect(), 2.0);
    }

    #[test]
    fn test_yaw_turns_left() {
        let mut camera = Camera::new(&RenderConfig::default());
        camera.yaw = std::f32::consts::FRAC_PI_2;
        assert!(camera.forward().distance(Vec3::NEG_X) < 1e-5);
    }
}
