//! Free-flying spectator integrator (mouse look + WASD).

use glam::Vec3;

use super::{LookInput, LookIntegrator};
use crate::camera::Camera;
use crate::params::LookConfig;

/// Yaw/pitch from pointer motion, translation along the camera basis
#[derive(Debug, Clone, Default)]
pub struct SpectatorIntegrator {
    config: LookConfig,
}

impl SpectatorIntegrator {
    pub fn new(config: LookConfig) -> Self {
        Self { config }
    }
}

impl LookIntegrator for SpectatorIntegrator {
    fn integrate(&mut self, camera: &mut Camera, input: &LookInput, delta_s: f32) {
        // Mouse right turns right, mouse down looks down
        let sens = self.config.sensitivity_rad_per_px;
        camera.yaw -= input.look_delta.x * sens;
        camera.pitch = (camera.pitch - input.look_delta.y * sens)
            .clamp(-self.config.pitch_limit_rad, self.config.pitch_limit_rad);

        let keys = &input.movement;
        if !keys.any() {
            return;
        }

        let axis = |pos: bool, neg: bool| pos as i32 as f32 - neg as i32 as f32;
        let dir = camera.forward() * axis(keys.forward, keys.back)
            + camera.right() * axis(keys.right, keys.left)
            + Vec3::Y * axis(keys.up, keys.down);

        camera.position += dir.normalize_or_zero() * self.config.move_speed_m_per_s * delta_s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::look::MovementKeys;
    use crate::params::RenderConfig;
    use glam::Vec2;

    fn camera() -> Camera {
        Camera::new(&RenderConfig::default())
    }

    #[test]
    fn test_no_input_is_noop() {
        let mut integrator = SpectatorIntegrator::default();
        let mut cam = camera();
        let before = cam.clone();
        integrator.integrate(&mut cam, &LookInput::default(), 1.0);
        assert_eq!(cam, before);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let config = LookConfig::default();
        let mut integrator = SpectatorIntegrator::new(config);
        let mut cam = camera();
        let input = LookInput {
            look_delta: Vec2::new(0.0, -1.0e6),
            movement: MovementKeys::default(),
        };
        integrator.integrate(&mut cam, &input, 0.016);
        assert_eq!(cam.pitch, config.pitch_limit_rad);
    }

    #[test]
    fn test_forward_moves_along_view() {
        let config = LookConfig::default();
        let mut integrator = SpectatorIntegrator::new(config);
        let mut cam = camera();
        let start = cam.position;
        let input = LookInput {
            look_delta: Vec2::ZERO,
            movement: MovementKeys {
                forward: true,
                ..Default::default()
            },
        };
        integrator.integrate(&mut cam, &input, 0.5);

        let expected = start + Vec3::NEG_Z * config.move_speed_m_per_s * 0.5;
        assert!(cam.position.distance(expected) < 1e-4);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut integrator = SpectatorIntegrator::default();
        let mut cam = camera();
        let start = cam.position;
        let input = LookInput {
            look_delta: Vec2::ZERO,
            movement: MovementKeys {
                left: true,
                right: true,
                ..Default::default()
            },
        };
        integrator.integrate(&mut cam, &input, 1.0);
        assert_eq!(cam.position, start);
    }
}
