//! First-person look and movement tuning.

use std::f32::consts::FRAC_PI_2;

/// Spectator-style navigation parameters
#[derive(Debug, Clone, Copy)]
pub struct LookConfig {
    /// Rotation per pixel of raw mouse motion (radians per pixel)
    pub sensitivity_rad_per_px: f32,

    /// Translation speed while a movement key is held (meters per second)
    pub move_speed_m_per_s: f32,

    /// Maximum absolute pitch (radians), keeps the view from flipping over
    pub pitch_limit_rad: f32,
}

impl Default for LookConfig {
    fn default() -> Self {
        Self {
            sensitivity_rad_per_px: 0.002,
            move_speed_m_per_s: 10.0,
            pitch_limit_rad: FRAC_PI_2 - 0.01,
        }
    }
}
