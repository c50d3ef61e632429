//! Orbit descriptors for the bodies circling the focal point.

use std::f32::consts::PI;

/// Per-body orbit descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitSpec {
    /// Orbit radius around the focal point (meters)
    pub radius_m: f32,

    /// Angular speed (radians per second)
    pub angular_speed_rad_per_s: f32,

    /// Phase offset added to the orbit angle (radians)
    /// Two bodies with equal radius and offsets π apart are always antipodal.
    pub phase_offset_rad: f32,

    /// Vertical center of the bobbing motion (meters)
    pub vertical_center_m: f32,

    /// Lowest allowed height (meters); the vertical component is clamped to this
    pub vertical_floor_m: f32,
}

impl Default for OrbitSpec {
    fn default() -> Self {
        Self {
            radius_m: 20.0,
            angular_speed_rad_per_s: 0.5,
            phase_offset_rad: 0.0,
            vertical_center_m: 4.0,
            vertical_floor_m: 3.0, // Orbiter radius, keeps bodies off the floor
        }
    }
}

impl OrbitSpec {
    /// Orbit of the "id" body
    pub fn id() -> Self {
        Self::default()
    }

    /// Orbit of the "superego" body, diametrically opposed to the id
    pub fn superego() -> Self {
        Self {
            phase_offset_rad: PI,
            ..Self::default()
        }
    }
}
