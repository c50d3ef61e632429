//! Procedural orbit motion around a fixed focal point.

use glam::{Quat, Vec3};

use crate::params::OrbitSpec;

/// Point every orbiting body circles and faces
pub const FOCAL_POINT: Vec3 = Vec3::ZERO;

/// Compute an orbiting body's position for given time
///
/// Pure function of `time_s` and `spec`: the angle advances at the orbit's
/// angular speed, x/z trace the orbit circle and y bobs at half the angular
/// rate, clamped to `vertical_floor_m`.
///
/// # Arguments
/// * `time_s` - Shared clock elapsed time in seconds
/// * `spec` - Orbit descriptor
pub fn position(time_s: f32, spec: &OrbitSpec) -> Vec3 {
    let angle = time_s * spec.angular_speed_rad_per_s + spec.phase_offset_rad;

    let x = spec.radius_m * angle.cos();
    let z = spec.radius_m * angle.sin();
    let y = (spec.radius_m * (angle * 0.5).cos() + spec.vertical_center_m)
        .max(spec.vertical_floor_m);

    FOCAL_POINT + Vec3::new(x, y, z)
}

/// Orientation that makes a body at `from` face `target`
///
/// Bodies use -Z as their forward axis. Degenerate cases (coincident points,
/// or a target straight above/below) keep the identity rotation around the
/// missing axis instead of producing NaNs.
pub fn facing(from: Vec3, target: Vec3) -> Quat {
    let dir = target - from;
    if dir.length_squared() < 1e-12 {
        return Quat::IDENTITY;
    }
    let forward = dir.normalize();
    let up = if forward.cross(Vec3::Y).length_squared() < 1e-8 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    // look_to_rh builds a view matrix; its inverse rotation is the body's orientation
    let view = glam::Mat4::look_to_rh(Vec3::ZERO, forward, up);
    Quat::from_mat4(&view).inverse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_position_is_deterministic() {
        let spec = OrbitSpec::id();
        for t in [0.0, 0.016, 1.5, 123.456] {
            let a = position(t, &spec);
            let b = position(t, &spec);
            assert_eq!(a.x.to_bits(), b.x.to_bits());
            assert_eq!(a.y.to_bits(), b.y.to_bits());
            assert_eq!(a.z.to_bits(), b.z.to_bits());
        }
    }

    #[test]
    fn test_phase_offset_pi_is_antipodal() {
        let a_spec = OrbitSpec::id();
        let b_spec = OrbitSpec::superego();
        assert_eq!(b_spec.phase_offset_rad, PI);

        for i in 0..200 {
            let t = i as f32 * 0.37;
            let a = position(t, &a_spec);
            let b = position(t, &b_spec);
            assert!((a.x + b.x).abs() < 1e-3, "x not antipodal at t={}", t);
            assert!((a.z + b.z).abs() < 1e-3, "z not antipodal at t={}", t);
        }
    }

    #[test]
    fn test_vertical_floor_clamp() {
        let spec = OrbitSpec {
            radius_m: 30.0,
            vertical_center_m: 0.0,
            vertical_floor_m: 5.0,
            ..OrbitSpec::default()
        };
        for i in 0..1000 {
            let t = i as f32 * 0.05;
            let p = position(t, &spec);
            assert!(p.y >= spec.vertical_floor_m, "y {} below floor at t={}", p.y, t);
        }
    }

    #[test]
    fn test_position_at_t0() {
        let spec = OrbitSpec::id();
        let p = position(0.0, &spec);
        assert!((p.x - spec.radius_m).abs() < 1e-5);
        assert!(p.z.abs() < 1e-5);
        assert!((p.y - (spec.radius_m + spec.vertical_center_m)).abs() < 1e-5);
    }

    #[test]
    fn test_horizontal_distance_equals_radius() {
        let spec = OrbitSpec::superego();
        for i in 0..50 {
            let p = position(i as f32 * 0.2, &spec);
            let horizontal = Vec3::new(p.x, 0.0, p.z).length();
            assert!((horizontal - spec.radius_m).abs() < 1e-3);
        }
    }

    #[test]
    fn test_facing_points_forward_axis_at_target() {
        let from = Vec3::new(10.0, 3.0, -4.0);
        let rot = facing(from, FOCAL_POINT);
        let forward = rot * Vec3::NEG_Z;
        let expected = (FOCAL_POINT - from).normalize();
        assert!(forward.distance(expected) < 1e-4);
    }

    #[test]
    fn test_facing_degenerate_inputs() {
        assert_eq!(facing(Vec3::ONE, Vec3::ONE), Quat::IDENTITY);

        let rot = facing(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO);
        let forward = rot * Vec3::NEG_Z;
        assert!(forward.is_finite());
        assert!(forward.distance(Vec3::NEG_Y) < 1e-4);
    }
}
