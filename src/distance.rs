//! Observer distance to material intensity mapping.

use glam::Vec3;

use crate::params::DistanceMapping;

/// Map the distance between a body and the observer to a bounded intensity
///
/// The distance is clamped to the mapping window and remapped linearly so the
/// near edge yields `near_intensity` and the far edge `far_intensity`.
/// Returns 0 when either position is unknown.
pub fn intensity(
    entity_pos: Option<Vec3>,
    observer_pos: Option<Vec3>,
    mapping: &DistanceMapping,
) -> f32 {
    let (Some(entity), Some(observer)) = (entity_pos, observer_pos) else {
        return 0.0;
    };
    intensity_at_distance(entity.distance(observer), mapping)
}

/// Same remap as [`intensity`] for an already computed distance (meters)
///
/// An empty or inverted window maps everything to `near_intensity`.
pub fn intensity_at_distance(distance_m: f32, mapping: &DistanceMapping) -> f32 {
    if !(mapping.max_distance_m > mapping.min_distance_m) {
        return mapping.near_intensity;
    }
    let d = distance_m.clamp(mapping.min_distance_m, mapping.max_distance_m);
    let t = (d - mapping.min_distance_m) / (mapping.max_distance_m - mapping.min_distance_m);
    mapping.near_intensity + t * (mapping.far_intensity - mapping.near_intensity)
}
