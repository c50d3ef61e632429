//! Distance to visual-intensity mapping window.

/// Linear, inverted remap from observer distance to material intensity
///
/// Closer bodies get the larger value. These numbers are shared with the
/// materials' pattern-speed formulas, so changing them changes the look.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceMapping {
    /// Distances below this are treated as this (meters)
    pub min_distance_m: f32,

    /// Distances above this are treated as this (meters)
    pub max_distance_m: f32,

    /// Intensity at `min_distance_m`
    pub near_intensity: f32,

    /// Intensity at `max_distance_m`
    pub far_intensity: f32,
}

impl Default for DistanceMapping {
    fn default() -> Self {
        Self {
            min_distance_m: 2.0,
            max_distance_m: 50.0,
            near_intensity: 7.0,
            far_intensity: 0.5,
        }
    }
}
