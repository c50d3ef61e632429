//! Body sizes, colors and floor layout.

/// Static layout of the scene's bodies
#[derive(Debug, Clone, Copy)]
pub struct SceneLayout {
    /// Primary (camera-fed or fallback) sphere radius (meters)
    pub primary_radius_m: f32,

    /// Base tint of the primary body and its floor imprint (linear RGB)
    pub primary_color: [f32; 3],

    /// Radius of each orbiting sphere (meters)
    pub orbiter_radius_m: f32,

    /// Floor plane edge length (meters)
    pub floor_size_m: f32,

    /// Floor subdivisions per side
    pub floor_segments: u32,

    /// Floor height (meters)
    pub floor_height_m: f32,

    /// Radius of the glow the primary body leaves on the floor (meters)
    pub imprint_radius_m: f32,

    /// World-space direction light arrives from (not required to be normalized)
    pub light_direction: [f32; 3],

    /// Initial `userDist` of the id body before the first distance update
    pub id_initial_intensity: f32,

    /// Initial `userDist` of the superego body before the first distance update
    pub superego_initial_intensity: f32,
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            primary_radius_m: 8.0,
            primary_color: [0.4, 0.8, 1.0], // 0x66ccff
            orbiter_radius_m: 4.0,
            floor_size_m: 100.0,
            floor_segments: 128,
            floor_height_m: -1.0,
            imprint_radius_m: 10.0,
            light_direction: [1.0, 1.0, 1.0],
            id_initial_intensity: 0.05,
            superego_initial_intensity: 0.5,
        }
    }
}
