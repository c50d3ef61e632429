//! Camera feed acquisition and runtime control settings.

/// Which physical camera to prefer when several are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    /// Front camera, facing the user
    #[default]
    User,
    /// Back camera, facing away from the user
    Environment,
}

/// Constraints passed along with a video device request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    /// Preferred frame width (pixels); devices may deliver something else
    pub ideal_width: u32,

    /// Preferred frame height (pixels)
    pub ideal_height: u32,

    pub facing_mode: FacingMode,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            facing_mode: FacingMode::User,
        }
    }
}

/// Camera feed material defaults and keyboard step sizes
#[derive(Debug, Clone, Copy)]
pub struct FeedConfig {
    /// Blend of the live feed over the base color, in [0, 1]
    pub default_opacity: f32,

    /// UV wobble amplitude (texture units, practically small)
    pub default_distortion: f32,

    /// Opacity change per key press
    pub opacity_step: f32,

    /// The two distortion values the toggle key alternates between (low, high)
    pub distortion_presets: (f32, f32),

    pub constraints: VideoConstraints,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_opacity: 0.25,
            default_distortion: 0.02,
            opacity_step: 0.1,
            distortion_presets: (0.01, 0.05),
            constraints: VideoConstraints::default(),
        }
    }
}
