//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (meters, seconds, radians, etc.)
//! - Documented ranges and meanings
//! - Type safety where possible

mod feed;
mod look;
mod mapping;
mod orbit;
mod render;
mod scene;

// Re-export all types
pub use feed::{FacingMode, FeedConfig, VideoConstraints};
pub use look::LookConfig;
pub use mapping::DistanceMapping;
pub use orbit::OrbitSpec;
pub use render::RenderConfig;
pub use scene::SceneLayout;
