//! Psyche library - camera-fed scene orchestration

pub mod bodies;
pub mod camera;
pub mod cli;
pub mod clock;
pub mod distance;
pub mod feed;
pub mod look;
pub mod orbit;
pub mod params;
pub mod rendering;
pub mod scene;
pub mod scheduler;
