//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::params::{FeedConfig, RenderConfig};

/// Where the primary body's video comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FeedSource {
    /// No camera; always shows the fallback body
    None,
    /// Synthetic animated noise camera
    TestPattern,
    /// A still image presented as a camera (needs --feed-image)
    Image,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Psyche")]
#[command(about = "Camera-fed ego with orbiting id and superego over a rippling floor", long_about = None)]
pub struct Args {
    /// Video source for the primary body
    #[arg(long, value_enum, default_value = "test-pattern")]
    pub feed: FeedSource,

    /// Image file used by the `image` feed
    #[arg(long, value_name = "PATH")]
    pub feed_image: Option<PathBuf>,

    /// Initial camera feed opacity (0 to 1)
    #[arg(long, value_name = "OPACITY")]
    pub opacity: Option<f32>,

    /// Initial camera feed distortion
    #[arg(long, value_name = "AMOUNT")]
    pub distortion: Option<f32>,

    /// Window width (pixels)
    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    /// Window height (pixels)
    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,

    /// Vertical field of view (degrees)
    #[arg(long, value_name = "DEGREES")]
    pub fov: Option<f32>,
}

impl Args {
    /// Render configuration with command-line overrides applied
    pub fn render_config(&self) -> RenderConfig {
        let mut config = RenderConfig::default();
        if let Some(width) = self.width {
            config.window_width = width.max(1);
        }
        if let Some(height) = self.height {
            config.window_height = height.max(1);
        }
        if let Some(fov) = self.fov {
            config.fov_degrees = fov.clamp(1.0, 179.0);
        }
        config
    }

    /// Feed configuration with command-line overrides applied
    pub fn feed_config(&self) -> FeedConfig {
        let mut config = FeedConfig::default();
        if let Some(opacity) = self.opacity {
            config.default_opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(distortion) = self.distortion.filter(|d| d.is_finite()) {
            config.default_distortion = distortion;
        }
        config
    }

    /// Feed source, falling back to none when `image` has no path
    pub fn feed_source(&self) -> FeedSource {
        if self.feed == FeedSource::Image && self.feed_image.is_none() {
            log::warn!("--feed image given without --feed-image, running without a camera");
            return FeedSource::None;
        }
        self.feed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("psyche").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.feed_source(), FeedSource::TestPattern);
        assert_eq!(args.render_config().fov_degrees, 75.0);
        assert_eq!(args.feed_config().default_opacity, 0.25);
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "--feed",
            "none",
            "--opacity",
            "1.7",
            "--distortion",
            "0.05",
            "--width",
            "640",
            "--fov",
            "60",
        ]);
        assert_eq!(args.feed_source(), FeedSource::None);
        assert_eq!(args.feed_config().default_opacity, 1.0);
        assert_eq!(args.feed_config().default_distortion, 0.05);
        assert_eq!(args.render_config().window_width, 640);
        assert_eq!(args.render_config().fov_degrees, 60.0);
    }

    #[test]
    fn test_image_feed_needs_path() {
        assert_eq!(parse(&["--feed", "image"]).feed_source(), FeedSource::None);
        let args = parse(&["--feed", "image", "--feed-image", "me.png"]);
        assert_eq!(args.feed_source(), FeedSource::Image);
    }
}
