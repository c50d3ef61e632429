//! Live camera feed acquisition and runtime controls.
//!
//! Acquisition is a one-shot asynchronous request: [`CameraFeedAcquirer::acquire`]
//! consumes the acquirer, so the `Requesting` state is the pending future and
//! its [`Acquisition`] outcome is either `Succeeded` or `Failed`. A failure is
//! never fatal; the caller substitutes the fallback body.

pub mod devices;

use std::future::Future;

use thiserror::Error;

use crate::bodies;
use crate::params::{FeedConfig, SceneLayout, VideoConstraints};
use crate::scene::{names, EntityId, FrameSlot, Scene};

/// Reasons a video device could not be used
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no video input device found")]
    NoDevice,

    #[error("video stream never became decodable: {0}")]
    NotDecodable(String),

    #[error("failed to load feed image: {0}")]
    Image(#[from] image::ImageError),
}

/// A granted video stream
pub trait VideoStream: Send {
    /// Slot the stream publishes decoded frames into
    fn frames(&self) -> FrameSlot;

    /// Stop every track and release the device; must be idempotent
    fn stop(&mut self);

    fn is_live(&self) -> bool;
}

/// Source of video streams (a camera driver, a file, a test pattern)
pub trait MediaDevices {
    type Stream: VideoStream + 'static;

    /// Ask for a stream; may suspend while the user answers a permission prompt
    fn request_video_stream(
        &self,
        constraints: &VideoConstraints,
    ) -> impl Future<Output = Result<Self::Stream, FeedError>>;

    /// Resolve once the stream has a decodable frame
    fn until_decodable(
        &self,
        stream: &mut Self::Stream,
    ) -> impl Future<Output = Result<(), FeedError>>;
}

/// Outcome of a finished acquisition
#[derive(Debug)]
pub enum Acquisition {
    Succeeded(CameraFeed),
    Failed(FeedError),
}

/// One-shot requester of the live camera feed
pub struct CameraFeedAcquirer<D> {
    devices: D,
    config: FeedConfig,
}

impl<D: MediaDevices> CameraFeedAcquirer<D> {
    pub fn new(devices: D, config: FeedConfig) -> Self {
        Self { devices, config }
    }

    /// Request the device and, on success, add the camera-fed primary body to `scene`
    ///
    /// A stream that never becomes decodable is stopped before reporting failure.
    pub async fn acquire(self, scene: &mut Scene, layout: &SceneLayout) -> Acquisition {
        log::info!(
            "Requesting video stream ({}x{}, {:?})",
            self.config.constraints.ideal_width,
            self.config.constraints.ideal_height,
            self.config.constraints.facing_mode
        );

        let mut stream = match self
            .devices
            .request_video_stream(&self.config.constraints)
            .await
        {
            Ok(stream) => stream,
            Err(e) => return Acquisition::Failed(e),
        };

        if let Err(e) = self.devices.until_decodable(&mut stream).await {
            stream.stop();
            return Acquisition::Failed(e);
        }

        let frames = stream.frames();
        let entity = scene.add_entity(bodies::camera_fed_primary(layout, &self.config, frames));
        log::info!("Camera feed acquired");

        Acquisition::Succeeded(CameraFeed {
            entity,
            stream: Box::new(stream),
            config: self.config,
            stopped: false,
        })
    }
}

/// The camera-fed primary body together with its device stream
///
/// Owns the stream exclusively; only [`CameraFeed::stop_camera`] (or drop)
/// releases it.
pub struct CameraFeed {
    entity: EntityId,
    stream: Box<dyn VideoStream>,
    config: FeedConfig,
    stopped: bool,
}

impl std::fmt::Debug for CameraFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFeed")
            .field("entity", &self.entity)
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

impl CameraFeed {
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Per-frame update: write time and flag the texture for refresh
    ///
    /// Returns false if the entity is no longer in the scene.
    pub fn animate(&self, scene: &mut Scene, elapsed_s: f32) -> bool {
        let Some(entity) = scene.get_mut(self.entity) else {
            return false;
        };
        entity.params.set_scalar(names::TIME, elapsed_s);
        if let Some(texture) = entity.texture.as_mut() {
            texture.mark_needs_update();
        }
        true
    }

    pub fn opacity(&self, scene: &Scene) -> Option<f32> {
        scene.get(self.entity)?.params.scalar(names::CAMERA_OPACITY)
    }

    pub fn distortion(&self, scene: &Scene) -> Option<f32> {
        scene.get(self.entity)?.params.scalar(names::DISTORTION)
    }

    /// Set feed opacity, clamped to [0, 1]; returns the value applied
    pub fn set_opacity(&self, scene: &mut Scene, opacity: f32) -> Option<f32> {
        if opacity.is_nan() {
            return None;
        }
        let entity = scene.get_mut(self.entity)?;
        let value = opacity.clamp(0.0, 1.0);
        entity.params.set_scalar(names::CAMERA_OPACITY, value);
        Some(value)
    }

    /// Step opacity by `steps` increments of the configured step size
    pub fn step_opacity(&self, scene: &mut Scene, steps: f32) -> Option<f32> {
        let current = self.opacity(scene)?;
        self.set_opacity(scene, current + steps * self.config.opacity_step)
    }

    /// Set UV distortion; not clamped, non-finite values are rejected
    pub fn set_distortion(&self, scene: &mut Scene, distortion: f32) -> Option<f32> {
        if !distortion.is_finite() {
            return None;
        }
        let entity = scene.get_mut(self.entity)?;
        entity.params.set_scalar(names::DISTORTION, distortion);
        Some(distortion)
    }

    /// Alternate between the low and high distortion presets
    ///
    /// Anything other than the high preset switches to high.
    pub fn toggle_distortion(&self, scene: &mut Scene) -> Option<f32> {
        let (low, high) = self.config.distortion_presets;
        let current = self.distortion(scene)?;
        let next = if (current - high).abs() < 1e-6 { low } else { high };
        self.set_distortion(scene, next)
    }

    /// Release the camera device; further calls do nothing
    pub fn stop_camera(&mut self) {
        if self.stopped {
            return;
        }
        self.stream.stop();
        self.stopped = true;
        log::info!("Camera stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Drop for CameraFeed {
    fn drop(&mut self) {
        self.stop_camera();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::params::{FacingMode, SceneLayout};
    use image::RgbaImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Stream that counts how often it was stopped
    pub(crate) struct FakeStream {
        frames: FrameSlot,
        pub(crate) stops: Arc<AtomicUsize>,
    }

    impl VideoStream for FakeStream {
        fn frames(&self) -> FrameSlot {
            self.frames.clone()
        }

        fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn is_live(&self) -> bool {
            self.stops.load(Ordering::SeqCst) == 0
        }
    }

    /// Simulated device: grants, denies or grants a stream that never decodes
    pub(crate) enum FakeDevices {
        Grant(Arc<AtomicUsize>),
        Deny,
        Undecodable(Arc<AtomicUsize>),
    }

    impl MediaDevices for FakeDevices {
        type Stream = FakeStream;

        async fn request_video_stream(
            &self,
            constraints: &VideoConstraints,
        ) -> Result<FakeStream, FeedError> {
            assert_eq!(constraints.facing_mode, FacingMode::User);
            let stops = match self {
                Self::Grant(stops) | Self::Undecodable(stops) => Arc::clone(stops),
                Self::Deny => return Err(FeedError::PermissionDenied),
            };
            let frames = FrameSlot::new();
            if matches!(self, Self::Grant(_)) {
                frames.publish(RgbaImage::new(2, 2));
            }
            Ok(FakeStream { frames, stops })
        }

        async fn until_decodable(&self, stream: &mut FakeStream) -> Result<(), FeedError> {
            if stream.frames.latest().is_some() {
                Ok(())
            } else {
                Err(FeedError::NotDecodable("no frames".to_string()))
            }
        }
    }

    pub(crate) fn granted_feed(scene: &mut Scene) -> (CameraFeed, Arc<AtomicUsize>) {
        let stops = Arc::new(AtomicUsize::new(0));
        let acquirer =
            CameraFeedAcquirer::new(FakeDevices::Grant(Arc::clone(&stops)), FeedConfig::default());
        match pollster::block_on(acquirer.acquire(scene, &SceneLayout::default())) {
            Acquisition::Succeeded(feed) => (feed, stops),
            Acquisition::Failed(e) => panic!("simulated grant failed: {}", e),
        }
    }

    #[test]
    fn test_grant_produces_feed_with_defaults() {
        let mut scene = Scene::new();
        let (feed, _) = granted_feed(&mut scene);

        assert!(scene.contains(feed.entity()));
        assert_eq!(feed.opacity(&scene), Some(0.25));
        assert_eq!(feed.distortion(&scene), Some(0.02));
        assert!(scene.get(feed.entity()).and_then(|e| e.texture.as_ref()).is_some());
    }

    #[test]
    fn test_denial_is_reported_without_touching_scene() {
        let mut scene = Scene::new();
        let acquirer = CameraFeedAcquirer::new(FakeDevices::Deny, FeedConfig::default());
        let outcome = pollster::block_on(acquirer.acquire(&mut scene, &SceneLayout::default()));

        assert!(matches!(outcome, Acquisition::Failed(FeedError::PermissionDenied)));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_undecodable_stream_is_stopped() {
        let mut scene = Scene::new();
        let stops = Arc::new(AtomicUsize::new(0));
        let acquirer = CameraFeedAcquirer::new(
            FakeDevices::Undecodable(Arc::clone(&stops)),
            FeedConfig::default(),
        );
        let outcome = pollster::block_on(acquirer.acquire(&mut scene, &SceneLayout::default()));

        assert!(matches!(outcome, Acquisition::Failed(FeedError::NotDecodable(_))));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_set_opacity_clamps() {
        let mut scene = Scene::new();
        let (feed, _) = granted_feed(&mut scene);

        assert_eq!(feed.set_opacity(&mut scene, 1.5), Some(1.0));
        assert_eq!(feed.opacity(&scene), Some(1.0));
        assert_eq!(feed.set_opacity(&mut scene, -0.3), Some(0.0));
        assert_eq!(feed.opacity(&scene), Some(0.0));
        assert_eq!(feed.set_opacity(&mut scene, f32::NAN), None);
        assert_eq!(feed.opacity(&scene), Some(0.0));
    }

    #[test]
    fn test_step_opacity_stays_in_range() {
        let mut scene = Scene::new();
        let (feed, _) = granted_feed(&mut scene);

        for _ in 0..20 {
            feed.step_opacity(&mut scene, 1.0);
        }
        assert_eq!(feed.opacity(&scene), Some(1.0));

        for _ in 0..20 {
            feed.step_opacity(&mut scene, -1.0);
        }
        assert_eq!(feed.opacity(&scene), Some(0.0));
    }

    #[test]
    fn test_toggle_distortion_between_presets() {
        let mut scene = Scene::new();
        let (feed, _) = granted_feed(&mut scene);

        // From the 0.02 default the first toggle goes high
        assert_eq!(feed.toggle_distortion(&mut scene), Some(0.05));
        assert_eq!(feed.toggle_distortion(&mut scene), Some(0.01));
        assert_eq!(feed.toggle_distortion(&mut scene), Some(0.05));
    }

    #[test]
    fn test_distortion_is_not_clamped() {
        let mut scene = Scene::new();
        let (feed, _) = granted_feed(&mut scene);
        assert_eq!(feed.set_distortion(&mut scene, 3.0), Some(3.0));
        assert_eq!(feed.set_distortion(&mut scene, f32::INFINITY), None);
        assert_eq!(feed.distortion(&scene), Some(3.0));
    }

    #[test]
    fn test_stop_camera_is_idempotent() {
        let mut scene = Scene::new();
        let (mut feed, stops) = granted_feed(&mut scene);

        feed.stop_camera();
        feed.stop_camera();
        assert!(feed.is_stopped());
        drop(feed);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_stops_camera() {
        let mut scene = Scene::new();
        let (feed, stops) = granted_feed(&mut scene);
        drop(feed);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_animate_marks_texture_and_writes_time() {
        let mut scene = Scene::new();
        let (feed, _) = granted_feed(&mut scene);

        assert!(feed.animate(&mut scene, 1.25));
        assert!(feed.animate(&mut scene, 1.5));
        let entity = scene.get(feed.entity()).map(|e| {
            (
                e.params.scalar(names::TIME),
                e.texture.as_ref().map(|t| t.version()),
            )
        });
        assert_eq!(entity, Some((Some(1.5), Some(2))));

        scene.remove_entity(feed.entity());
        assert!(!feed.animate(&mut scene, 2.0));
    }
}
