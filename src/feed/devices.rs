//! Media device implementations available without a camera driver.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use noise::{NoiseFn, Perlin};

use super::{FeedError, MediaDevices, VideoStream};
use crate::params::VideoConstraints;
use crate::scene::FrameSlot;

/// Host with no video input; every request fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevices;

/// Stream type of [`NoDevices`]; it can never be constructed
#[derive(Debug)]
pub enum NoStream {}

impl VideoStream for NoStream {
    fn frames(&self) -> FrameSlot {
        match *self {}
    }

    fn stop(&mut self) {
        match *self {}
    }

    fn is_live(&self) -> bool {
        match *self {}
    }
}

impl MediaDevices for NoDevices {
    type Stream = NoStream;

    async fn request_video_stream(
        &self,
        _constraints: &VideoConstraints,
    ) -> Result<NoStream, FeedError> {
        Err(FeedError::NoDevice)
    }

    async fn until_decodable(&self, stream: &mut NoStream) -> Result<(), FeedError> {
        match *stream {}
    }
}

/// Synthetic camera producing animated Perlin noise frames
#[derive(Debug, Clone)]
pub struct TestPatternDevices {
    /// Frames per second published by the worker thread
    pub fps: u32,

    /// Widest frame generated (pixels); height follows the requested aspect
    pub max_width: u32,

    pub seed: u32,
}

impl Default for TestPatternDevices {
    fn default() -> Self {
        Self {
            fps: 30,
            max_width: 320, // Full-size noise frames are too slow to generate per frame
            seed: 42,
        }
    }
}

/// Live test-pattern stream; a worker thread publishes frames until stopped
pub struct TestPatternStream {
    frames: FrameSlot,
    running: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl VideoStream for TestPatternStream {
    fn frames(&self) -> FrameSlot {
        self.frames.clone()
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Test pattern worker panicked");
            }
        }
    }

    fn is_live(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for TestPatternStream {
    fn drop(&mut self) {
        self.stop();
    }
}

impl MediaDevices for TestPatternDevices {
    type Stream = TestPatternStream;

    async fn request_video_stream(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<TestPatternStream, FeedError> {
        let width = constraints.ideal_width.clamp(1, self.max_width.max(1));
        let height = ((width as u64 * constraints.ideal_height as u64)
            / constraints.ideal_width.max(1) as u64)
            .max(1) as u32;

        let frames = FrameSlot::new();
        let perlin = Perlin::new(self.seed);

        // First frame is ready before the stream is handed out
        frames.publish(noise_frame(&perlin, width, height, 0.0));

        let running = Arc::new(AtomicBool::new(true));
        let worker = spawn_pattern_thread(
            perlin,
            width,
            height,
            self.fps.max(1),
            frames.clone(),
            Arc::clone(&running),
        );

        log::info!("Test pattern camera: {}x{} @ {}fps", width, height, self.fps);

        Ok(TestPatternStream {
            frames,
            running,
            worker: Some(worker),
        })
    }

    async fn until_decodable(&self, stream: &mut TestPatternStream) -> Result<(), FeedError> {
        match stream.frames.latest() {
            Some(_) => Ok(()),
            None => Err(FeedError::NotDecodable("test pattern produced no frame".to_string())),
        }
    }
}

/// Spawn frame generation thread
fn spawn_pattern_thread(
    perlin: Perlin,
    width: u32,
    height: u32,
    fps: u32,
    frames: FrameSlot,
    running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let start = Instant::now();
        let interval = Duration::from_secs_f64(1.0 / fps as f64);

        while running.load(Ordering::SeqCst) {
            thread::sleep(interval);
            let t = start.elapsed().as_secs_f64();
            frames.publish(noise_frame(&perlin, width, height, t));
        }
    })
}

/// Render one frame of drifting, tinted noise
fn noise_frame(perlin: &Perlin, width: u32, height: u32, time_s: f64) -> RgbaImage {
    const SCALE: f64 = 0.03;
    RgbaImage::from_fn(width, height, |x, y| {
        let n = perlin.get([x as f64 * SCALE, y as f64 * SCALE, time_s * 0.5]);
        let v = ((n + 1.0) * 0.5).clamp(0.0, 1.0);
        Rgba([
            (v * 90.0) as u8,
            (v * 200.0) as u8,
            (55.0 + v * 200.0) as u8,
            255,
        ])
    })
}

/// Camera that shows a single still image, e.g. a recorded snapshot
#[derive(Debug, Clone)]
pub struct StillImageDevices {
    pub path: PathBuf,
}

impl StillImageDevices {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// One-frame stream backed by a decoded image
#[derive(Debug)]
pub struct StillImageStream {
    frames: FrameSlot,
    live: bool,
}

impl VideoStream for StillImageStream {
    fn frames(&self) -> FrameSlot {
        self.frames.clone()
    }

    fn stop(&mut self) {
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl MediaDevices for StillImageDevices {
    type Stream = StillImageStream;

    async fn request_video_stream(
        &self,
        _constraints: &VideoConstraints,
    ) -> Result<StillImageStream, FeedError> {
        if !self.path.exists() {
            return Err(FeedError::NoDevice);
        }
        let image = image::open(&self.path)?.to_rgba8();
        log::info!(
            "Still image camera: {} ({}x{})",
            self.path.display(),
            image.width(),
            image.height()
        );

        let frames = FrameSlot::new();
        frames.publish(image);
        Ok(StillImageStream { frames, live: true })
    }

    async fn until_decodable(&self, stream: &mut StillImageStream) -> Result<(), FeedError> {
        match stream.frames.latest() {
            Some(frame) if frame.width() > 0 && frame.height() > 0 => Ok(()),
            _ => Err(FeedError::NotDecodable(format!(
                "{} has no pixels",
                self.path.display()
            ))),
        }
    }
}
