//! Shared monotonic frame clock.

use std::time::{Duration, Instant};

/// Time sample taken once per frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since the clock was created
    pub elapsed_s: f32,

    /// Seconds since the previous sample (0 on the first sample)
    pub delta_s: f32,
}

/// Process-wide frame clock
///
/// Created once at scene start and never reset. Only the scheduler calls
/// [`Clock::advance`]; everything else reads [`Clock::now`].
#[derive(Debug, Clone)]
pub struct Clock {
    start: Instant,
    last: Instant,
    current: FrameTime,
}

impl Clock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Create a clock whose zero is `start`
    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            last: start,
            current: FrameTime::default(),
        }
    }

    /// Sample wall time and advance
    pub fn advance(&mut self) -> FrameTime {
        self.advance_to(Instant::now())
    }

    /// Advance to an explicit instant
    ///
    /// Instants earlier than the previous sample yield a zero delta; the
    /// clock never runs backwards.
    pub fn advance_to(&mut self, now: Instant) -> FrameTime {
        let now = now.max(self.last);
        let delta = now.duration_since(self.last);
        self.last = now;
        self.current = FrameTime {
            elapsed_s: now.duration_since(self.start).as_secs_f32(),
            delta_s: delta.as_secs_f32(),
        };
        self.current
    }

    /// Most recent sample
    pub fn now(&self) -> FrameTime {
        self.current
    }

    /// Instant the clock was started at
    pub fn start(&self) -> Instant {
        self.start
    }

    /// Instant `offset` after the clock start
    pub fn at(&self, offset: Duration) -> Instant {
        self.start + offset
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_has_zero_delta() {
        let mut clock = Clock::new();
        let start = clock.start();
        let t = clock.advance_to(start);
        assert_eq!(t.elapsed_s, 0.0);
        assert_eq!(t.delta_s, 0.0);
    }

    #[test]
    fn test_elapsed_and_delta_accumulate() {
        let mut clock = Clock::new();
        clock.advance_to(clock.at(Duration::from_millis(500)));
        let t = clock.advance_to(clock.at(Duration::from_millis(750)));

        assert!((t.elapsed_s - 0.75).abs() < 1e-6);
        assert!((t.delta_s - 0.25).abs() < 1e-6);
        assert_eq!(clock.now(), t);
    }

    #[test]
    fn test_never_runs_backwards() {
        let mut clock = Clock::new();
        clock.advance_to(clock.at(Duration::from_secs(2)));
        let t = clock.advance_to(clock.at(Duration::from_secs(1)));

        assert!((t.elapsed_s - 2.0).abs() < 1e-6);
        assert_eq!(t.delta_s, 0.0);
    }
}
