//! Frame clock for the render loop.
//!
//! Wraps a monotonic [`Instant`] so the elapsed time fed to the shaders can
//! never run backwards, and keeps a smoothed FPS figure for the perf overlay.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//!
//! // Once per redraw:
//! let tick = clock.tick();
//! uniforms.advance(tick.elapsed);
//! if tick.fps_refreshed {
//!     log::debug!("{:.1} FPS", clock.fps());
//! }
//! ```

use std::time::{Duration, Instant};

/// Default window over which FPS is averaged.
pub const FPS_WINDOW: Duration = Duration::from_millis(500);

/// Result of one [`FrameClock::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Seconds since the clock started.
    pub elapsed: f32,
    /// Seconds since the previous tick.
    pub delta: f32,
    /// Whether [`FrameClock::fps`] was recomputed on this tick.
    pub fps_refreshed: bool,
}

/// Monotonic frame timing.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    /// Frame count at the last FPS refresh.
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_window: Duration,
}

impl FrameClock {
    /// Start a clock at the current instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_window: FPS_WINDOW,
        }
    }

    /// Use a different FPS averaging window.
    pub fn with_fps_window(mut self, window: Duration) -> Self {
        self.fps_window = window;
        self
    }

    /// Advance to the current instant. Call once per frame.
    pub fn tick(&mut self) -> Tick {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Tick {
        // `Instant` is monotonic, but guard against a caller-supplied instant
        // that predates the last frame.
        let now = now.max(self.last_frame);

        self.delta_secs = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.elapsed_secs = now.duration_since(self.start).as_secs_f32();
        self.frame_count += 1;

        let window = now.duration_since(self.fps_update_time);
        let fps_refreshed = window >= self.fps_window && !window.is_zero();
        if fps_refreshed {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / window.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        Tick {
            elapsed: self.elapsed_secs,
            delta: self.delta_secs,
            fps_refreshed,
        }
    }

    /// Seconds since the clock started, as of the last tick.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Seconds between the last two ticks.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Frames ticked so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second over the last averaging window.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Last frame time in milliseconds.
    #[inline]
    pub fn frame_time_ms(&self) -> f32 {
        self.delta_secs * 1000.0
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
        assert_eq!(clock.fps(), 0.0);
    }

    #[test]
    fn test_tick_advances() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);

        let tick = clock.tick_at(start + Duration::from_millis(16));
        assert!((tick.elapsed - 0.016).abs() < 1e-6);
        assert!((tick.delta - 0.016).abs() < 1e-6);
        assert_eq!(clock.frame(), 1);

        let tick = clock.tick_at(start + Duration::from_millis(48));
        assert!((tick.elapsed - 0.048).abs() < 1e-6);
        assert!((tick.delta - 0.032).abs() < 1e-6);
        assert!((clock.frame_time_ms() - 32.0).abs() < 1e-3);
    }

    #[test]
    fn test_elapsed_never_decreases() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);

        clock.tick_at(start + Duration::from_millis(100));
        let tick = clock.tick_at(start + Duration::from_millis(50));
        assert!((tick.elapsed - 0.1).abs() < 1e-6);
        assert_eq!(tick.delta, 0.0);
    }

    #[test]
    fn test_fps_refresh() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start).with_fps_window(Duration::from_millis(100));

        for i in 1..10 {
            let tick = clock.tick_at(start + Duration::from_millis(10 * i));
            assert!(!tick.fps_refreshed);
        }
        let tick = clock.tick_at(start + Duration::from_millis(100));
        assert!(tick.fps_refreshed);
        assert!((clock.fps() - 100.0).abs() < 0.5);
    }
}
