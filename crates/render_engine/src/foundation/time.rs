//! Time management utilities

use std::time::Instant;

/// Per-frame timing statistics derived from elapsed wall time
///
/// The arithmetic is kept separate from the clock so it can be fed mock
/// elapsed times: FPS is `1000 / elapsed_ms` and delta time is the
/// reciprocal of FPS.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    fps: f32,
    delta_time: f32,
    frame_count: u64,
}

impl FrameStats {
    /// Fold one frame's elapsed milliseconds into the stats. A zero
    /// elapsed time leaves the previous values in place.
    pub fn update(&mut self, elapsed_ms: f32) {
        self.frame_count += 1;
        if elapsed_ms > 0.0 {
            self.fps = 1000.0 / elapsed_ms;
            self.delta_time = 1.0 / self.fps;
        }
    }

    /// Frames per second from the last update
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Seconds covered by the last frame
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Frames folded in so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Frame timer that feeds wall-clock elapsed time into [`FrameStats`]
pub struct FrameTimer {
    last_frame: Instant,
    stats: FrameStats,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    /// Create a timer starting now
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            stats: FrameStats::default(),
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn tick(&mut self) -> FrameStats {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;
        self.stats.update(elapsed_ms);
        self.stats
    }

    /// Stats from the most recent tick
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sixteen_ms_is_sixty_two_and_a_half_fps() {
        let mut stats = FrameStats::default();
        stats.update(16.0);
        assert_relative_eq!(stats.fps(), 62.5);
        assert_relative_eq!(stats.delta_time(), 0.016);
    }

    #[test]
    fn delta_time_is_reciprocal_of_fps() {
        let mut stats = FrameStats::default();
        for elapsed in [8.0, 16.0, 33.0] {
            stats.update(elapsed);
            assert_relative_eq!(stats.delta_time() * stats.fps(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn zero_elapsed_keeps_previous_values() {
        let mut stats = FrameStats::default();
        stats.update(16.0);
        let fps = stats.fps();
        stats.update(0.0);
        assert_relative_eq!(stats.fps(), fps);
        assert_eq!(stats.frame_count(), 2);
    }
}
