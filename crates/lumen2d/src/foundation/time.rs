//! Time management utilities

use std::time::Instant;

/// Snapshot of frame timing handed to update and render calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Time since the last frame in seconds
    pub delta: f32,

    /// Total elapsed time since the clock started in seconds
    pub total: f32,

    /// Index of the current frame, starting at zero
    pub frame: u64,
}

impl FrameTime {
    /// A zeroed frame time, useful before the first tick and in tests
    pub fn zero() -> Self {
        Self {
            delta: 0.0,
            total: 0.0,
            frame: 0,
        }
    }

    /// Create a frame time with a fixed delta, mostly for tests
    pub fn from_delta(delta: f32) -> Self {
        Self {
            delta,
            total: delta,
            frame: 0,
        }
    }
}

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.delta_time = elapsed.as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the timing snapshot for the current frame
    pub fn frame_time(&self) -> FrameTime {
        FrameTime {
            delta: self.delta_time,
            total: self.total_time,
            frame: self.frame_count,
        }
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}
