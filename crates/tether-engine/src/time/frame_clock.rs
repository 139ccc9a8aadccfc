use std::time::{Duration, Instant};

/// Timing snapshot handed to renderer callbacks.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Frames ticked since the clock was created.
    pub frame_index: u64,
}

/// Produces `FrameTime` snapshots for one render loop.
///
/// Delta time is clamped so a loop parked for seconds (paused, unfocused,
/// waiting for a surface) does not hand a huge `dt` to the first frame after
/// it wakes up.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restarts delta measurement from now. Called when a context is recreated.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Snapshot for the callback about to run, without advancing the clock.
    pub fn peek(&self) -> FrameTime {
        FrameTime {
            dt: 0.0,
            now: self.last,
            frame_index: self.frame_index,
        }
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let time = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        time
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
