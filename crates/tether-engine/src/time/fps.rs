use std::time::{Duration, Instant};

/// Frame rate measured over one reporting interval.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameStats {
    pub fps: f32,
    /// Frames presented during the interval.
    pub frames: u32,
    /// Frames presented since the loop started.
    pub total_frames: u64,
}

/// Counts presented frames and emits `FrameStats` once per interval.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    interval: Duration,
    window_start: Instant,
    frames: u32,
    total_frames: u64,
}

impl FpsCounter {
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    pub fn starting_at(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            window_start: now,
            frames: 0,
            total_frames: 0,
        }
    }

    /// Forgets the partial interval, e.g. after the loop was parked.
    pub fn restart(&mut self, now: Instant) {
        self.window_start = now;
        self.frames = 0;
    }

    /// Records one presented frame at `now`.
    pub fn record(&mut self, now: Instant) -> Option<FrameStats> {
        self.frames += 1;
        self.total_frames += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }

        let stats = FrameStats {
            fps: self.frames as f32 / elapsed.as_secs_f32(),
            frames: self.frames,
            total_frames: self.total_frames,
        };
        self.restart(now);
        Some(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_the_interval_elapses() {
        let start = Instant::now();
        let mut counter = FpsCounter::starting_at(Duration::from_secs(1), start);

        for i in 1..60 {
            assert!(counter.record(start + Duration::from_millis(i * 16)).is_none());
        }
        let stats = counter
            .record(start + Duration::from_secs(1))
            .expect("interval elapsed");
        assert_eq!(stats.frames, 60);
        assert_eq!(stats.total_frames, 60);
        assert!((stats.fps - 60.0).abs() < 0.01);
    }

    #[test]
    fn restart_drops_the_partial_interval() {
        let start = Instant::now();
        let mut counter = FpsCounter::starting_at(Duration::from_millis(100), start);
        counter.record(start + Duration::from_millis(10));

        let resumed = start + Duration::from_secs(5);
        counter.restart(resumed);
        let stats = counter
            .record(resumed + Duration::from_millis(100))
            .expect("interval elapsed");
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.total_frames, 2);
    }
}
