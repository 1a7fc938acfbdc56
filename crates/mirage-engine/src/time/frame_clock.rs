use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Wall time since the previous frame, in seconds (clamped).
    pub dt: f32,

    /// Exponentially smoothed frame time, in seconds. Suitable for display.
    pub smoothed_dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Measures wall time between presented frames.
///
/// Simulation does not read this clock (it runs on [`FixedTimestep`](super::FixedTimestep));
/// it only feeds the frame-time readout.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    smoothed: f32,
}

const DT_MIN: Duration = Duration::from_micros(100);
const DT_MAX: Duration = Duration::from_millis(250);
const SMOOTHING: f32 = 0.1;

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            frame_index: 0,
            smoothed: 0.0,
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(DT_MIN, DT_MAX)
            .as_secs_f32();
        self.last = now;

        self.smoothed = if self.frame_index == 0 {
            dt
        } else {
            self.smoothed + (dt - self.smoothed) * SMOOTHING
        };

        let ft = FrameTime {
            dt,
            smoothed_dt: self.smoothed,
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
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
    fn dt_is_clamped() {
        let mut clock = FrameClock::new();
        let t0 = clock.last;
        assert_eq!(clock.tick_at(t0).dt, DT_MIN.as_secs_f32());
        assert_eq!(clock.tick_at(t0 + Duration::from_secs(3)).dt, DT_MAX.as_secs_f32());
    }

    #[test]
    fn smoothing_moves_toward_new_samples() {
        let mut clock = FrameClock::new();
        let t0 = clock.last;
        let first = clock.tick_at(t0 + Duration::from_millis(10));
        assert!((first.smoothed_dt - 0.010).abs() < 1e-6);

        let second = clock.tick_at(t0 + Duration::from_millis(40));
        assert!(second.smoothed_dt > 0.010 && second.smoothed_dt < 0.030);
        assert_eq!(second.frame_index, 1);
    }
}
