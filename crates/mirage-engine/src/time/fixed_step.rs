use std::time::{Duration, Instant};

/// Fixed-size simulation step handed to update callbacks.
#[derive(Debug, Copy, Clone)]
pub struct StepTime {
    /// Step length in seconds; identical for every step.
    pub dt: f32,

    /// Monotonic step counter.
    pub step_index: u64,
}

/// Fixed-timestep scheduler.
///
/// Keeps a time cursor (`next`): the loop waits until real time reaches the
/// cursor, then [`advance`](Self::advance) reports how many whole steps are
/// needed to bring the cursor past `now`. Rendering happens once per
/// iteration regardless of the step count.
///
/// After a stall longer than `max_catch_up` periods the cursor is re-based to
/// `now` instead of replaying every missed step.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    period: Duration,
    next: Instant,
    max_catch_up: u32,
    step_index: u64,
}

impl FixedTimestep {
    pub fn new(period: Duration, max_catch_up: u32, start: Instant) -> Self {
        debug_assert!(!period.is_zero());
        Self {
            period,
            next: start,
            max_catch_up: max_catch_up.max(1),
            step_index: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// The instant the next step becomes due.
    pub fn next_due(&self) -> Instant {
        self.next
    }

    /// Remaining wait before the next step, or `None` when it is already due.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        if now >= self.next {
            None
        } else {
            Some(self.next - now)
        }
    }

    /// Advances the cursor past `now` and returns the number of steps to run.
    pub fn advance(&mut self, now: Instant) -> u32 {
        let mut steps = 0;
        while now >= self.next && steps < self.max_catch_up {
            self.next += self.period;
            steps += 1;
        }

        if now >= self.next {
            log::debug!(
                "fixed timestep fell behind by {:?}; dropping missed steps",
                now - self.next
            );
            self.next = now + self.period;
        }

        self.step_index = self.step_index.wrapping_add(u64::from(steps));
        steps
    }

    /// Step descriptors for the `steps` just returned by [`advance`](Self::advance).
    pub fn steps(&self, steps: u32) -> impl Iterator<Item = StepTime> + use<> {
        let dt = self.period.as_secs_f32();
        let first = self.step_index.wrapping_sub(u64::from(steps));
        (0..u64::from(steps)).map(move |i| StepTime {
            dt,
            step_index: first.wrapping_add(i),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_micros(16_666);

    fn stepper(start: Instant) -> FixedTimestep {
        FixedTimestep::new(PERIOD, 8, start)
    }

    #[test]
    fn first_step_due_immediately() {
        let t0 = Instant::now();
        let mut s = stepper(t0);
        assert_eq!(s.time_until_due(t0), None);
        assert_eq!(s.advance(t0), 1);
        assert_eq!(s.time_until_due(t0), Some(PERIOD));
    }

    #[test]
    fn waits_until_cursor() {
        let t0 = Instant::now();
        let mut s = stepper(t0);
        s.advance(t0);

        let early = t0 + PERIOD / 2;
        assert_eq!(s.time_until_due(early), Some(PERIOD - PERIOD / 2));
        assert_eq!(s.advance(early), 0);
    }

    #[test]
    fn catches_up_whole_steps() {
        let t0 = Instant::now();
        let mut s = stepper(t0);
        s.advance(t0);

        // 3.5 periods later: cursor at 1, 2, 3 are due.
        let later = t0 + PERIOD * 7 / 2;
        assert_eq!(s.advance(later), 3);
        assert!(s.next_due() > later);
        assert!(s.next_due() - later <= PERIOD);
    }

    #[test]
    fn long_stall_is_capped_and_rebased() {
        let t0 = Instant::now();
        let mut s = stepper(t0);
        s.advance(t0);

        let stalled = t0 + Duration::from_secs(5);
        assert_eq!(s.advance(stalled), 8);
        assert_eq!(s.next_due(), stalled + PERIOD);
        assert_eq!(s.advance(stalled), 0);
    }

    #[test]
    fn step_indices_are_contiguous() {
        let t0 = Instant::now();
        let mut s = stepper(t0);
        let n = s.advance(t0);
        let first: Vec<u64> = s.steps(n).map(|st| st.step_index).collect();
        assert_eq!(first, vec![0]);

        let n = s.advance(t0 + PERIOD * 3);
        let next: Vec<u64> = s.steps(n).map(|st| st.step_index).collect();
        assert_eq!(next, vec![1, 2, 3]);
        assert!(s.steps(n).all(|st| (st.dt - PERIOD.as_secs_f32()).abs() < f32::EPSILON));
    }
}
