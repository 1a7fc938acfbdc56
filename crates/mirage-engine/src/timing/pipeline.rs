use std::collections::VecDeque;

use crate::render::PassId;

/// An asynchronous elapsed-time measurement of one pass.
pub trait PassTimer {
    /// Whether the result can be read without waiting.
    fn is_ready(&self) -> bool;

    /// Elapsed GPU time in nanoseconds. `None` until ready, or if the
    /// measurement failed.
    fn elapsed_ns(&self) -> Option<f64>;

    /// Prepares the timer for another frame.
    fn reset(&mut self) {}
}

/// One timer per pass of a submitted frame.
#[derive(Debug)]
pub struct FrameQuerySet<T> {
    timers: [T; PassId::COUNT],
}

impl<T: PassTimer> FrameQuerySet<T> {
    pub fn new(timers: [T; PassId::COUNT]) -> Self {
        Self { timers }
    }

    pub fn timer(&self, pass: PassId) -> &T {
        &self.timers[pass.index()]
    }

    pub fn timer_mut(&mut self, pass: PassId) -> &mut T {
        &mut self.timers[pass.index()]
    }

    pub fn timers_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.timers.iter_mut()
    }

    /// Every member has a result.
    pub fn is_ready(&self) -> bool {
        self.timers.iter().all(PassTimer::is_ready)
    }

    fn timings(&self) -> PassTimings {
        PassTimings {
            ns: std::array::from_fn(|i| self.timers[i].elapsed_ns()),
        }
    }

    fn reset(&mut self) {
        for t in &mut self.timers {
            t.reset();
        }
    }
}

/// Per-pass GPU times of one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassTimings {
    ns: [Option<f64>; PassId::COUNT],
}

impl PassTimings {
    pub fn nanos(&self, pass: PassId) -> Option<f64> {
        self.ns[pass.index()]
    }

    pub fn millis(&self, pass: PassId) -> Option<f64> {
        self.nanos(pass).map(|ns| ns / 1e6)
    }
}

/// FIFO of in-flight query sets.
///
/// Depth is not bounded: it grows with the number of frames the GPU lags
/// behind. Drained sets are kept for reuse.
#[derive(Debug)]
pub struct QueryPipeline<T> {
    in_flight: VecDeque<FrameQuerySet<T>>,
    spare: Vec<FrameQuerySet<T>>,
    latest: Option<PassTimings>,
    completed: u64,
}

impl<T> Default for QueryPipeline<T> {
    fn default() -> Self {
        Self {
            in_flight: VecDeque::new(),
            spare: Vec::new(),
            latest: None,
            completed: 0,
        }
    }
}

impl<T: PassTimer> QueryPipeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pops every ready set at the head of the queue, recording the last one
    /// as the latest timings. Stops at the first set that is not ready, even
    /// if later sets are. Returns the number of sets drained.
    pub fn drain(&mut self) -> usize {
        let mut drained = 0;
        while self.in_flight.front().is_some_and(FrameQuerySet::is_ready) {
            let Some(mut set) = self.in_flight.pop_front() else {
                break;
            };
            self.latest = Some(set.timings());
            set.reset();
            self.spare.push(set);
            drained += 1;
        }
        self.completed += drained as u64;
        drained
    }

    /// A set for the next frame: a recycled one, or a new one from `make`.
    pub fn acquire<F>(&mut self, make: F) -> FrameQuerySet<T>
    where
        F: FnOnce() -> FrameQuerySet<T>,
    {
        self.spare.pop().unwrap_or_else(make)
    }

    /// Queues a set whose frame has been submitted.
    pub fn push(&mut self, set: FrameQuerySet<T>) {
        self.in_flight.push_back(set);
    }

    /// Returns a set whose frame was never submitted.
    pub fn release(&mut self, mut set: FrameQuerySet<T>) {
        set.reset();
        self.spare.push(set);
    }

    pub fn latest(&self) -> Option<&PassTimings> {
        self.latest.as_ref()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Sets drained since creation.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Drops every set, in flight or spare.
    pub fn clear(&mut self) {
        self.in_flight.clear();
        self.spare.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Timer whose readiness the test flips by hand.
    #[derive(Debug, Clone)]
    struct FakeTimer {
        ready: Rc<Cell<bool>>,
        ns: f64,
    }

    impl PassTimer for FakeTimer {
        fn is_ready(&self) -> bool {
            self.ready.get()
        }

        fn elapsed_ns(&self) -> Option<f64> {
            self.ready.get().then_some(self.ns)
        }

        fn reset(&mut self) {
            self.ready.set(false);
        }
    }

    /// A set whose five timers share one readiness flag.
    fn frame(ns: f64) -> (FrameQuerySet<FakeTimer>, Rc<Cell<bool>>) {
        let ready = Rc::new(Cell::new(false));
        let timer = FakeTimer {
            ready: ready.clone(),
            ns,
        };
        (FrameQuerySet::new(std::array::from_fn(|_| timer.clone())), ready)
    }

    #[test]
    fn partially_ready_set_is_not_drained() {
        let ready: Vec<_> = (0..PassId::COUNT).map(|_| Rc::new(Cell::new(false))).collect();
        let set = FrameQuerySet::new(std::array::from_fn(|i| FakeTimer {
            ready: ready[i].clone(),
            ns: 1.0,
        }));
        let mut q = QueryPipeline::new();
        q.push(set);

        for flag in &ready[..PassId::COUNT - 1] {
            flag.set(true);
        }
        assert_eq!(q.drain(), 0);
        assert!(q.latest().is_none());

        ready[PassId::COUNT - 1].set(true);
        assert_eq!(q.drain(), 1);
        assert_eq!(q.in_flight(), 0);
    }

    #[test]
    fn later_ready_set_waits_for_earlier_one() {
        let mut q = QueryPipeline::new();
        let (s1, r1) = frame(1_000_000.0);
        let (s2, r2) = frame(2_000_000.0);
        q.push(s1);
        q.push(s2);

        r2.set(true);
        assert_eq!(q.drain(), 0);
        assert_eq!(q.in_flight(), 2);
        assert!(q.latest().is_none());

        r1.set(true);
        // Both drain; the newest is reported. Draining resets the shared flags.
        assert_eq!(q.drain(), 2);
        assert_eq!(q.completed(), 2);
        let latest = q.latest().unwrap();
        assert_eq!(latest.millis(PassId::Composite), Some(2.0));
    }

    #[test]
    fn head_first_reports_in_order() {
        let mut q = QueryPipeline::new();
        let (s1, r1) = frame(1.0);
        let (s2, r2) = frame(2.0);
        q.push(s1);
        q.push(s2);

        r1.set(true);
        assert_eq!(q.drain(), 1);
        assert_eq!(q.latest().unwrap().nanos(PassId::Geometry), Some(1.0));

        r2.set(true);
        assert_eq!(q.drain(), 1);
        assert_eq!(q.latest().unwrap().nanos(PassId::Geometry), Some(2.0));
    }

    #[test]
    fn drained_sets_are_recycled() {
        let mut q = QueryPipeline::new();
        let (s1, r1) = frame(5.0);
        q.push(s1);
        r1.set(true);
        q.drain();

        let mut made = false;
        let reused = q.acquire(|| {
            made = true;
            frame(0.0).0
        });
        assert!(!made);
        assert!(!reused.is_ready());
        assert_eq!(reused.timer(PassId::Shadow).ns, 5.0);
    }

    #[test]
    fn released_set_is_reused_without_reporting() {
        let mut q = QueryPipeline::new();
        let (s1, r1) = frame(3.0);
        r1.set(true);
        q.release(s1);
        assert_eq!(q.in_flight(), 0);
        assert_eq!(q.drain(), 0);
        assert!(q.latest().is_none());

        let reused = q.acquire(|| frame(0.0).0);
        assert!(!reused.is_ready());
        assert_eq!(reused.timer(PassId::Resolve).ns, 3.0);
    }
}
