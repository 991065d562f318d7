//! Single-threaded frame scheduler.
//!
//! A running loop holds at most one pending frame registration. Firing consumes
//! it; the owner re-arms after the frame has run. Stopping drops the pending
//! registration, which is all cancellation amounts to.

/// Timestamps handed to the per-frame callback, in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTime {
    pub time: f64,
    /// Time since the previous frame of the same run; zero on the first.
    pub delta: f64,
}

/// Handle of one pending frame registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRequest(u64);

#[derive(Debug, Default)]
pub struct FrameLoop {
    running: bool,
    pending: Option<FrameRequest>,
    next_id: u64,
    prev_time: Option<f64>,
    starts: u64,
    stops: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    fn request(&mut self) -> FrameRequest {
        let request = FrameRequest(self.next_id);
        self.next_id += 1;
        self.pending = Some(request);
        request
    }

    /// Starts a new run with a fresh delta baseline. No-op while running.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.prev_time = None;
        self.starts += 1;
        self.request();
    }

    /// Cancels the pending registration, if any. No-op while stopped.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.pending = None;
        self.stops += 1;
    }

    /// Consumes the pending registration. `None` when stopped or when the
    /// current frame has not been re-armed yet.
    pub fn fire(&mut self, now: f64) -> Option<FrameTime> {
        if !self.running {
            return None;
        }
        self.pending.take()?;
        let delta = self.prev_time.map_or(0.0, |prev| (now - prev).max(0.0));
        self.prev_time = Some(now);
        Some(FrameTime { time: now, delta })
    }

    /// Registers the next frame after one has run.
    pub fn rearm(&mut self) {
        if self.running && self.pending.is_none() {
            self.request();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    /// Runs started over the loop's lifetime.
    pub fn starts(&self) -> u64 {
        self.starts
    }

    /// Runs stopped over the loop's lifetime.
    pub fn stops(&self) -> u64 {
        self.stops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fire_has_zero_delta() {
        let mut frames = FrameLoop::new();
        frames.start();
        let first = frames.fire(10.0).unwrap();
        assert_eq!(first, FrameTime { time: 10.0, delta: 0.0 });
        frames.rearm();
        let second = frames.fire(10.5).unwrap();
        assert_eq!(second.delta, 0.5);
    }

    #[test]
    fn test_fire_without_rearm_yields_nothing() {
        let mut frames = FrameLoop::new();
        frames.start();
        assert!(frames.fire(0.0).is_some());
        assert!(frames.fire(1.0).is_none());
    }

    #[test]
    fn test_stop_cancels_pending() {
        let mut frames = FrameLoop::new();
        frames.start();
        assert!(frames.pending().is_some());
        frames.stop();
        assert!(frames.pending().is_none());
        assert!(frames.fire(1.0).is_none());
        frames.rearm();
        assert!(frames.pending().is_none());
    }

    #[test]
    fn test_restart_resets_delta_baseline() {
        let mut frames = FrameLoop::new();
        frames.start();
        frames.fire(1.0);
        frames.stop();
        frames.start();
        assert_eq!(frames.fire(5.0).unwrap().delta, 0.0);
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let mut frames = FrameLoop::new();
        frames.start();
        let pending = frames.pending();
        frames.start();
        assert_eq!(frames.pending(), pending);
        assert_eq!(frames.starts(), 1);
        frames.stop();
        frames.stop();
        assert_eq!(frames.stops(), 1);
    }

    #[test]
    fn test_clock_going_backwards_clamps_delta() {
        let mut frames = FrameLoop::new();
        frames.start();
        frames.fire(2.0);
        frames.rearm();
        assert_eq!(frames.fire(1.0).unwrap().delta, 0.0);
    }
}
