//! The renderer slot: exactly one active strategy driven by one frame loop.

use crate::error::RenderResult;
use crate::frame_loop::{FrameLoop, FrameTime};
use crate::strategy::{RenderMode, RenderStrategy};

/// Callback run before every draw, with the frame's timestamps.
pub type FrameCallback<S> = Box<dyn FnMut(&mut S, FrameTime)>;

pub struct RendererSlot<S> {
    strategy: Option<Box<dyn RenderStrategy<S>>>,
    frame_loop: FrameLoop,
    on_frame: Option<FrameCallback<S>>,
}

impl<S> Default for RendererSlot<S> {
    fn default() -> Self {
        Self {
            strategy: None,
            frame_loop: FrameLoop::new(),
            on_frame: None,
        }
    }
}

impl<S> RendererSlot<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_on_frame(&mut self, callback: impl FnMut(&mut S, FrameTime) + 'static) {
        self.on_frame = Some(Box::new(callback));
    }

    /// Replaces the active strategy. The previous one is stopped and dropped
    /// before `build` runs; the new one starts with a fresh frame loop run.
    /// If `build` fails the slot is left empty and stopped.
    pub fn set_strategy<F>(&mut self, build: F) -> RenderResult<RenderMode>
    where
        F: FnOnce() -> RenderResult<Box<dyn RenderStrategy<S>>>,
    {
        self.stop();
        if let Some(previous) = self.strategy.take() {
            log::debug!("Dropping {} renderer", previous.mode());
        }

        let strategy = build()?;
        let mode = strategy.mode();
        self.strategy = Some(strategy);
        self.frame_loop.start();
        log::info!("Renderer set to {}", mode);
        Ok(mode)
    }

    /// Stops the frame loop; the strategy stays installed.
    pub fn stop(&mut self) {
        self.frame_loop.stop();
    }

    /// Restarts the frame loop of the installed strategy.
    pub fn start(&mut self) {
        if self.strategy.is_some() {
            self.frame_loop.start();
        }
    }

    pub fn mode(&self) -> Option<RenderMode> {
        self.strategy.as_ref().map(|s| s.mode())
    }

    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    /// Runs one frame if one is registered: the frame callback, then the
    /// strategy's draw, then re-arms. Returns whether a frame ran.
    pub fn run_frame(&mut self, stage: &mut S, now: f64) -> RenderResult<bool> {
        let Some(time) = self.frame_loop.fire(now) else {
            return Ok(false);
        };

        if let Some(on_frame) = self.on_frame.as_mut() {
            on_frame(stage, time);
        }
        let result = match self.strategy.as_mut() {
            Some(strategy) => strategy.draw(stage),
            None => Ok(()),
        };

        self.frame_loop.rearm();
        result.map(|()| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every callback and draw into the stage.
    struct Recorder(RenderMode);

    impl RenderStrategy<Vec<String>> for Recorder {
        fn mode(&self) -> RenderMode {
            self.0
        }

        fn draw(&mut self, stage: &mut Vec<String>) -> RenderResult<()> {
            stage.push(format!("draw {}", self.0));
            Ok(())
        }
    }

    struct Failing;

    impl RenderStrategy<Vec<String>> for Failing {
        fn mode(&self) -> RenderMode {
            RenderMode::Naive
        }

        fn draw(&mut self, _stage: &mut Vec<String>) -> RenderResult<()> {
            Err(RenderError::NoTarget)
        }
    }

    fn recorder(mode: RenderMode) -> RenderResult<Box<dyn RenderStrategy<Vec<String>>>> {
        Ok(Box::new(Recorder(mode)))
    }

    #[test]
    fn test_callback_runs_before_draw() {
        let mut slot = RendererSlot::new();
        slot.set_on_frame(|log: &mut Vec<String>, t| log.push(format!("frame {} {}", t.time, t.delta)));
        slot.set_strategy(|| recorder(RenderMode::ForwardPlus)).unwrap();

        let mut log = Vec::new();
        assert!(slot.run_frame(&mut log, 1.0).unwrap());
        assert!(slot.run_frame(&mut log, 1.25).unwrap());
        assert_eq!(
            log,
            vec!["frame 1 0", "draw forward-plus", "frame 1.25 0.25", "draw forward-plus"]
        );
    }

    #[test]
    fn test_swap_stops_one_and_starts_one() {
        let mut slot = RendererSlot::new();
        slot.set_strategy(|| recorder(RenderMode::Naive)).unwrap();
        assert_eq!((slot.frame_loop().starts(), slot.frame_loop().stops()), (1, 0));

        slot.set_strategy(|| recorder(RenderMode::ClusteredDeferred)).unwrap();
        assert_eq!((slot.frame_loop().starts(), slot.frame_loop().stops()), (2, 1));
        assert!(slot.frame_loop().pending().is_some());
        assert_eq!(slot.mode(), Some(RenderMode::ClusteredDeferred));

        let mut log = Vec::new();
        slot.run_frame(&mut log, 0.0).unwrap();
        assert_eq!(log, vec!["draw clustered-deferred"]);
    }

    struct DropProbe(Rc<RefCell<Vec<&'static str>>>);

    impl RenderStrategy<Vec<String>> for DropProbe {
        fn mode(&self) -> RenderMode {
            RenderMode::Naive
        }

        fn draw(&mut self, _stage: &mut Vec<String>) -> RenderResult<()> {
            Ok(())
        }
    }

    impl Drop for DropProbe {
        fn drop(&mut self) {
            self.0.borrow_mut().push("drop");
        }
    }

    #[test]
    fn test_previous_strategy_dropped_before_build() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut slot = RendererSlot::new();
        let probe = DropProbe(events.clone());
        slot.set_strategy(|| Ok(Box::new(probe) as Box<dyn RenderStrategy<Vec<String>>>))
            .unwrap();

        let build_events = events.clone();
        slot.set_strategy(|| {
            build_events.borrow_mut().push("build");
            recorder(RenderMode::ForwardPlus)
        })
        .unwrap();
        assert_eq!(*events.borrow(), vec!["drop", "build"]);
    }

    #[test]
    fn test_failed_build_leaves_slot_stopped() {
        let mut slot = RendererSlot::new();
        slot.set_strategy(|| recorder(RenderMode::Naive)).unwrap();
        let result = slot.set_strategy(|| Err(RenderError::AdapterUnavailable));
        assert!(result.is_err());
        assert_eq!(slot.mode(), None);
        assert!(!slot.frame_loop().is_running());
        assert_eq!(slot.frame_loop().stops(), 1);
    }

    #[test]
    fn test_stopped_slot_does_not_draw() {
        let mut slot = RendererSlot::new();
        slot.set_strategy(|| recorder(RenderMode::Naive)).unwrap();
        slot.stop();

        let mut log = Vec::new();
        assert!(!slot.run_frame(&mut log, 0.0).unwrap());
        assert!(log.is_empty());

        slot.start();
        assert!(slot.run_frame(&mut log, 0.0).unwrap());
    }

    #[test]
    fn test_draw_error_still_rearms() {
        let mut slot = RendererSlot::new();
        slot.set_strategy(|| Ok(Box::new(Failing) as Box<dyn RenderStrategy<Vec<String>>>))
            .unwrap();
        let mut log = Vec::new();
        assert!(slot.run_frame(&mut log, 0.0).is_err());
        assert!(slot.frame_loop().pending().is_some());
    }
}
