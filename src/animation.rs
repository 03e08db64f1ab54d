//! Self-rescheduling frame loop with an explicit cancellation handle.
//!
//! Everything here runs on one thread: the scheduler invokes each frame
//! callback from the host's frame clock and the callback schedules the next.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::Result;

/// Host primitive that runs a callback on the next display frame.
pub trait FrameScheduler {
    fn schedule(&self, frame: Box<dyn FnOnce()>) -> Result<()>;
}

/// Token returned by [`start`]. Cancelling stops all future frames; clones
/// share the same state.
#[derive(Debug, Clone, Default)]
pub struct AnimationHandle {
    cancelled: Rc<Cell<bool>>,
    frames: Rc<Cell<u64>>,
}

impl AnimationHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Frames rendered since the loop started.
    pub fn frames(&self) -> u64 {
        self.frames.get()
    }
}

struct Loop {
    handle: AnimationHandle,
    scheduler: Rc<dyn FrameScheduler>,
    render: RefCell<Box<dyn FnMut() -> Result<()>>>,
}

/// Schedule `render` on every frame until the returned handle is cancelled
/// or `render` fails. The first call happens on the first scheduled frame,
/// not synchronously.
pub fn start<F>(scheduler: Rc<dyn FrameScheduler>, render: F) -> AnimationHandle
where
    F: FnMut() -> Result<()> + 'static,
{
    let handle = AnimationHandle::default();
    let state = Rc::new(Loop {
        handle: handle.clone(),
        scheduler,
        render: RefCell::new(Box::new(render)),
    });
    schedule_next(state);
    handle
}

fn tick(state: Rc<Loop>) {
    if state.handle.is_cancelled() {
        return;
    }
    let rendered = {
        let mut render = state.render.borrow_mut();
        (*render)()
    };
    if let Err(e) = rendered {
        log::error!("stopping animation, frame failed: {e}");
        state.handle.cancel();
        return;
    }
    state.handle.frames.set(state.handle.frames.get() + 1);
    // render may have cancelled
    if !state.handle.is_cancelled() {
        schedule_next(state);
    }
}

fn schedule_next(state: Rc<Loop>) {
    let scheduler = Rc::clone(&state.scheduler);
    let handle = state.handle.clone();
    if let Err(e) = scheduler.schedule(Box::new(move || tick(state))) {
        log::error!("stopping animation, frame could not be scheduled: {e}");
        handle.cancel();
    }
}

/// Scheduler that queues frames until the owner runs them, for headless
/// hosts and tests.
#[derive(Default)]
pub struct ManualScheduler {
    queue: RefCell<VecDeque<Box<dyn FnOnce()>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run the frames queued right now; frames they schedule wait for the
    /// next call. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let batch: Vec<_> = self.queue.borrow_mut().drain(..).collect();
        let count = batch.len();
        for frame in batch {
            frame();
        }
        count
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule(&self, frame: Box<dyn FnOnce()>) -> Result<()> {
        self.queue.borrow_mut().push_back(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;

    #[test]
    fn renders_once_per_frame_until_cancelled() {
        let scheduler = Rc::new(ManualScheduler::new());
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let handle = start(scheduler.clone(), move || {
            seen.set(seen.get() + 1);
            Ok(())
        });

        assert_eq!(count.get(), 0);
        assert_eq!(scheduler.pending(), 1);
        for _ in 0..3 {
            assert_eq!(scheduler.run_pending(), 1);
        }
        assert_eq!(count.get(), 3);
        assert_eq!(handle.frames(), 3);

        handle.cancel();
        scheduler.run_pending();
        assert_eq!(count.get(), 3);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn render_can_cancel_its_own_loop() {
        let scheduler = Rc::new(ManualScheduler::new());
        let slot: Rc<RefCell<Option<AnimationHandle>>> = Rc::default();
        let inner = Rc::clone(&slot);
        let handle = start(scheduler.clone(), move || {
            if let Some(h) = inner.borrow().as_ref() {
                h.cancel();
            }
            Ok(())
        });
        *slot.borrow_mut() = Some(handle.clone());

        scheduler.run_pending();
        assert!(handle.is_cancelled());
        assert_eq!(scheduler.pending(), 0);
    }

    struct Failing;

    impl FrameScheduler for Failing {
        fn schedule(&self, _frame: Box<dyn FnOnce()>) -> Result<()> {
            Err(FieldError::Host("no frame clock".to_string()))
        }
    }

    #[test]
    fn scheduling_failure_cancels() {
        let handle = start(Rc::new(Failing), || Ok(()));
        assert!(handle.is_cancelled());
        assert_eq!(handle.frames(), 0);
    }

    #[test]
    fn render_failure_cancels() {
        let scheduler = Rc::new(ManualScheduler::new());
        let handle = start(scheduler.clone(), || {
            Err(FieldError::Host("context lost".to_string()))
        });
        assert_eq!(scheduler.run_pending(), 1);
        assert!(handle.is_cancelled());
        assert_eq!(handle.frames(), 0);
        assert_eq!(scheduler.pending(), 0);
    }
}
