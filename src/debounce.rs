/// Trailing debounce over an abstract timer: a burst of `schedule` calls
/// collapses into one action fired after a quiet period.
use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::TimerPort;

struct State<T: TimerPort> {
    timer: Option<T::Handle>,
    action: Option<Box<dyn FnOnce()>>,
}

pub struct Debouncer<T: TimerPort> {
    timers: Rc<T>,
    delay_ms: u32,
    state: Rc<RefCell<State<T>>>,
}

impl<T: TimerPort + 'static> Debouncer<T> {
    pub fn new(timers: Rc<T>, delay_ms: u32) -> Debouncer<T> {
        Debouncer {
            timers,
            delay_ms,
            state: Rc::new(RefCell::new(State {
                timer: None,
                action: None,
            })),
        }
    }

    /// Replaces any pending action and restarts the quiet-period window.
    pub fn schedule(&self, action: Box<dyn FnOnce()>) {
        if let Some(handle) = self.state.borrow_mut().timer.take() {
            self.timers.clear_timeout(handle);
        }
        self.state.borrow_mut().action = Some(action);

        let state = Rc::clone(&self.state);
        let handle = self.timers.set_timeout(
            self.delay_ms,
            Box::new(move || {
                let action = {
                    let mut state = state.borrow_mut();
                    state.timer = None;
                    state.action.take()
                };
                if let Some(action) = action {
                    action();
                }
            }),
        );
        self.state.borrow_mut().timer = Some(handle);
    }

    /// Drops the pending action and timer, if any.
    pub fn cancel(&self) {
        let (timer, _action) = {
            let mut state = self.state.borrow_mut();
            (state.timer.take(), state.action.take())
        };
        if let Some(handle) = timer {
            self.timers.clear_timeout(handle);
        }
    }

    /// Runs the pending action now instead of waiting out the window.
    pub fn flush(&self) {
        let (timer, action) = {
            let mut state = self.state.borrow_mut();
            (state.timer.take(), state.action.take())
        };
        if let Some(handle) = timer {
            self.timers.clear_timeout(handle);
        }
        if let Some(action) = action {
            action();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().action.is_some()
    }
}
