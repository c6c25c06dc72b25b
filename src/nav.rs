/// In-page navigation detection for single-page hosts: the URL changes
/// without a full reload, leaving previously-anchored widgets stale.
/// Polls the location on a re-armed timeout and reports each change.
use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::{DocumentPort, TimerPort};

pub const NAV_POLL_MS: u32 = 500;

struct NavState<T: TimerPort> {
    running: bool,
    last_url: String,
    timer: Option<T::Handle>,
    on_change: Option<Box<dyn FnMut(&str)>>,
}

struct Inner<D: DocumentPort, T: TimerPort> {
    doc: Rc<D>,
    timers: Rc<T>,
    poll_ms: u32,
    state: RefCell<NavState<T>>,
}

pub struct NavigationWatcher<D: DocumentPort, T: TimerPort> {
    inner: Rc<Inner<D, T>>,
}

impl<D: DocumentPort, T: TimerPort> Clone for NavigationWatcher<D, T> {
    fn clone(&self) -> Self {
        NavigationWatcher {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: DocumentPort + 'static, T: TimerPort + 'static> NavigationWatcher<D, T> {
    pub fn new(doc: Rc<D>, timers: Rc<T>) -> NavigationWatcher<D, T> {
        NavigationWatcher {
            inner: Rc::new(Inner {
                doc,
                timers,
                poll_ms: NAV_POLL_MS,
                state: RefCell::new(NavState {
                    running: false,
                    last_url: String::new(),
                    timer: None,
                    on_change: None,
                }),
            }),
        }
    }

    /// Begins polling. Returns `false` when already running.
    pub fn start(&self, on_change: Box<dyn FnMut(&str)>) -> bool {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.running {
                return false;
            }
            state.running = true;
            state.last_url = self.inner.doc.url();
            state.on_change = Some(on_change);
        }
        self.arm();
        true
    }

    /// Stops polling. Idempotent; returns whether it was running.
    pub fn stop(&self) -> bool {
        let (was_running, timer) = {
            let mut state = self.inner.state.borrow_mut();
            let was_running = state.running;
            state.running = false;
            state.on_change = None;
            (was_running, state.timer.take())
        };
        if let Some(handle) = timer {
            self.inner.timers.clear_timeout(handle);
        }
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.borrow().running
    }

    fn arm(&self) {
        let watcher = self.clone();
        let handle = self
            .inner
            .timers
            .set_timeout(self.inner.poll_ms, Box::new(move || watcher.tick()));
        self.inner.state.borrow_mut().timer = Some(handle);
    }

    fn tick(&self) {
        // The callback runs outside the borrow: it may call stop(), or
        // tear down roots that share this document.
        let (changed, callback) = {
            let mut state = self.inner.state.borrow_mut();
            if !state.running {
                return;
            }
            let url = self.inner.doc.url();
            if url == state.last_url {
                (None, None)
            } else {
                state.last_url = url.clone();
                (Some(url), state.on_change.take())
            }
        };

        if let Some(url) = changed {
            log::info!("navigation detected: {url}");
            if let Some(mut callback) = callback {
                callback(&url);
                let mut state = self.inner.state.borrow_mut();
                if state.running {
                    state.on_change = Some(callback);
                }
            }
        }

        if self.inner.state.borrow().running {
            self.arm();
        }
    }
}
