/// Debounced watcher over the host document's body.
///
/// Mutation batches accumulate into a pending counter; subscribers get a
/// single notification with the aggregate count once the page has been
/// quiet for the debounce window. The observer is tied to a designated
/// root: it refuses to start without it and halts itself once it is gone.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::debounce::Debouncer;
use crate::dom::{DocumentPort, TimerPort};
use crate::root::RootManager;

pub const DEBOUNCE_MS: u32 = 200;

/// Aggregate notification delivered after a quiet period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomChange {
    pub mutation_count: usize,
    pub at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Subscriber callback. Failures are logged and never block delivery to
/// the other subscribers. Callbacks must not mutate the subscriber set.
pub type DomChangedFn = Box<dyn FnMut(&DomChange) -> Result<(), String>>;

struct WatchState<D: DocumentPort> {
    watch: Option<D::Watch>,
    running: bool,
}

struct Inner<D: DocumentPort, T: TimerPort> {
    doc: Rc<D>,
    timers: Rc<T>,
    root_id: String,
    state: RefCell<WatchState<D>>,
    pending: Cell<usize>,
    debounce: Debouncer<T>,
    subscribers: RefCell<Vec<(u64, DomChangedFn)>>,
    next_sub: Cell<u64>,
}

/// Cheaply cloneable handle; clones share one observer.
pub struct DomObserver<D: DocumentPort, T: TimerPort> {
    inner: Rc<Inner<D, T>>,
}

impl<D: DocumentPort, T: TimerPort> Clone for DomObserver<D, T> {
    fn clone(&self) -> Self {
        DomObserver {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: DocumentPort + 'static, T: TimerPort + 'static> DomObserver<D, T> {
    /// `root_id` designates the root whose existence gates observation.
    pub fn new(doc: Rc<D>, timers: Rc<T>, root_id: &str) -> DomObserver<D, T> {
        DomObserver {
            inner: Rc::new(Inner {
                doc: Rc::clone(&doc),
                debounce: Debouncer::new(Rc::clone(&timers), DEBOUNCE_MS),
                timers,
                root_id: root_id.to_string(),
                state: RefCell::new(WatchState {
                    watch: None,
                    running: false,
                }),
                pending: Cell::new(0),
                subscribers: RefCell::new(Vec::new()),
                next_sub: Cell::new(0),
            }),
        }
    }

    fn has_root(&self) -> bool {
        self.inner.doc.element_by_id(&self.inner.root_id).is_some()
    }

    /// Begins watching. Returns `false` when already running or the
    /// designated root does not exist. Registers its own stop action with
    /// the root manager so a full teardown halts observation too.
    pub fn start(&self, roots: &RootManager<D>) -> bool {
        if self.inner.state.borrow().running {
            return false;
        }
        if !self.has_root() {
            return false;
        }

        let observer = self.clone();
        let Some(watch) = self
            .inner
            .doc
            .watch_mutations(Box::new(move |batch_size| observer.record_batch(batch_size)))
        else {
            return false;
        };

        {
            let mut state = self.inner.state.borrow_mut();
            state.watch = Some(watch);
            state.running = true;
        }
        log::info!("observe: started");

        let observer = self.clone();
        roots.register_cleanup(Box::new(move || {
            observer.stop();
            Ok(())
        }));
        true
    }

    /// Cancels observation and any pending flush. Returns whether it was
    /// actually running.
    pub fn stop(&self) -> bool {
        let watch = {
            let mut state = self.inner.state.borrow_mut();
            if !state.running {
                return false;
            }
            state.running = false;
            state.watch.take()
        };
        if let Some(watch) = watch {
            self.inner.doc.unwatch(watch);
        }
        self.inner.pending.set(0);
        self.inner.debounce.cancel();
        log::info!("observe: stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.borrow().running
    }

    pub fn on_dom_changed(&self, callback: DomChangedFn) -> SubscriptionId {
        let id = self.inner.next_sub.get();
        self.inner.next_sub.set(id + 1);
        self.inner.subscribers.borrow_mut().push((id, callback));
        SubscriptionId(id)
    }

    pub fn off_dom_changed(&self, subscription: SubscriptionId) {
        self.inner
            .subscribers
            .borrow_mut()
            .retain(|(id, _)| *id != subscription.0);
    }

    fn record_batch(&self, batch_size: usize) {
        if !self.inner.state.borrow().running {
            return;
        }
        self.inner.pending.set(self.inner.pending.get() + batch_size);

        let observer = self.clone();
        self.inner
            .debounce
            .schedule(Box::new(move || observer.flush_now()));
    }

    fn flush_now(&self) {
        if !self.has_root() {
            self.stop();
            return;
        }

        let change = DomChange {
            mutation_count: self.inner.pending.replace(0),
            at: self.inner.timers.now_ms(),
        };
        let mut subscribers = self.inner.subscribers.borrow_mut();
        for (_, callback) in subscribers.iter_mut() {
            if let Err(err) = callback(&change) {
                log::warn!("dom-changed subscriber failed: {err}");
            }
        }
    }
}
