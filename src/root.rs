/// Lifecycle manager for the extension's isolated mount points.
///
/// One `RootManager` instance is created per content-script lifetime and
/// shared by reference with every collaborator. It owns two registries:
/// the set of live root ids, and the cleanup callbacks run before a full
/// teardown.
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use crate::contracts::RootId;
use crate::dom::DocumentPort;

/// Callback releasing a resource scoped to a root's lifetime. Failures
/// are reported, logged and swallowed; they never block other cleanups.
pub type CleanupFn = Box<dyn FnMut() -> Result<(), String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupHandle(u64);

pub struct RootManager<D: DocumentPort> {
    doc: Rc<D>,
    live: RefCell<HashSet<RootId>>,
    cleanups: RefCell<Vec<(u64, CleanupFn)>>,
    next_cleanup: Cell<u64>,
}

impl<D: DocumentPort> RootManager<D> {
    pub fn new(doc: Rc<D>) -> RootManager<D> {
        RootManager {
            doc,
            live: RefCell::new(HashSet::new()),
            cleanups: RefCell::new(Vec::new()),
            next_cleanup: Cell::new(0),
        }
    }

    /// Returns the isolated root for `id`, creating the host element on
    /// first use. The host lands immediately after the element matched by
    /// `anchor`, or at the end of the body when no anchor is given or the
    /// anchor is missing. Returns `None` for unrecognized ids and when
    /// the body does not exist yet (callers poll until it does).
    pub fn init_root(&self, id: &str, anchor: Option<&str>) -> Option<D::Node> {
        let Some(root_id) = RootId::parse(id) else {
            log::error!("init_root: unrecognized root id '{id}'");
            return None;
        };

        if let Some(host) = self.doc.element_by_id(id) {
            self.live.borrow_mut().insert(root_id);
            return Some(self.doc.isolated_root(&host));
        }

        let host = self.doc.create_element("div");
        self.doc.set_id(&host, id);

        let mut placed = false;
        if let Some(selector) = anchor {
            if let Some(reference) = self.doc.query_selector(selector) {
                placed = self.doc.insert_after(&reference, &host);
            }
        }
        if !placed {
            match self.doc.body() {
                Some(body) => self.doc.append_child(&body, &host),
                None => {
                    log::warn!("init_root: document body not ready for '{id}'");
                    return None;
                }
            }
        }

        self.live.borrow_mut().insert(root_id);
        log::info!("root '{id}' created");
        Some(self.doc.isolated_root(&host))
    }

    /// Returns the existing isolated root for `id`, never creating one.
    pub fn get_root(&self, id: &str) -> Option<D::Node> {
        let host = self.doc.element_by_id(id)?;
        self.doc.existing_isolated_root(&host)
    }

    /// Registers a callback to run before the next full teardown. The
    /// returned handle unregisters it.
    pub fn register_cleanup(&self, f: CleanupFn) -> CleanupHandle {
        let id = self.next_cleanup.get();
        self.next_cleanup.set(id + 1);
        self.cleanups.borrow_mut().push((id, f));
        CleanupHandle(id)
    }

    pub fn unregister_cleanup(&self, handle: CleanupHandle) {
        self.cleanups.borrow_mut().retain(|(id, _)| *id != handle.0);
    }

    /// Removes the host element for `id` and forgets it. Tearing down a
    /// nonexistent root is a no-op. Cleanup callbacks do not run here.
    pub fn teardown_root_by_id(&self, id: &str) {
        if let Some(host) = self.doc.element_by_id(id) {
            self.doc.remove(&host);
            log::info!("root '{id}' removed");
        }
        if let Some(root_id) = RootId::parse(id) {
            self.live.borrow_mut().remove(&root_id);
        }
    }

    /// Runs every registered cleanup callback once, then tears down every
    /// root currently tracked as live.
    pub fn teardown_all_roots(&self) {
        // Drain first: a callback may register new cleanups, and those
        // belong to the next cycle.
        let mut cleanups = self.cleanups.replace(Vec::new());
        for (_, callback) in cleanups.iter_mut() {
            if let Err(err) = callback() {
                log::warn!("cleanup callback failed: {err}");
            }
        }

        let live: Vec<RootId> = self.live.borrow().iter().copied().collect();
        for root_id in live {
            self.teardown_root_by_id(root_id.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeDocument;
    use std::cell::Cell;

    fn manager() -> (Rc<FakeDocument>, RootManager<FakeDocument>) {
        let doc = Rc::new(FakeDocument::new());
        let roots = RootManager::new(Rc::clone(&doc));
        (doc, roots)
    }

    #[test]
    fn test_init_root_is_idempotent() {
        let (doc, roots) = manager();

        let first = roots.init_root("threadsense-root", None).unwrap();
        let nodes_after_first = doc.node_count();
        let second = roots.init_root("threadsense-root", None).unwrap();

        assert_eq!(first, second);
        assert_eq!(doc.node_count(), nodes_after_first);
    }

    #[test]
    fn test_init_root_rejects_unrecognized_ids() {
        let (doc, roots) = manager();
        let nodes_before = doc.node_count();

        assert_eq!(roots.init_root("threadsense-tpyo", None), None);
        assert_eq!(doc.node_count(), nodes_before);
    }

    #[test]
    fn test_init_root_places_host_after_anchor() {
        let (doc, roots) = manager();
        doc.insert_element("div", Some("feed_search_bar"));

        let root = roots.init_root("threadsense-searchbar", Some("#feed_search_bar"));

        assert!(root.is_some());
        assert!(doc.element_by_id("threadsense-searchbar").is_some());
    }

    #[test]
    fn test_init_root_falls_back_to_body_when_anchor_missing() {
        let (doc, roots) = manager();

        let root = roots.init_root("threadsense-searchbar", Some("#not-there"));

        assert!(root.is_some());
        assert!(doc.element_by_id("threadsense-searchbar").is_some());
    }

    #[test]
    fn test_init_root_without_body_returns_none() {
        let doc = Rc::new(FakeDocument::without_body());
        let roots = RootManager::new(Rc::clone(&doc));

        assert_eq!(roots.init_root("threadsense-root", None), None);

        // Caller retries once the body shows up.
        doc.create_body();
        assert!(roots.init_root("threadsense-root", None).is_some());
    }

    #[test]
    fn test_get_root_never_creates() {
        let (doc, roots) = manager();

        assert_eq!(roots.get_root("threadsense-root"), None);
        assert_eq!(doc.node_count(), 2); // document + body

        let created = roots.init_root("threadsense-root", None).unwrap();
        assert_eq!(roots.get_root("threadsense-root"), Some(created));
    }

    #[test]
    fn test_teardown_then_recreate() {
        let (doc, roots) = manager();
        roots.init_root("threadsense-root", None).unwrap();

        roots.teardown_root_by_id("threadsense-root");

        assert_eq!(roots.get_root("threadsense-root"), None);
        assert_eq!(doc.element_by_id("threadsense-root"), None);

        let fresh = roots.init_root("threadsense-root", None);
        assert!(fresh.is_some());
    }

    #[test]
    fn test_teardown_of_nonexistent_root_is_a_noop() {
        let (_, roots) = manager();
        roots.teardown_root_by_id("threadsense-root");
        roots.teardown_root_by_id("never-existed");
    }

    #[test]
    fn test_teardown_all_runs_every_cleanup_once_despite_failures() {
        let (doc, roots) = manager();
        roots.init_root("threadsense-root", None).unwrap();

        let first = Rc::new(Cell::new(0));
        let failing = Rc::new(Cell::new(0));
        let last = Rc::new(Cell::new(0));
        {
            let first = Rc::clone(&first);
            roots.register_cleanup(Box::new(move || {
                first.set(first.get() + 1);
                Ok(())
            }));
        }
        {
            let failing = Rc::clone(&failing);
            roots.register_cleanup(Box::new(move || {
                failing.set(failing.get() + 1);
                Err("subscription already gone".to_string())
            }));
        }
        {
            let last = Rc::clone(&last);
            roots.register_cleanup(Box::new(move || {
                last.set(last.get() + 1);
                Ok(())
            }));
        }

        roots.teardown_all_roots();

        assert_eq!((first.get(), failing.get(), last.get()), (1, 1, 1));
        assert_eq!(doc.element_by_id("threadsense-root"), None);

        // A second teardown cycle must not re-run drained callbacks.
        roots.teardown_all_roots();
        assert_eq!((first.get(), failing.get(), last.get()), (1, 1, 1));
    }

    #[test]
    fn test_unregister_cleanup() {
        let (_, roots) = manager();
        let ran = Rc::new(Cell::new(false));
        let handle = {
            let ran = Rc::clone(&ran);
            roots.register_cleanup(Box::new(move || {
                ran.set(true);
                Ok(())
            }))
        };

        roots.unregister_cleanup(handle);
        roots.teardown_all_roots();

        assert!(!ran.get());
    }
}
