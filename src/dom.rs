/// Ports abstracting the host page.
///
/// The injection lifecycle never touches `web_sys` directly: all document
/// and timer access goes through these traits, so the logic runs against
/// a fake document and a virtual clock in tests. The wasm implementations
/// live in `crate::web`.

/// Access to the host document. The page is a shared, externally-mutated
/// resource, so every lookup returns `Option`: an element found a moment
/// ago may already be gone.
pub trait DocumentPort {
    /// Handle to a node in the host document.
    type Node: Clone + PartialEq + 'static;
    /// Handle to an active mutation watch.
    type Watch;

    fn body(&self) -> Option<Self::Node>;
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;
    fn query_selector(&self, selector: &str) -> Option<Self::Node>;

    fn create_element(&self, tag: &str) -> Self::Node;
    fn set_id(&self, node: &Self::Node, id: &str);
    fn add_class(&self, node: &Self::Node, class: &str);
    fn set_attr(&self, node: &Self::Node, name: &str, value: &str);
    fn set_text(&self, node: &Self::Node, text: &str);

    fn append_child(&self, parent: &Self::Node, child: &Self::Node);
    /// Inserts `node` immediately after `reference`. Returns `false` when
    /// the reference has no parent anymore.
    fn insert_after(&self, reference: &Self::Node, node: &Self::Node) -> bool;
    fn remove(&self, node: &Self::Node);

    /// Returns the isolated style/DOM boundary attached to `host`,
    /// creating it on first use.
    fn isolated_root(&self, host: &Self::Node) -> Self::Node;
    /// Returns the isolated boundary only if one was already attached.
    fn existing_isolated_root(&self, host: &Self::Node) -> Option<Self::Node>;
    /// Selector lookup scoped to `scope` (an element or isolated root).
    fn find_in(&self, scope: &Self::Node, selector: &str) -> Option<Self::Node>;

    fn on_click(&self, node: &Self::Node, handler: Box<dyn Fn() + 'static>);
    fn input_value(&self, node: &Self::Node) -> String;

    /// Begins watching the document body subtree for child-list changes.
    /// The callback receives the size of each mutation batch. Returns
    /// `None` when the body is not available yet.
    fn watch_mutations(&self, on_batch: Box<dyn FnMut(usize) + 'static>) -> Option<Self::Watch>;
    fn unwatch(&self, watch: Self::Watch);

    /// Current page URL, used to detect in-page navigation.
    fn url(&self) -> String;
}

/// One-shot timers plus a wall clock, so debounce and polling logic can
/// run against a virtual clock in tests.
pub trait TimerPort {
    type Handle;

    fn set_timeout(&self, delay_ms: u32, f: Box<dyn FnOnce() + 'static>) -> Self::Handle;
    fn clear_timeout(&self, handle: Self::Handle);
    fn now_ms(&self) -> f64;
}
