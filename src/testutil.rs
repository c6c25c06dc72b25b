/// Test doubles for the host-page ports: an in-memory document, a virtual
/// clock, and recording channel ends. Only compiled for tests.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::bridge::{BackgroundPort, ChannelError, PagePort};
use crate::contracts::Envelope;
use crate::dispatch::{Cookie, CookiePort};
use crate::dom::{DocumentPort, TimerPort};

// ---------------------------------------------------------------------------
// FakeDocument
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeNode(usize);

struct NodeData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    value: String,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Isolated-root child attached to this host, kept out of `children`
    /// so document-level queries never cross the boundary.
    shadow: Option<usize>,
}

impl NodeData {
    fn new(tag: &str) -> NodeData {
        NodeData {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
            text: None,
            value: String::new(),
            parent: None,
            children: Vec::new(),
            shadow: None,
        }
    }
}

type BatchFn = Rc<RefCell<Box<dyn FnMut(usize)>>>;

struct DocInner {
    nodes: Vec<NodeData>,
    body: Option<usize>,
    watchers: HashMap<usize, BatchFn>,
    next_watch: usize,
    click_handlers: HashMap<usize, Vec<Rc<dyn Fn()>>>,
    url: String,
}

/// In-memory stand-in for the host document. Node 0 is the document root;
/// the body is created lazily so "body not ready" paths are testable.
#[derive(Clone)]
pub struct FakeDocument {
    inner: Rc<RefCell<DocInner>>,
}

pub struct FakeWatch(usize);

impl FakeDocument {
    pub fn new() -> FakeDocument {
        let doc = FakeDocument::without_body();
        doc.create_body();
        doc
    }

    pub fn without_body() -> FakeDocument {
        let inner = DocInner {
            nodes: vec![NodeData::new("#document")],
            body: None,
            watchers: HashMap::new(),
            next_watch: 0,
            click_handlers: HashMap::new(),
            url: "https://piazza.com/class/demo".to_string(),
        };
        FakeDocument {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub fn create_body(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.body.is_some() {
            return;
        }
        let idx = inner.nodes.len();
        let mut body = NodeData::new("body");
        body.parent = Some(0);
        inner.nodes.push(body);
        inner.nodes[0].children.push(idx);
        inner.body = Some(idx);
    }

    /// Appends a fresh element to the body and returns it. Panics when the
    /// body is missing, which is always a test bug.
    pub fn insert_element(&self, tag: &str, id: Option<&str>) -> FakeNode {
        let node = self.create_element(tag);
        if let Some(id) = id {
            self.set_id(&node, id);
        }
        let body = self.body().expect("fake body missing");
        self.append_child(&body, &node);
        node
    }

    pub fn node_count(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    pub fn set_url(&self, url: &str) {
        self.inner.borrow_mut().url = url.to_string();
    }

    pub fn set_input_value(&self, node: &FakeNode, value: &str) {
        self.inner.borrow_mut().nodes[node.0].value = value.to_string();
    }

    pub fn text_of(&self, node: &FakeNode) -> Option<String> {
        self.inner.borrow().nodes[node.0].text.clone()
    }

    pub fn active_watch_count(&self) -> usize {
        self.inner.borrow().watchers.len()
    }

    /// Delivers one mutation batch of `count` records to every watcher.
    pub fn emit_mutations(&self, count: usize) {
        let callbacks: Vec<(usize, BatchFn)> = self
            .inner
            .borrow()
            .watchers
            .iter()
            .map(|(id, cb)| (*id, Rc::clone(cb)))
            .collect();
        for (id, cb) in callbacks {
            let still_active = self.inner.borrow().watchers.contains_key(&id);
            if still_active {
                (cb.borrow_mut())(count);
            }
        }
    }

    /// Fires the registered click handlers for `node`.
    pub fn click(&self, node: &FakeNode) {
        let handlers: Vec<Rc<dyn Fn()>> = self
            .inner
            .borrow()
            .click_handlers
            .get(&node.0)
            .map(|hs| hs.to_vec())
            .unwrap_or_default();
        for handler in handlers {
            handler();
        }
    }

    pub fn attr_of(&self, node: &FakeNode, name: &str) -> Option<String> {
        self.inner.borrow().nodes[node.0]
            .attrs
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn matches(&self, idx: usize, selector: &str) -> bool {
        let inner = self.inner.borrow();
        let node = &inner.nodes[idx];
        if let Some(id) = selector.strip_prefix('#') {
            node.id.as_deref() == Some(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            node.classes.iter().any(|c| c == class)
        } else {
            node.tag == selector
        }
    }

    /// Depth-first search below `start`, never descending into isolated
    /// roots unless the search started inside one.
    fn search(&self, start: usize, selector: &str, include_start: bool) -> Option<usize> {
        if include_start && self.matches(start, selector) {
            return Some(start);
        }
        let children = self.inner.borrow().nodes[start].children.clone();
        for child in children {
            if let Some(found) = self.search(child, selector, true) {
                return Some(found);
            }
        }
        None
    }
}

impl DocumentPort for FakeDocument {
    type Node = FakeNode;
    type Watch = FakeWatch;

    fn body(&self) -> Option<FakeNode> {
        self.inner.borrow().body.map(FakeNode)
    }

    fn element_by_id(&self, id: &str) -> Option<FakeNode> {
        let selector = format!("#{id}");
        self.search(0, &selector, false).map(FakeNode)
    }

    fn query_selector(&self, selector: &str) -> Option<FakeNode> {
        self.search(0, selector, false).map(FakeNode)
    }

    fn create_element(&self, tag: &str) -> FakeNode {
        let mut inner = self.inner.borrow_mut();
        let idx = inner.nodes.len();
        inner.nodes.push(NodeData::new(tag));
        FakeNode(idx)
    }

    fn set_id(&self, node: &FakeNode, id: &str) {
        self.inner.borrow_mut().nodes[node.0].id = Some(id.to_string());
    }

    fn add_class(&self, node: &FakeNode, class: &str) {
        self.inner.borrow_mut().nodes[node.0].classes.push(class.to_string());
    }

    fn set_attr(&self, node: &FakeNode, name: &str, value: &str) {
        self.inner
            .borrow_mut()
            .nodes[node.0]
            .attrs
            .push((name.to_string(), value.to_string()));
    }

    fn set_text(&self, node: &FakeNode, text: &str) {
        self.inner.borrow_mut().nodes[node.0].text = Some(text.to_string());
    }

    fn append_child(&self, parent: &FakeNode, child: &FakeNode) {
        let mut inner = self.inner.borrow_mut();
        inner.nodes[child.0].parent = Some(parent.0);
        inner.nodes[parent.0].children.push(child.0);
    }

    fn insert_after(&self, reference: &FakeNode, node: &FakeNode) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(parent) = inner.nodes[reference.0].parent else {
            return false;
        };
        let pos = inner.nodes[parent]
            .children
            .iter()
            .position(|&c| c == reference.0);
        let Some(pos) = pos else { return false };
        inner.nodes[node.0].parent = Some(parent);
        inner.nodes[parent].children.insert(pos + 1, node.0);
        true
    }

    fn remove(&self, node: &FakeNode) {
        let mut inner = self.inner.borrow_mut();
        if let Some(parent) = inner.nodes[node.0].parent.take() {
            inner.nodes[parent].children.retain(|&c| c != node.0);
        }
        if inner.body == Some(node.0) {
            inner.body = None;
        }
    }

    fn isolated_root(&self, host: &FakeNode) -> FakeNode {
        if let Some(existing) = self.existing_isolated_root(host) {
            return existing;
        }
        let mut inner = self.inner.borrow_mut();
        let idx = inner.nodes.len();
        let mut shadow = NodeData::new("#shadow-root");
        shadow.parent = Some(host.0);
        inner.nodes.push(shadow);
        inner.nodes[host.0].shadow = Some(idx);
        FakeNode(idx)
    }

    fn existing_isolated_root(&self, host: &FakeNode) -> Option<FakeNode> {
        self.inner.borrow().nodes[host.0].shadow.map(FakeNode)
    }

    fn find_in(&self, scope: &FakeNode, selector: &str) -> Option<FakeNode> {
        self.search(scope.0, selector, false).map(FakeNode)
    }

    fn on_click(&self, node: &FakeNode, handler: Box<dyn Fn() + 'static>) {
        self.inner
            .borrow_mut()
            .click_handlers
            .entry(node.0)
            .or_default()
            .push(Rc::from(handler));
    }

    fn input_value(&self, node: &FakeNode) -> String {
        self.inner.borrow().nodes[node.0].value.clone()
    }

    fn watch_mutations(&self, on_batch: Box<dyn FnMut(usize) + 'static>) -> Option<FakeWatch> {
        let mut inner = self.inner.borrow_mut();
        inner.body?;
        let id = inner.next_watch;
        inner.next_watch += 1;
        inner.watchers.insert(id, Rc::new(RefCell::new(on_batch)));
        Some(FakeWatch(id))
    }

    fn unwatch(&self, watch: FakeWatch) {
        self.inner.borrow_mut().watchers.remove(&watch.0);
    }

    fn url(&self) -> String {
        self.inner.borrow().url.clone()
    }
}

// ---------------------------------------------------------------------------
// VirtualTimers
// ---------------------------------------------------------------------------

struct PendingTimer {
    id: u64,
    fire_at: f64,
    callback: Box<dyn FnOnce()>,
}

struct TimerInner {
    now: f64,
    next_id: u64,
    pending: Vec<PendingTimer>,
}

/// Deterministic clock: timers only fire inside `advance`.
#[derive(Clone)]
pub struct VirtualTimers {
    inner: Rc<RefCell<TimerInner>>,
}

impl VirtualTimers {
    pub fn new() -> VirtualTimers {
        VirtualTimers {
            inner: Rc::new(RefCell::new(TimerInner {
                now: 0.0,
                next_id: 0,
                pending: Vec::new(),
            })),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Moves the clock forward, firing due timers in order. Callbacks may
    /// schedule further timers; those also fire if they fall inside the
    /// advanced window.
    pub fn advance(&self, ms: f64) {
        let target = self.inner.borrow().now + ms;
        loop {
            let due = {
                let mut inner = self.inner.borrow_mut();
                let idx = inner
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.fire_at <= target)
                    .min_by(|a, b| a.1.fire_at.total_cmp(&b.1.fire_at))
                    .map(|(i, _)| i);
                match idx {
                    Some(i) => {
                        let timer = inner.pending.remove(i);
                        if timer.fire_at > inner.now {
                            inner.now = timer.fire_at;
                        }
                        Some(timer.callback)
                    }
                    None => {
                        inner.now = target;
                        None
                    }
                }
            };
            match due {
                Some(callback) => callback(),
                None => break,
            }
        }
    }
}

impl TimerPort for VirtualTimers {
    type Handle = u64;

    fn set_timeout(&self, delay_ms: u32, f: Box<dyn FnOnce() + 'static>) -> u64 {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let fire_at = inner.now + f64::from(delay_ms);
        inner.pending.push(PendingTimer {
            id,
            fire_at,
            callback: f,
        });
        id
    }

    fn clear_timeout(&self, handle: u64) {
        self.inner.borrow_mut().pending.retain(|t| t.id != handle);
    }

    fn now_ms(&self) -> f64 {
        self.inner.borrow().now
    }
}

// ---------------------------------------------------------------------------
// Channel spies
// ---------------------------------------------------------------------------

/// Records everything posted into the page context.
#[derive(Clone)]
pub struct RecordingPage {
    pub posted: Rc<RefCell<Vec<Envelope>>>,
}

impl RecordingPage {
    pub fn new() -> RecordingPage {
        RecordingPage {
            posted: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl PagePort for RecordingPage {
    fn post(&self, envelope: &Envelope) {
        self.posted.borrow_mut().push(envelope.clone());
    }
}

type ResponseFn = Box<dyn FnOnce(Result<Value, ChannelError>)>;

/// Background channel whose responses are completed by hand, so tests
/// control interleaving and timeouts.
#[derive(Clone)]
pub struct ManualBackground {
    pub sent: Rc<RefCell<Vec<Envelope>>>,
    pending: Rc<RefCell<Vec<ResponseFn>>>,
}

impl ManualBackground {
    pub fn new() -> ManualBackground {
        ManualBackground {
            sent: Rc::new(RefCell::new(Vec::new())),
            pending: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.borrow().len()
    }

    /// Completes the oldest outstanding request.
    pub fn complete_next(&self, result: Result<Value, ChannelError>) {
        let callback = self.pending.borrow_mut().remove(0);
        callback(result);
    }
}

impl BackgroundPort for ManualBackground {
    fn send(&self, envelope: &Envelope, on_response: ResponseFn) {
        self.sent.borrow_mut().push(envelope.clone());
        self.pending.borrow_mut().push(on_response);
    }
}

/// Spy for the widget emit hook: records every envelope a widget posts.
pub fn emit_spy() -> (Rc<RefCell<Vec<Envelope>>>, Rc<dyn Fn(Envelope)>) {
    let seen: Rc<RefCell<Vec<Envelope>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let emit: Rc<dyn Fn(Envelope)> = Rc::new(move |envelope| sink.borrow_mut().push(envelope));
    (seen, emit)
}

/// Cookie store with a fixed jar, answering synchronously.
pub struct FakeCookies {
    jar: Vec<Cookie>,
}

impl FakeCookies {
    pub fn new(jar: Vec<(&str, &str)>) -> FakeCookies {
        FakeCookies {
            jar: jar
                .into_iter()
                .map(|(name, value)| Cookie {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }
}

impl CookiePort for FakeCookies {
    fn cookies_for(&self, _domain: &str, on_done: Box<dyn FnOnce(Vec<Cookie>) + 'static>) {
        on_done(self.jar.clone());
    }
}
