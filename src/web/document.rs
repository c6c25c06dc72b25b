/// `DocumentPort` over the real DOM via web-sys.
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, DocumentFragment, Element, HtmlInputElement, MutationObserver, MutationObserverInit,
    ShadowRootInit, ShadowRootMode,
};

use crate::dom::DocumentPort;

pub struct WebDocument {
    document: Document,
}

/// Keeps the observer and its callback alive for the watch's lifetime.
pub struct WebWatch {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

impl WebDocument {
    pub fn new() -> Option<WebDocument> {
        let document = web_sys::window()?.document()?;
        Some(WebDocument { document })
    }
}

fn as_element(node: &web_sys::Node) -> Option<&Element> {
    node.dyn_ref::<Element>()
}

impl DocumentPort for WebDocument {
    type Node = web_sys::Node;
    type Watch = WebWatch;

    fn body(&self) -> Option<web_sys::Node> {
        self.document.body().map(web_sys::Node::from)
    }

    fn element_by_id(&self, id: &str) -> Option<web_sys::Node> {
        self.document.get_element_by_id(id).map(web_sys::Node::from)
    }

    fn query_selector(&self, selector: &str) -> Option<web_sys::Node> {
        self.document
            .query_selector(selector)
            .ok()
            .flatten()
            .map(web_sys::Node::from)
    }

    fn create_element(&self, tag: &str) -> web_sys::Node {
        self.document
            .create_element(tag)
            .unwrap_throw()
            .into()
    }

    fn set_id(&self, node: &web_sys::Node, id: &str) {
        if let Some(element) = as_element(node) {
            element.set_id(id);
        }
    }

    fn add_class(&self, node: &web_sys::Node, class: &str) {
        if let Some(element) = as_element(node) {
            let _ = element.class_list().add_1(class);
        }
    }

    fn set_attr(&self, node: &web_sys::Node, name: &str, value: &str) {
        if let Some(element) = as_element(node) {
            let _ = element.set_attribute(name, value);
        }
    }

    fn set_text(&self, node: &web_sys::Node, text: &str) {
        node.set_text_content(Some(text));
    }

    fn append_child(&self, parent: &web_sys::Node, child: &web_sys::Node) {
        let _ = parent.append_child(child);
    }

    fn insert_after(&self, reference: &web_sys::Node, node: &web_sys::Node) -> bool {
        let Some(parent) = reference.parent_node() else {
            return false;
        };
        parent
            .insert_before(node, reference.next_sibling().as_ref())
            .is_ok()
    }

    fn remove(&self, node: &web_sys::Node) {
        if let Some(element) = as_element(node) {
            element.remove();
        } else if let Some(parent) = node.parent_node() {
            let _ = parent.remove_child(node);
        }
    }

    fn isolated_root(&self, host: &web_sys::Node) -> web_sys::Node {
        let Some(element) = as_element(host) else {
            return host.clone();
        };
        if let Some(shadow) = element.shadow_root() {
            return shadow.into();
        }
        match element.attach_shadow(&ShadowRootInit::new(ShadowRootMode::Open)) {
            Ok(shadow) => shadow.into(),
            Err(_) => {
                log::warn!("shadow attach failed; mounting without isolation");
                host.clone()
            }
        }
    }

    fn existing_isolated_root(&self, host: &web_sys::Node) -> Option<web_sys::Node> {
        as_element(host)?.shadow_root().map(web_sys::Node::from)
    }

    fn find_in(&self, scope: &web_sys::Node, selector: &str) -> Option<web_sys::Node> {
        if let Some(element) = scope.dyn_ref::<Element>() {
            return element
                .query_selector(selector)
                .ok()
                .flatten()
                .map(web_sys::Node::from);
        }
        scope
            .dyn_ref::<DocumentFragment>()?
            .query_selector(selector)
            .ok()
            .flatten()
            .map(web_sys::Node::from)
    }

    fn on_click(&self, node: &web_sys::Node, handler: Box<dyn Fn() + 'static>) {
        let closure = Closure::<dyn FnMut()>::new(move || handler());
        let _ = node.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        // The handler lives as long as the injected widget.
        closure.forget();
    }

    fn input_value(&self, node: &web_sys::Node) -> String {
        node.dyn_ref::<HtmlInputElement>()
            .map(|input| input.value())
            .unwrap_or_default()
    }

    fn watch_mutations(
        &self,
        mut on_batch: Box<dyn FnMut(usize) + 'static>,
    ) -> Option<WebWatch> {
        let body = self.document.body()?;

        let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                on_batch(records.length() as usize);
            },
        );
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref()).ok()?;

        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer.observe_with_options(&body, &options).ok()?;

        Some(WebWatch {
            observer,
            _callback: callback,
        })
    }

    fn unwatch(&self, watch: WebWatch) {
        watch.observer.disconnect();
    }

    fn url(&self) -> String {
        self.document
            .location()
            .and_then(|location| location.href().ok())
            .unwrap_or_default()
    }
}
