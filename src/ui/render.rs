/// Mounts widgets into roots owned by the `RootManager`.
///
/// Every render call is idempotent: once a root carries the widget's
/// marker class, re-invocation returns without touching the DOM. Callers
/// re-render freely on every observer notification and after in-page
/// navigation.
use std::cell::RefCell;
use std::rc::Rc;

use crate::contracts::{Envelope, RootId, markers};
use crate::dom::DocumentPort;
use crate::root::RootManager;
use crate::ui::{styles, widgets};

/// Host-page elements the widgets attach next to.
pub mod anchors {
    pub const SEARCH_BAR: &str = "#feed_search_bar";
    pub const RESPONSE_CARD: &str = "#questionText";
    pub const COMPOSER: &str = "#answer_box";
}

pub struct WidgetRenderer<D: DocumentPort> {
    doc: Rc<D>,
    roots: Rc<RootManager<D>>,
    emit: Rc<dyn Fn(Envelope)>,
}

impl<D: DocumentPort> Clone for WidgetRenderer<D> {
    fn clone(&self) -> Self {
        WidgetRenderer {
            doc: Rc::clone(&self.doc),
            roots: Rc::clone(&self.roots),
            emit: Rc::clone(&self.emit),
        }
    }
}

impl<D: DocumentPort + 'static> WidgetRenderer<D> {
    pub fn new(
        doc: Rc<D>,
        roots: Rc<RootManager<D>>,
        emit: Rc<dyn Fn(Envelope)>,
    ) -> WidgetRenderer<D> {
        WidgetRenderer { doc, roots, emit }
    }

    pub fn render_search_bar(&self) {
        self.when_anchor_ready(
            anchors::SEARCH_BAR,
            Box::new(|renderer| renderer.mount_search_bar()),
        );
    }

    pub fn render_response_card(&self, summary: Option<&str>) {
        let summary = summary.unwrap_or(widgets::DEFAULT_SUMMARY).to_string();
        self.when_anchor_ready(
            anchors::RESPONSE_CARD,
            Box::new(move |renderer| renderer.mount_response_card(&summary)),
        );
    }

    pub fn render_composer(&self) {
        self.when_anchor_ready(
            anchors::COMPOSER,
            Box::new(|renderer| renderer.mount_composer()),
        );
    }

    /// Renders everything; safe to call repeatedly thanks to the marker
    /// classes.
    pub fn render_injected_ui(&self) {
        self.render_search_bar();
        self.render_response_card(None);
        self.render_composer();
    }

    /// Tears down the roots anchored to elements that do not survive
    /// in-page navigation; callers re-render afterwards.
    pub fn reset_navigation_roots(&self) {
        for root_id in [RootId::SearchBar, RootId::ResponseCard, RootId::Composer] {
            self.roots.teardown_root_by_id(root_id.as_str());
        }
    }

    /// Runs `then` once the anchor exists: immediately when it is already
    /// in the document, otherwise via a one-shot mutation watch.
    fn when_anchor_ready(&self, selector: &str, then: Box<dyn FnOnce(&WidgetRenderer<D>)>) {
        if self.doc.query_selector(selector).is_some() {
            then(self);
            return;
        }

        let renderer = self.clone();
        let selector_owned = selector.to_string();
        let watch_slot: Rc<RefCell<Option<D::Watch>>> = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&watch_slot);
        let mut then = Some(then);
        let watch = self.doc.watch_mutations(Box::new(move |_| {
            if renderer.doc.query_selector(&selector_owned).is_none() {
                return;
            }
            if let Some(watch) = slot.borrow_mut().take() {
                renderer.doc.unwatch(watch);
            }
            if let Some(then) = then.take() {
                then(&renderer);
            }
        }));
        match watch {
            Some(watch) => *watch_slot.borrow_mut() = Some(watch),
            None => log::error!("anchor wait for '{selector}' failed: body not available"),
        }
    }

    fn mount_search_bar(&self) {
        let Some(root) = self
            .roots
            .init_root(RootId::SearchBar.as_str(), Some(anchors::SEARCH_BAR))
        else {
            log::error!("search bar root could not be created");
            return;
        };
        if self.already_mounted(&root, markers::SEARCHBAR) {
            return;
        }

        let wrapper = self.scoped_wrapper(markers::SEARCHBAR, styles::SEARCH_BAR);
        let bar = widgets::search_bar(&self.doc, Rc::clone(&self.emit));
        self.doc.append_child(&wrapper, &bar);
        self.doc.append_child(&root, &wrapper);
        log::info!("search bar rendered");
    }

    fn mount_response_card(&self, summary: &str) {
        let Some(root) = self
            .roots
            .init_root(RootId::ResponseCard.as_str(), Some(anchors::RESPONSE_CARD))
        else {
            log::error!("response card root could not be created");
            return;
        };
        if self.already_mounted(&root, markers::RESPONSE_CARD) {
            return;
        }

        let wrapper = self.scoped_wrapper("ts-response-card-container", styles::RESPONSE_CARD);
        let card = widgets::response_card(&self.doc, summary);
        self.doc.append_child(&wrapper, &card);
        self.doc.append_child(&root, &wrapper);
        log::info!("response card rendered");
    }

    fn mount_composer(&self) {
        let Some(root) = self
            .roots
            .init_root(RootId::Composer.as_str(), Some(anchors::COMPOSER))
        else {
            log::error!("composer root could not be created");
            return;
        };
        if self.already_mounted(&root, markers::COMPOSER) {
            return;
        }

        let wrapper = self.scoped_wrapper("ts-composer-container", styles::COMPOSER);
        let area = widgets::composer_area(&self.doc, Rc::clone(&self.emit));
        self.doc.append_child(&wrapper, &area);
        self.doc.append_child(&root, &wrapper);
        log::info!("composer helpers rendered");
    }

    fn already_mounted(&self, root: &D::Node, marker: &str) -> bool {
        self.doc.find_in(root, &format!(".{marker}")).is_some()
    }

    fn scoped_wrapper(&self, class: &str, css: &str) -> D::Node {
        let wrapper = self.doc.create_element("div");
        self.doc.add_class(&wrapper, class);
        let style = self.doc.create_element("style");
        self.doc.set_text(&style, css);
        self.doc.append_child(&wrapper, &style);
        wrapper
    }
}
