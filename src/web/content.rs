/// Content-script bootstrap: waits for the body, wires the manager /
/// observer / bridge / renderer graph, and answers popup control
/// messages.
use std::rc::Rc;

use serde_json::{Value, json};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::spawn_local;

use crate::bridge::MessagingBridge;
use crate::contracts::{Envelope, RootId, events};
use crate::dom::{DocumentPort, TimerPort};
use crate::nav::NavigationWatcher;
use crate::observer::DomObserver;
use crate::root::RootManager;
use crate::ui::render::WidgetRenderer;
use crate::web::runtime::{self, WebPage, WebRuntime};
use crate::web::{WebDocument, WebTimers};

const BODY_POLL_MS: u32 = 10;

pub fn boot() {
    let Some(doc) = WebDocument::new() else {
        log::error!("content: document unavailable");
        return;
    };
    log::info!("content: script loaded");
    wait_for_body(Rc::new(doc), Rc::new(WebTimers));
}

/// The content script can run before `document.body` exists; retry on a
/// short timer until it does.
fn wait_for_body(doc: Rc<WebDocument>, timers: Rc<WebTimers>) {
    if doc.body().is_some() {
        spawn_local(async move {
            let prefs = runtime::load_prefs().await;
            wire(doc, timers, prefs.enabled);
        });
        return;
    }
    let retry_doc = Rc::clone(&doc);
    let retry_timers = Rc::clone(&timers);
    timers.set_timeout(
        BODY_POLL_MS,
        Box::new(move || wait_for_body(retry_doc, retry_timers)),
    );
}

fn wire(doc: Rc<WebDocument>, timers: Rc<WebTimers>, enabled: bool) {
    let roots = Rc::new(RootManager::new(Rc::clone(&doc)));
    let page = Rc::new(WebPage);
    let bridge = Rc::new(MessagingBridge::new(
        Rc::new(WebRuntime),
        Rc::clone(&page),
        Rc::clone(&timers),
    ));
    install_page_listener(bridge);

    // Widgets post into the page channel; the bridge listener above picks
    // the requests up like any other page message.
    let emit: Rc<dyn Fn(Envelope)> = {
        let page = Rc::clone(&page);
        Rc::new(move |envelope| page.post(&envelope))
    };
    let renderer = WidgetRenderer::new(Rc::clone(&doc), Rc::clone(&roots), emit);
    let observer = DomObserver::new(Rc::clone(&doc), Rc::clone(&timers), RootId::Main.as_str());
    let nav = NavigationWatcher::new(Rc::clone(&doc), Rc::clone(&timers));

    {
        let renderer = renderer.clone();
        observer.on_dom_changed(Box::new(move |change| {
            log::debug!("dom changed: {} mutations", change.mutation_count);
            renderer.render_injected_ui();
            Ok(())
        }));
    }
    {
        // Anchors are stale after in-page navigation; rebuild from scratch.
        let renderer = renderer.clone();
        nav.start(Box::new(move |_url| {
            renderer.reset_navigation_roots();
            renderer.render_injected_ui();
        }));
    }

    if enabled {
        activate(&roots, &observer, &renderer);
    } else {
        log::info!("content: disabled by preference");
    }

    install_runtime_listener(roots, observer, renderer);
}

fn activate(
    roots: &Rc<RootManager<WebDocument>>,
    observer: &DomObserver<WebDocument, WebTimers>,
    renderer: &WidgetRenderer<WebDocument>,
) {
    if roots.init_root(RootId::Main.as_str(), None).is_none() {
        log::error!("content: main root could not be created");
        return;
    }
    renderer.render_injected_ui();
    observer.start(roots);
}

/// Page -> content entry: every window message goes through the bridge.
fn install_page_listener(bridge: Rc<MessagingBridge<WebRuntime, WebPage, WebTimers>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let closure = Closure::<dyn FnMut(web_sys::MessageEvent)>::new(
        move |event: web_sys::MessageEvent| {
            if let Ok(value) = serde_wasm_bindgen::from_value::<Value>(event.data()) {
                bridge.handle_page_message(&value);
            }
        },
    );
    let _ = window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Popup -> content control messages: liveness probe and the UI toggle.
fn install_runtime_listener(
    roots: Rc<RootManager<WebDocument>>,
    observer: DomObserver<WebDocument, WebTimers>,
    renderer: WidgetRenderer<WebDocument>,
) {
    runtime::on_runtime_message(move |value, respond| {
        let Some(envelope) = Envelope::from_value(&value) else {
            return;
        };
        match envelope.kind.as_str() {
            events::TEST => {
                respond(json!({ "success": true, "message": "Content script is working!" }));
            }
            events::TS_TOGGLE => {
                let enabled = envelope
                    .payload
                    .as_ref()
                    .and_then(|payload| payload.get("enabled"))
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                log::info!("toggle: enabled={enabled}");
                if enabled {
                    activate(&roots, &observer, &renderer);
                } else {
                    roots.teardown_all_roots();
                }
                respond(json!({ "success": true }));
            }
            _ => {}
        }
    });
}
