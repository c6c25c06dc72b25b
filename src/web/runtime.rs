/// Chrome API plumbing: the extension messaging channel, the cookie jar
/// and synced storage, bridged through a small JS module the same way
/// the popup talks to `chrome.tabs`.
use serde::Deserialize;
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::bridge::{BackgroundPort, ChannelError, PagePort};
use crate::contracts::Envelope;
use crate::dispatch::{Cookie, CookiePort};
use crate::storage::{Prefs, keys};

#[wasm_bindgen(module = "/js/runtime.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn sendRuntimeMessage(message: JsValue) -> Result<JsValue, JsValue>;

    fn onRuntimeMessage(handler: &js_sys::Function);

    #[wasm_bindgen(catch)]
    async fn getCookies(domain: String) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getSyncStorage(key: String) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setSyncStorage(key: String, value: JsValue) -> Result<(), JsValue>;
}

/// `BackgroundPort` over `chrome.runtime.sendMessage`.
pub struct WebRuntime;

impl BackgroundPort for WebRuntime {
    fn send(
        &self,
        envelope: &Envelope,
        on_response: Box<dyn FnOnce(Result<Value, ChannelError>)>,
    ) {
        let message = match serde_wasm_bindgen::to_value(envelope) {
            Ok(message) => message,
            Err(err) => {
                on_response(Err(ChannelError::Channel(format!("serialize: {err}"))));
                return;
            }
        };
        spawn_local(async move {
            match sendRuntimeMessage(message).await {
                Ok(value) if value.is_undefined() || value.is_null() => {
                    on_response(Err(ChannelError::NoResponder));
                }
                Ok(value) => match serde_wasm_bindgen::from_value::<Value>(value) {
                    Ok(response) => on_response(Ok(response)),
                    Err(err) => on_response(Err(ChannelError::Channel(format!("decode: {err}")))),
                },
                Err(err) => on_response(Err(ChannelError::Channel(format!("{err:?}")))),
            }
        });
    }
}

/// `PagePort` over `window.postMessage`.
pub struct WebPage;

impl PagePort for WebPage {
    fn post(&self, envelope: &Envelope) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Ok(message) = serde_wasm_bindgen::to_value(envelope) {
            let _ = window.post_message(&message, "*");
        }
    }
}

/// `CookiePort` over `chrome.cookies.getAll`.
pub struct WebCookies;

/// Browser cookie objects carry more fields; only these matter here.
#[derive(Deserialize)]
struct BrowserCookie {
    name: String,
    value: String,
}

impl CookiePort for WebCookies {
    fn cookies_for(&self, domain: &str, on_done: Box<dyn FnOnce(Vec<Cookie>) + 'static>) {
        let domain = domain.to_string();
        spawn_local(async move {
            let jar = match getCookies(domain).await {
                Ok(value) => {
                    serde_wasm_bindgen::from_value::<Vec<BrowserCookie>>(value).unwrap_or_default()
                }
                Err(err) => {
                    log::warn!("cookie lookup failed: {err:?}");
                    Vec::new()
                }
            };
            on_done(
                jar.into_iter()
                    .map(|cookie| Cookie {
                        name: cookie.name,
                        value: cookie.value,
                    })
                    .collect(),
            );
        });
    }
}

/// Subscribes `handler` to `chrome.runtime.onMessage`. The handler gets
/// the raw message and a single-use responder.
pub fn on_runtime_message(mut handler: impl FnMut(Value, Box<dyn FnOnce(Value)>) + 'static) {
    let closure = Closure::<dyn FnMut(JsValue, js_sys::Function)>::new(
        move |message: JsValue, send_response: js_sys::Function| {
            let value =
                serde_wasm_bindgen::from_value::<Value>(message).unwrap_or(Value::Null);
            let respond: Box<dyn FnOnce(Value)> = Box::new(move |response| {
                if let Ok(response) = serde_wasm_bindgen::to_value(&response) {
                    let _ = send_response.call1(&JsValue::NULL, &response);
                }
            });
            handler(value, respond);
        },
    );
    onRuntimeMessage(closure.as_ref().unchecked_ref());
    closure.forget();
}

pub async fn load_prefs() -> Prefs {
    match getSyncStorage(keys::ENABLED.to_string()).await {
        Ok(value) => match value.as_bool() {
            Some(enabled) => Prefs { enabled },
            None => Prefs::default(),
        },
        Err(err) => {
            log::warn!("preference load failed: {err:?}");
            Prefs::default()
        }
    }
}

pub async fn save_prefs(prefs: &Prefs) {
    if let Err(err) =
        setSyncStorage(keys::ENABLED.to_string(), JsValue::from_bool(prefs.enabled)).await
    {
        log::warn!("preference save failed: {err:?}");
    }
}
