/// Stateless request/response matcher for the background context.
///
/// This is explicitly a mock boundary: request payloads are echoed back
/// under the paired result type with a server timestamp, instead of
/// talking to a real backend. Unknown or malformed envelopes get no
/// response at all, which the bridge's error path then absorbs.
use std::cell::Cell;
use std::rc::Rc;

use serde_json::{Map, Value, json};

use crate::contracts::{Envelope, events, result_for};
use crate::dom::TimerPort;

/// Domain whose cookies carry the Piazza session.
pub const PIAZZA_DOMAIN: &str = "piazza.com";

/// Session cookies the backend needs to act on the user's behalf.
pub const REQUIRED_COOKIES: [&str; 5] = [
    "AWSALB",
    "AWSALBCORS",
    "last_piaz_user",
    "piazza_session",
    "session_id",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Async cookie lookup; the browser owns the jar.
pub trait CookiePort {
    fn cookies_for(&self, domain: &str, on_done: Box<dyn FnOnce(Vec<Cookie>) + 'static>);
}

pub struct BackgroundDispatcher<C: CookiePort, T: TimerPort> {
    cookies: Rc<C>,
    timers: Rc<T>,
    preconfirmed: Cell<bool>,
}

impl<C: CookiePort, T: TimerPort> BackgroundDispatcher<C, T> {
    pub fn new(cookies: Rc<C>, timers: Rc<T>) -> BackgroundDispatcher<C, T> {
        BackgroundDispatcher {
            cookies,
            timers,
            preconfirmed: Cell::new(false),
        }
    }

    /// Marks the current session as preconfirmed (set once the popup
    /// login flow has validated the stored auth session).
    pub fn set_preconfirmed(&self, preconfirmed: bool) {
        self.preconfirmed.set(preconfirmed);
    }

    /// Handles one incoming message. `respond` is called at most once,
    /// and not at all for unknown or malformed envelopes.
    pub fn dispatch(&self, value: &Value, respond: Box<dyn FnOnce(Value) + 'static>) {
        let Some(envelope) = Envelope::from_value(value) else {
            return;
        };
        log::debug!("dispatch: {}", envelope.kind);

        match envelope.kind.as_str() {
            events::TEST => {
                respond(json!({ "success": true, "message": "Content script is working!" }));
            }
            events::CHECK_PRECONFIRMED => {
                respond(json!({ "preconfirmed": self.preconfirmed.get() }));
            }
            events::GET_PIAZZA_COOKIE => {
                self.cookies.cookies_for(
                    PIAZZA_DOMAIN,
                    Box::new(move |cookies| respond(piazza_cookie_response(&cookies))),
                );
            }
            _ => {
                if let Some(response) = self.echo_result(&envelope) {
                    respond(response);
                }
            }
        }
    }

    /// Builds the `*_RESULT` envelope for a `REQUEST_*` envelope: the
    /// request payload echoed back, stamped with the server time.
    fn echo_result(&self, envelope: &Envelope) -> Option<Value> {
        let result_type = result_for(&envelope.kind)?;

        let mut payload = match &envelope.payload {
            Some(Value::Object(fields)) => fields.clone(),
            _ => Map::new(),
        };
        payload.insert("echoedAt".to_string(), json!(self.timers.now_ms()));
        match result_type {
            events::SEARCH_RESULT => {
                payload.insert("results".to_string(), json!([]));
            }
            events::DUPLICATE_CHECK_RESULT => {
                payload.insert("duplicates".to_string(), json!([]));
            }
            _ => {}
        }

        Some(json!({ "type": result_type, "payload": payload }))
    }
}

/// Filters the jar down to the required session cookies and formats them
/// as a single cookie string for the API.
fn piazza_cookie_response(cookies: &[Cookie]) -> Value {
    let mut data = Map::new();
    let mut pairs = Vec::new();
    for cookie in cookies {
        if REQUIRED_COOKIES.contains(&cookie.name.as_str()) {
            data.insert(cookie.name.clone(), json!(cookie.value));
            pairs.push(format!("{}={}", cookie.name, cookie.value));
        }
    }
    json!({
        "success": true,
        "cookie": pairs.join(";\n"),
        "cookieData": data,
    })
}
