/// Relay between the page context and the extension's background context.
///
/// The page posts request envelopes into its generic message channel; the
/// bridge validates them, forwards them over the background channel and
/// re-broadcasts whatever comes back. Every failure mode (malformed
/// input, no responder, malformed response, timeout) degrades to a
/// silent drop: the page never sees an error.
use std::cell::Cell;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use crate::contracts::{Envelope, TS_NS};
use crate::dom::TimerPort;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChannelError {
    #[error("no responder on the background channel")]
    NoResponder,
    #[error("channel failure: {0}")]
    Channel(String),
    #[error("timed out waiting for the background response")]
    Timeout,
}

/// Cross-context call into the background. The channel guarantees
/// single-response semantics: `on_response` is invoked exactly once.
pub trait BackgroundPort {
    fn send(
        &self,
        envelope: &Envelope,
        on_response: Box<dyn FnOnce(Result<Value, ChannelError>)>,
    );
}

/// Broadcast back into the page context.
pub trait PagePort {
    fn post(&self, envelope: &Envelope);
}

pub struct MessagingBridge<B: BackgroundPort, P: PagePort, T: TimerPort> {
    background: Rc<B>,
    page: Rc<P>,
    timers: Rc<T>,
    /// When set, a request whose response has not arrived within the
    /// window is dropped. `None` leaves the continuation pending until
    /// the channel itself errors.
    timeout_ms: Option<u32>,
}

impl<B, P, T> MessagingBridge<B, P, T>
where
    B: BackgroundPort,
    P: PagePort + 'static,
    T: TimerPort,
{
    pub fn new(background: Rc<B>, page: Rc<P>, timers: Rc<T>) -> MessagingBridge<B, P, T> {
        MessagingBridge {
            background,
            page,
            timers,
            timeout_ms: None,
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u32) -> MessagingBridge<B, P, T> {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Entry point for raw page messages. Anything that is not a
    /// namespace-tagged `REQUEST_*` envelope is discarded silently.
    pub fn handle_page_message(&self, value: &Value) {
        let Some(envelope) = Envelope::from_value(value) else {
            return;
        };
        if !envelope.is_request() {
            return;
        }
        self.forward(envelope);
    }

    fn forward(&self, envelope: Envelope) {
        log::debug!("bridge: forward {}", envelope.kind);

        // Response and timeout race; the latch makes the loser a no-op,
        // so at most one outcome is acted on per request.
        let settled = Rc::new(Cell::new(false));

        if let Some(timeout_ms) = self.timeout_ms {
            let settled = Rc::clone(&settled);
            let kind = envelope.kind.clone();
            self.timers.set_timeout(
                timeout_ms,
                Box::new(move || {
                    if settled.replace(true) {
                        return;
                    }
                    log::debug!("bridge: {kind}: {}", ChannelError::Timeout);
                }),
            );
        }

        let page = Rc::clone(&self.page);
        self.background.send(
            &envelope,
            Box::new(move |result| {
                if settled.replace(true) {
                    return;
                }
                match result {
                    Ok(value) => match response_envelope(&value) {
                        Some(response) => {
                            log::debug!("bridge: post back {}", response.kind);
                            page.post(&response);
                        }
                        None => log::debug!("bridge: dropped malformed response"),
                    },
                    Err(err) => log::debug!("bridge: {err}"),
                }
            }),
        );
    }
}

/// Background responses carry no namespace tag; accept any object with a
/// string `type` and re-attach the tag before posting back to the page.
fn response_envelope(value: &Value) -> Option<Envelope> {
    let obj = value.as_object()?;
    let kind = obj.get("type")?.as_str()?;
    Some(Envelope {
        source: TS_NS.to_string(),
        kind: kind.to_string(),
        payload: obj.get("payload").cloned(),
    })
}
