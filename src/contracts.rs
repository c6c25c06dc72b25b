/// Shared vocabulary for ThreadSense: event names, DOM identifiers and
/// storage keys used by the page, content and background contexts.
/// Contains no behavior beyond message-shape validation.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Namespace tag carried by every ThreadSense message.
pub const TS_NS: &str = "threadsense";

/// Prefix shared by all page -> background request types.
pub const REQUEST_PREFIX: &str = "REQUEST_";

/// Event types exchanged between the injected UI, the content script and
/// the background context.
pub mod events {
    pub const REQUEST_SEARCH: &str = "REQUEST_SEARCH";
    pub const REQUEST_AI_SUMMARY: &str = "REQUEST_AI_SUMMARY";
    pub const REQUEST_AI_SUGGESTION: &str = "REQUEST_AI_SUGGESTION";
    pub const REQUEST_DUPLICATE_CHECK: &str = "REQUEST_DUPLICATE_CHECK";

    pub const SEARCH_RESULT: &str = "SEARCH_RESULT";
    pub const AI_SUMMARY_RESULT: &str = "AI_SUMMARY_RESULT";
    pub const AI_SUGGESTION_RESULT: &str = "AI_SUGGESTION_RESULT";
    pub const DUPLICATE_CHECK_RESULT: &str = "DUPLICATE_CHECK_RESULT";

    // Extension-internal control messages
    pub const TEST: &str = "TEST";
    pub const TS_TOGGLE: &str = "TS_TOGGLE";
    pub const GET_PIAZZA_COOKIE: &str = "GET_PIAZZA_COOKIE";
    pub const CHECK_PRECONFIRMED: &str = "CHECK_PRECONFIRMED";
}

/// Maps a request type to its result type. Every `REQUEST_*` event has
/// exactly one corresponding result event.
pub fn result_for(request_type: &str) -> Option<&'static str> {
    match request_type {
        events::REQUEST_SEARCH => Some(events::SEARCH_RESULT),
        events::REQUEST_AI_SUMMARY => Some(events::AI_SUMMARY_RESULT),
        events::REQUEST_AI_SUGGESTION => Some(events::AI_SUGGESTION_RESULT),
        events::REQUEST_DUPLICATE_CHECK => Some(events::DUPLICATE_CHECK_RESULT),
        _ => None,
    }
}

/// The recognized mount-point identifiers. `RootManager` rejects anything
/// outside this set to guard against typo'd ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootId {
    /// The always-present container appended to the document body.
    Main,
    /// Hosts the semantic search bar next to the feed search input.
    SearchBar,
    /// Hosts the AI summary card below the visible post.
    ResponseCard,
    /// Hosts the helper buttons in the composer area.
    Composer,
}

impl RootId {
    pub const ALL: [RootId; 4] = [
        RootId::Main,
        RootId::SearchBar,
        RootId::ResponseCard,
        RootId::Composer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RootId::Main => "threadsense-root",
            RootId::SearchBar => "threadsense-searchbar",
            RootId::ResponseCard => "threadsense-response-card",
            RootId::Composer => "threadsense-composer",
        }
    }

    pub fn parse(id: &str) -> Option<RootId> {
        Self::ALL.into_iter().find(|root| root.as_str() == id)
    }
}

/// Marker classes and attributes used to detect already-injected widgets.
pub mod markers {
    pub const SEARCHBAR: &str = "ts-searchbar-container";
    pub const RESPONSE_CARD: &str = "ts-response-card";
    pub const COMPOSER: &str = "ts-composer-area";
    pub const CARD_ATTR: &str = "data-threadsense-card";
}

/// Keys in the extension's key-value store.
pub mod storage_keys {
    /// Whether the ThreadSense UI is active.
    pub const ENABLED: &str = "ts_enabled";
    pub const USER: &str = "user";
    pub const AUTH_TOKEN: &str = "authToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const TOKEN_EXPIRY: &str = "tokenExpiry";
}

/// The tagged message exchanged across execution contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Envelope {
    pub fn new(kind: &str, payload: Option<Value>) -> Envelope {
        Envelope {
            source: TS_NS.to_string(),
            kind: kind.to_string(),
            payload,
        }
    }

    /// Quick check that a raw message belongs to ThreadSense. Anything
    /// missing the namespace tag or a string `type` is rejected.
    pub fn from_value(value: &Value) -> Option<Envelope> {
        let obj = value.as_object()?;
        if obj.get("source")?.as_str()? != TS_NS {
            return None;
        }
        let kind = obj.get("type")?.as_str()?;
        Some(Envelope {
            source: TS_NS.to_string(),
            kind: kind.to_string(),
            payload: obj.get("payload").cloned(),
        })
    }

    pub fn is_request(&self) -> bool {
        self.kind.starts_with(REQUEST_PREFIX)
    }
}
