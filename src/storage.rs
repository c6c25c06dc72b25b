/// Records persisted in the extension's key-value store. Pure data and
/// serde shapes; the async get/set plumbing lives in `crate::web`.
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::contracts::storage_keys as keys;

/// User-facing preferences, stored under synced storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefs {
    #[serde(rename = "ts_enabled", default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl Default for Prefs {
    fn default() -> Prefs {
        Prefs { enabled: true }
    }
}

/// Auth session written by the popup login flow. The token fields stay
/// opaque to the injection core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: Value,
    #[serde(rename = "authToken")]
    pub auth_token: String,
    #[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Milliseconds since the epoch.
    #[serde(rename = "tokenExpiry", default, skip_serializing_if = "Option::is_none")]
    pub token_expiry: Option<f64>,
}

impl AuthSession {
    /// Sessions without an expiry never expire locally; the backend is
    /// the authority either way.
    pub fn is_expired(&self, now_ms: f64) -> bool {
        match self.token_expiry {
            Some(expiry) => now_ms >= expiry,
            None => false,
        }
    }
}
