/// Environment configuration for the extension. Values are baked in at
/// build time; the defaults match the local development backend.
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Backend endpoints consumed by the popup flows.
pub mod endpoints {
    pub const LOGIN: &str = "auth/login";
    pub const SIGNUP: &str = "auth/signup";
    pub const LLM_QUERY: &str = "llm/query";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    pub version: String,
    pub env: Environment,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            env: Environment::Development,
        }
    }
}

impl Config {
    /// Joins `endpoint` onto the API base URL.
    pub fn api_url(&self, endpoint: &str) -> Result<String, String> {
        let mut base = self.api_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| format!("bad API base URL: {e}"))?;
        let joined = base
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| format!("bad endpoint '{endpoint}': {e}"))?;
        Ok(joined.to_string())
    }

    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }

    pub fn is_production(&self) -> bool {
        self.env == Environment::Production
    }
}
