//! Provider configuration sourced from process environment variables.

use std::time::Duration;

/// Model used when `NOTE_WEAVER_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Endpoint used when `NOTE_WEAVER_ENDPOINT` is not set.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const API_KEY_VAR: &str = "NOTE_WEAVER_API_KEY";
pub const ORG_ID_VAR: &str = "NOTE_WEAVER_ORG_ID";
pub const PROJECT_ID_VAR: &str = "NOTE_WEAVER_PROJECT_ID";
pub const MODEL_VAR: &str = "NOTE_WEAVER_MODEL";
pub const ENDPOINT_VAR: &str = "NOTE_WEAVER_ENDPOINT";

/// Runtime configuration for the completion provider.
///
/// Built once at startup and passed explicitly to the synthesizer; there is
/// no process-global configuration state. `reload` re-reads the environment
/// in place.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub organization: Option<String>,
    pub project: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// Blank or whitespace-only values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key).and_then(|value| {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
        };

        Self {
            api_key: get(API_KEY_VAR),
            organization: get(ORG_ID_VAR),
            project: get(PROJECT_ID_VAR),
            model: get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            endpoint: get(ENDPOINT_VAR).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Re-read the process environment into this config.
    pub fn reload(&mut self) {
        *self = Self::from_env();
    }

    /// Whether a usable API key is present.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// API key reduced to a short suffix for display.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_ref().map(|key| {
            if key.len() <= 4 {
                "****".to_string()
            } else {
                format!("****{}", &key[key.len() - 4..])
            }
        })
    }
}
