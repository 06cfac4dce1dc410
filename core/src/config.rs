//! Static client configuration.
//!
//! A `ClientConfig` is assembled once at startup (defaults, a deserialized
//! file, or `from_env`) and moved into `ApiClient`. Nothing reconfigures a
//! running client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_HEALTH_URL: &str = "http://localhost:8000/health";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_CACHE_TTL_MS: u64 = 300_000;
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 256;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Root every endpoint path is appended to.
    pub base_url: String,
    /// Health check lives outside the API prefix.
    pub health_url: String,
    pub timeout_ms: u64,
    pub cache_ttl_ms: u64,
    /// Upper bound on cached responses; 0 disables the bound.
    pub max_cache_entries: usize,
    pub debounce_ms: u64,
    pub messages: ErrorMessages,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            health_url: DEFAULT_HEALTH_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            messages: ErrorMessages::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `ASSISTANT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup("ASSISTANT_API_BASE_URL") {
            config.base_url = url;
        }
        if let Some(url) = lookup("ASSISTANT_HEALTH_URL") {
            config.health_url = url;
        }
        if let Some(ms) = parse_var(&lookup, "ASSISTANT_TIMEOUT_MS")? {
            config.timeout_ms = ms;
        }
        if let Some(ms) = parse_var(&lookup, "ASSISTANT_CACHE_TTL_MS")? {
            config.cache_ttl_ms = ms;
        }
        if let Some(n) = parse_var(&lookup, "ASSISTANT_MAX_CACHE_ENTRIES")? {
            config.max_cache_entries = n;
        }
        if let Some(ms) = parse_var(&lookup, "ASSISTANT_DEBOUNCE_MS")? {
            config.debounce_ms = ms;
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                value: raw,
                reason: e.to_string(),
            }),
    }
}

/// User-facing text for classified errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorMessages {
    pub network: String,
    pub timeout: String,
    pub server: String,
    pub validation: String,
    pub not_found: String,
    pub generic: String,
}

impl Default for ErrorMessages {
    fn default() -> Self {
        Self {
            network: "Unable to connect to the server. Please check your connection.".to_string(),
            timeout: "The request took too long. Please try again.".to_string(),
            server: "Server error. Please try again later.".to_string(),
            validation: "Please check your input and try again.".to_string(),
            not_found: "The requested resource was not found.".to_string(),
            generic: "An unexpected error occurred.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.cache_ttl(), Duration::from_millis(300_000));
        assert_eq!(config.debounce_delay(), Duration::from_millis(300));
        assert_eq!(config.base_url, "http://localhost:8000/api");
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"http://api.local/v1","timeout_ms":5000}"#).unwrap();
        assert_eq!(config.base_url, "http://api.local/v1");
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.cache_ttl_ms, DEFAULT_CACHE_TTL_MS);
        assert_eq!(config.messages, ErrorMessages::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<ClientConfig, _> = serde_json::from_str(r#"{"retries":3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn env_overrides_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ASSISTANT_API_BASE_URL", "http://10.0.0.2:9000/api"),
            ("ASSISTANT_TIMEOUT_MS", "1500"),
            ("ASSISTANT_MAX_CACHE_ENTRIES", "0"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.2:9000/api");
        assert_eq!(config.timeout_ms, 1500);
        assert_eq!(config.max_cache_entries, 0);
        assert_eq!(config.health_url, DEFAULT_HEALTH_URL);
    }

    #[test]
    fn env_rejects_non_numeric_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[("ASSISTANT_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "ASSISTANT_TIMEOUT_MS",
                ..
            }
        ));
    }
}
