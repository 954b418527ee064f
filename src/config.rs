//! Harness configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::lifecycle::TeardownPolicy;
use crate::model::Credentials;

pub const API_URL: &str = "PORTAL_API_URL";
pub const USERNAME: &str = "PORTAL_USERNAME";
pub const PASSWORD: &str = "PORTAL_PASSWORD";
pub const MANAGER_IDS: &str = "PORTAL_MANAGER_IDS";
pub const REQUEST_TIMEOUT_MS: &str = "PORTAL_REQUEST_TIMEOUT_MS";
pub const STRICT_TEARDOWN: &str = "PORTAL_STRICT_TEARDOWN";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Everything needed to run against a portal instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Base URL, e.g. `https://portal.example.com`
    pub api_url: String,

    /// Admin account used for fixtures and teardown
    pub credentials: Credentials,

    /// Managers that orders may be assigned to
    pub manager_ids: Vec<String>,

    pub request_timeout_ms: u64,

    /// Surface teardown failures instead of only logging them
    pub strict_teardown: bool,
}

impl HarnessConfig {
    /// Reads the `PORTAL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, so callers can supply any source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let manager_ids = match lookup(MANAGER_IDS) {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| ConfigError::Invalid {
                key: MANAGER_IDS,
                reason: e.to_string(),
            })?,
            None => Vec::new(),
        };

        let request_timeout_ms = match lookup(REQUEST_TIMEOUT_MS) {
            Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    key: REQUEST_TIMEOUT_MS,
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_TIMEOUT_MS,
        };

        let strict_teardown = match lookup(STRICT_TEARDOWN).as_deref().map(str::trim) {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: STRICT_TEARDOWN,
                    reason: format!("expected true or false, got {other:?}"),
                })
            }
        };

        Ok(Self {
            api_url: required(API_URL)?,
            credentials: Credentials::new(required(USERNAME)?, required(PASSWORD)?),
            manager_ids,
            request_timeout_ms,
            strict_teardown,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn teardown_policy(&self) -> TeardownPolicy {
        if self.strict_teardown {
            TeardownPolicy::Strict
        } else {
            TeardownPolicy::Lenient
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_to_optional_settings() {
        let config = HarnessConfig::from_lookup(lookup(&[
            (API_URL, "http://localhost:8686"),
            (USERNAME, "admin"),
            (PASSWORD, "secret"),
        ]))
        .unwrap();

        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.manager_ids.is_empty());
        assert_eq!(config.teardown_policy(), TeardownPolicy::Lenient);
    }

    #[test]
    fn parses_optional_settings() {
        let config = HarnessConfig::from_lookup(lookup(&[
            (API_URL, "http://localhost:8686"),
            (USERNAME, "admin"),
            (PASSWORD, "secret"),
            (MANAGER_IDS, r#"["m1", "m2"]"#),
            (REQUEST_TIMEOUT_MS, "500"),
            (STRICT_TEARDOWN, "true"),
        ]))
        .unwrap();

        assert_eq!(config.manager_ids, vec!["m1", "m2"]);
        assert_eq!(config.request_timeout_ms, 500);
        assert_eq!(config.teardown_policy(), TeardownPolicy::Strict);
    }

    #[test]
    fn reports_missing_and_invalid_values() {
        let missing = HarnessConfig::from_lookup(lookup(&[(API_URL, "http://x")]));
        assert_eq!(missing, Err(ConfigError::Missing(USERNAME)));

        let invalid = HarnessConfig::from_lookup(lookup(&[
            (API_URL, "http://x"),
            (USERNAME, "admin"),
            (PASSWORD, "secret"),
            (REQUEST_TIMEOUT_MS, "soon"),
        ]));
        assert!(matches!(
            invalid,
            Err(ConfigError::Invalid { key: REQUEST_TIMEOUT_MS, .. })
        ));
    }
}
