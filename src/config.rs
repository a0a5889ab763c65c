// Client configuration and initialization errors

use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    // Lifetime of the identity entries written on login
    pub session_ttl_days: i64,
    // Where client storage is mirrored; None keeps it in memory only
    pub storage_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
            storage_path: None,
        }
    }
}

impl ClientConfig {
    /// Builds a configuration from `STAYJ_*` environment variables, falling
    /// back to the defaults for anything unset.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("STAYJ_API_URL") {
            config.base_url = url;
        }
        if let Some(raw) = lookup("STAYJ_TIMEOUT_MS") {
            config.timeout_ms = raw.trim().parse().map_err(|_| {
                ClientError::ConfigError(format!("STAYJ_TIMEOUT_MS is not a number: {}", raw))
            })?;
        }
        if let Some(raw) = lookup("STAYJ_SESSION_TTL_DAYS") {
            config.session_ttl_days = raw.trim().parse().map_err(|_| {
                ClientError::ConfigError(format!(
                    "STAYJ_SESSION_TTL_DAYS is not a number: {}",
                    raw
                ))
            })?;
        }
        if let Some(path) = lookup("STAYJ_STORAGE_PATH").filter(|p| !p.trim().is_empty()) {
            config.storage_path = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(ClientError::ConfigError("base_url is empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::ConfigError(format!(
                "base_url must be http(s): {}",
                url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ClientError::ConfigError(
                "timeout_ms must be positive".to_string(),
            ));
        }
        if self.session_ttl_days <= 0 {
            return Err(ClientError::ConfigError(
                "session_ttl_days must be positive".to_string(),
            ));
        }
        if self.session_ttl_days > MAX_SESSION_TTL_DAYS {
            return Err(ClientError::ConfigError(format!(
                "session_ttl_days must be at most {}",
                MAX_SESSION_TTL_DAYS
            )));
        }
        Ok(())
    }

    // Joins the base URL and an endpoint path without doubling slashes
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session_ttl_days, 7);
        assert_eq!(config.storage_path, None);
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("STAYJ_API_URL", "https://api.stayj.test/"),
            ("STAYJ_TIMEOUT_MS", "2500"),
            ("STAYJ_SESSION_TTL_DAYS", "3"),
            ("STAYJ_STORAGE_PATH", "/tmp/stayj.json"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://api.stayj.test/");
        assert_eq!(config.timeout_ms, 2500);
        assert_eq!(config.session_ttl_days, 3);
        assert_eq!(config.storage_path, Some(PathBuf::from("/tmp/stayj.json")));
        assert_eq!(
            config.endpoint("/guesthouse/1"),
            "https://api.stayj.test/guesthouse/1"
        );
    }

    #[test]
    fn test_ttl_bound_is_inclusive() {
        let config = ClientConfig {
            session_ttl_days: MAX_SESSION_TTL_DAYS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let result = ClientConfig::from_lookup(lookup_from(&[(
            "STAYJ_SESSION_TTL_DAYS",
            "1000000000",
        )]));
        assert!(matches!(result, Err(ClientError::ConfigError(_))));
    }

    #[test]
    fn test_unparsable_timeout_is_rejected() {
        let result = ClientConfig::from_lookup(lookup_from(&[("STAYJ_TIMEOUT_MS", "soon")]));
        assert!(matches!(result, Err(ClientError::ConfigError(_))));
    }

    #[test_case("", 1000, 7; "#1 empty url")]
    #[test_case("ftp://host", 1000, 7; "#2 wrong scheme")]
    #[test_case("http://host", 0, 7; "#3 zero timeout")]
    #[test_case("http://host", 1000, 0; "#4 zero ttl")]
    #[test_case("http://host", 1000, 3651; "#5 ttl past ten years")]
    #[test_case("http://host", 1000, 1_000_000_000; "#6 ttl that overflows the clock")]
    fn test_invalid_config(base_url: &str, timeout_ms: u64, session_ttl_days: i64) {
        let config = ClientConfig {
            base_url: base_url.to_string(),
            timeout_ms,
            session_ttl_days,
            storage_path: None,
        };
        assert!(matches!(
            config.validate(),
            Err(ClientError::ConfigError(_))
        ));
    }
}
