use crate::commands::auth::AuthPolicy;
use crate::commands::hierarchy::FetchStrategy;
use crate::error::{Result, StickyError};
use crate::source::joplin::DEFAULT_API_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";

pub const CONFIG_KEYS: &[&str] = &[
    "api-url",
    "timeout-secs",
    "auth-attempts",
    "auth-interval-ms",
    "fetch-workers",
];

/// Configuration for joplin-sticky, stored in `<data dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StickyConfig {
    /// Base URL of the Joplin web clipper service
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Timeout for a single request to Joplin
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How often to ask whether the authorization was accepted
    #[serde(default = "default_auth_attempts")]
    pub auth_attempts: u32,

    #[serde(default = "default_auth_interval_ms")]
    pub auth_interval_ms: u64,

    /// Concurrent note listings while building the hierarchy (1 = one at a time)
    #[serde(default = "default_fetch_workers")]
    pub fetch_workers: usize,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_auth_attempts() -> u32 {
    60
}

fn default_auth_interval_ms() -> u64 {
    1000
}

fn default_fetch_workers() -> usize {
    1
}

impl Default for StickyConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            auth_attempts: default_auth_attempts(),
            auth_interval_ms: default_auth_interval_ms(),
            fetch_workers: default_fetch_workers(),
        }
    }
}

impl StickyConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: StickyConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        fs::create_dir_all(config_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "api-url" => Some(self.api_url.clone()),
            "timeout-secs" => Some(self.timeout_secs.to_string()),
            "auth-attempts" => Some(self.auth_attempts.to_string()),
            "auth-interval-ms" => Some(self.auth_interval_ms.to_string()),
            "fetch-workers" => Some(self.fetch_workers.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api-url" => {
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    return Err(StickyError::Config(format!(
                        "api-url must start with http:// or https://, got '{}'",
                        value
                    )));
                }
                self.api_url = value.trim_end_matches('/').to_string();
            }
            "timeout-secs" => self.timeout_secs = parse_positive(key, value)?,
            "auth-attempts" => self.auth_attempts = parse_positive(key, value)?,
            "auth-interval-ms" => self.auth_interval_ms = parse_number(key, value)?,
            "fetch-workers" => self.fetch_workers = parse_positive(key, value)?,
            other => {
                return Err(StickyError::Config(format!(
                    "Unknown config key: {}",
                    other
                )))
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn auth_policy(&self) -> AuthPolicy {
        AuthPolicy {
            attempts: self.auth_attempts,
            interval: Duration::from_millis(self.auth_interval_ms),
        }
    }

    pub fn fetch_strategy(&self) -> FetchStrategy {
        FetchStrategy::from_workers(self.fetch_workers)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| StickyError::Config(format!("{} expects a number, got '{}'", key, value)))
}

fn parse_positive<T: std::str::FromStr + Default + PartialEq>(key: &str, value: &str) -> Result<T> {
    let parsed: T = parse_number(key, value)?;
    if parsed == T::default() {
        return Err(StickyError::Config(format!("{} must be greater than zero", key)));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StickyConfig::default();
        assert_eq!(config.api_url, "http://localhost:41184");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.fetch_strategy(), FetchStrategy::Sequential);
        assert_eq!(config.auth_policy(), AuthPolicy::default());
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = StickyConfig::load(dir.path()).unwrap();
        assert_eq!(config, StickyConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StickyConfig::default();
        config.set("api-url", "http://127.0.0.1:9999/").unwrap();
        config.set("fetch-workers", "4").unwrap();
        config.save(dir.path()).unwrap();

        let loaded = StickyConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.api_url, "http://127.0.0.1:9999");
        assert_eq!(loaded.fetch_strategy(), FetchStrategy::Parallel { workers: 4 });
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), r#"{"timeout_secs": 2}"#).unwrap();
        let config = StickyConfig::load(dir.path()).unwrap();
        assert_eq!(config.timeout_secs, 2);
        assert_eq!(config.auth_attempts, 60);
    }

    #[test]
    fn test_get_every_key() {
        let config = StickyConfig::default();
        for key in CONFIG_KEYS {
            assert!(config.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(config.get("nope"), None);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = StickyConfig::default();
        assert!(config.set("api-url", "localhost:41184").is_err());
        assert!(config.set("timeout-secs", "soon").is_err());
        assert!(config.set("fetch-workers", "0").is_err());
        assert!(config.set("colour", "blue").is_err());
        assert_eq!(config, StickyConfig::default());
    }
}
