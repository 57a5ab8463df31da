//! Configuration for settlement polling

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settlement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Poller configuration
    pub poller: PollerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "settlement".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            poller: PollerConfig::default(),
        }
    }
}

/// Status poller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Delay between status fetches (milliseconds)
    pub interval_ms: u64,

    /// Give up after this long (milliseconds)
    pub deadline_ms: u64,

    /// Treat `NotFound` as "not indexed yet" and keep polling
    pub retry_not_found: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,  // 5 seconds
            deadline_ms: 60_000, // 1 minute
            retry_not_found: false,
        }
    }
}

impl PollerConfig {
    /// Delay between status fetches
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Overall deadline
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Reject unusable values
    pub fn validate(&self) -> crate::Result<()> {
        if self.interval_ms == 0 {
            return Err(crate::Error::Config("interval_ms must be positive".to_string()));
        }
        if self.deadline_ms < self.interval_ms {
            return Err(crate::Error::Config(format!(
                "deadline_ms ({}) is shorter than interval_ms ({})",
                self.deadline_ms, self.interval_ms
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.poller.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(value) = std::env::var("SETTLEMENT_POLL_INTERVAL_MS") {
            config.poller.interval_ms = parse_env("SETTLEMENT_POLL_INTERVAL_MS", &value)?;
        }

        if let Ok(value) = std::env::var("SETTLEMENT_POLL_DEADLINE_MS") {
            config.poller.deadline_ms = parse_env("SETTLEMENT_POLL_DEADLINE_MS", &value)?;
        }

        if let Ok(value) = std::env::var("SETTLEMENT_RETRY_NOT_FOUND") {
            config.poller.retry_not_found = parse_env("SETTLEMENT_RETRY_NOT_FOUND", &value)?;
        }

        config.poller.validate()?;
        Ok(config)
    }
}

fn parse_env<T>(name: &str, value: &str) -> crate::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| crate::Error::Config(format!("{}='{}': {}", name, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "settlement");
        assert_eq!(config.poller.interval(), Duration::from_secs(5));
        assert_eq!(config.poller.deadline(), Duration::from_secs(60));
        assert!(!config.poller.retry_not_found);
        assert!(config.poller.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml(
            r#"
            [poller]
            interval_ms = 1000
            retry_not_found = true
            "#,
        )
        .unwrap();
        assert_eq!(config.poller.interval_ms, 1000);
        assert_eq!(config.poller.deadline_ms, 60_000);
        assert!(config.poller.retry_not_found);
    }

    #[test]
    fn test_invalid_poller_config() {
        assert!(Config::from_toml("[poller]\ninterval_ms = 0").is_err());
        assert!(Config::from_toml("[poller]\ninterval_ms = 10\ndeadline_ms = 5").is_err());
    }

    #[test]
    fn test_parse_env_value() {
        assert_eq!(parse_env::<u64>("X", "250").unwrap(), 250);
        assert!(parse_env::<bool>("X", "maybe").is_err());
    }
}
