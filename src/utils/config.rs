// Runtime settings of a router, optionally read from a TOML file

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{AppError, Result};

pub const DEFAULT_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_OUTAGE_DELAY_SECS: u64 = 20;

/// Backoff applied between connect attempts refused by the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// `None` retries until the peer starts listening.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 50,
            max_backoff_ms: 1000,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the `attempt`-th refused connect (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    pub fn allows(&self, attempt: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempt < max,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
    pub interval_secs: u64,
    pub outage_delay_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            outage_delay_secs: DEFAULT_OUTAGE_DELAY_SECS,
            retry: RetryPolicy::default(),
        }
    }
}

impl RouterSettings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("Failed to read settings file {}: {}", path.display(), e))
        })?;
        let settings = Self::from_toml(&content)?;
        log::debug!("Settings: {:?}", settings);
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: RouterSettings = toml::from_str(content)?;
        if settings.interval_secs == 0 {
            return Err(AppError::ConfigError("interval_secs must be at least 1".to_string()));
        }
        Ok(settings)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn outage_delay(&self) -> Duration {
        Duration::from_secs(self.outage_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let settings = RouterSettings::from_toml("").unwrap();
        assert_eq!(settings, RouterSettings::default());
        assert_eq!(settings.interval(), Duration::from_secs(5));
        assert_eq!(settings.outage_delay(), Duration::from_secs(20));
        assert_eq!(settings.retry.max_attempts, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = RouterSettings::from_toml(
            "interval_secs = 2\n[retry]\nmax_attempts = 3\n",
        )
        .unwrap();
        assert_eq!(settings.interval_secs, 2);
        assert_eq!(settings.outage_delay_secs, 20);
        assert_eq!(settings.retry.max_attempts, Some(3));
        assert_eq!(settings.retry.initial_backoff_ms, 50);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        assert!(matches!(
            RouterSettings::from_toml("interval_secs = 0"),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        assert!(matches!(
            RouterSettings::from_toml("interval_secs = \"soon\""),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(50));
        assert_eq!(policy.backoff(2), Duration::from_millis(100));
        assert_eq!(policy.backoff(5), Duration::from_millis(800));
        assert_eq!(policy.backoff(6), Duration::from_millis(1000));
        assert_eq!(policy.backoff(1000), Duration::from_millis(1000));
    }

    #[test]
    fn test_attempt_limit() {
        let unbounded = RetryPolicy::default();
        assert!(unbounded.allows(u32::MAX - 1));

        let bounded = RetryPolicy { max_attempts: Some(2), ..RetryPolicy::default() };
        assert!(bounded.allows(1));
        assert!(!bounded.allows(2));
    }
}
