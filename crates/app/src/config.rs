use std::time::Duration;

use reportdesk_client::reconnect::ReconnectConfig;
use reportdesk_client::FeedSettings;

use crate::error::ConfigError;

/// Client configuration loaded from environment variables.
///
/// All fields default to values suitable for a locally running report
/// service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the report service, without trailing slash.
    pub api_base_url: String,
    /// Path of the push hub on the report service.
    pub hub_path: String,
    /// Period of the full-list refresh.
    pub poll_interval: Duration,
    /// Backoff for re-establishing the hub connection.
    pub reconnect: ReconnectConfig,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                            | Default                  |
    /// |------------------------------------|--------------------------|
    /// | `REPORTDESK_API_BASE_URL`          | `https://localhost:7232` |
    /// | `REPORTDESK_HUB_PATH`              | `/reportHub`             |
    /// | `REPORTDESK_POLL_INTERVAL_SECS`    | `5`                      |
    /// | `REPORTDESK_RECONNECT_INITIAL_MS`  | `1000`                   |
    /// | `REPORTDESK_RECONNECT_MAX_SECS`    | `30`                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = lookup("REPORTDESK_API_BASE_URL")
            .unwrap_or_else(|| "https://localhost:7232".into())
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "REPORTDESK_API_BASE_URL",
                value: api_base_url,
                reason: "must start with http:// or https://".into(),
            });
        }

        let hub_path = lookup("REPORTDESK_HUB_PATH").unwrap_or_else(|| "/reportHub".into());

        let poll_secs: u64 = parse_var(&lookup, "REPORTDESK_POLL_INTERVAL_SECS", 5)?;
        if poll_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "REPORTDESK_POLL_INTERVAL_SECS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        let initial_ms: u64 = parse_var(&lookup, "REPORTDESK_RECONNECT_INITIAL_MS", 1000)?;
        if initial_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "REPORTDESK_RECONNECT_INITIAL_MS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        let max_secs: u64 = parse_var(&lookup, "REPORTDESK_RECONNECT_MAX_SECS", 30)?;

        Ok(Self {
            api_base_url,
            hub_path,
            poll_interval: Duration::from_secs(poll_secs),
            reconnect: ReconnectConfig {
                initial_delay: Duration::from_millis(initial_ms),
                max_delay: Duration::from_secs(max_secs).max(Duration::from_millis(initial_ms)),
                ..Default::default()
            },
        })
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            poll_interval: self.poll_interval,
            reconnect: self.reconnect.clone(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            })
        }
    }
}
