mod file_config;

pub use file_config::{BadgeConfig, FileConfig};

use anyhow::{bail, Result};
use std::time::Duration;

use crate::badge::BadgeOptions;

pub const DEFAULT_API_TIMEOUT_SEC: u64 = 30;
pub const DEFAULT_BADGE_POLL_INTERVAL_SECS: u64 = 60;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub api_timeout_sec: Option<u64>,
    pub badge_poll_interval_secs: Option<u64>,
    pub list_refresh_interval_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub api_timeout_sec: u64,
    pub badge_poll_interval: Duration,
    /// `None` when list auto-refresh is disabled.
    pub list_refresh_interval: Option<Duration>,
    pub badge: BadgeSettings,
}

#[derive(Debug, Clone)]
pub struct BadgeSettings {
    pub auto_update: bool,
}

impl Default for BadgeSettings {
    fn default() -> Self {
        Self { auto_update: true }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let api_base_url = file
            .api_base_url
            .or_else(|| cli.api_base_url.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "api_base_url must be specified via --api-base-url or in config file"
                )
            })?;
        if api_base_url.trim().is_empty() {
            bail!("api_base_url must not be empty");
        }

        let api_token = file.api_token.or_else(|| cli.api_token.clone());

        let api_timeout_sec = file
            .api_timeout_sec
            .or(cli.api_timeout_sec)
            .unwrap_or(DEFAULT_API_TIMEOUT_SEC);
        if api_timeout_sec == 0 {
            bail!("api_timeout_sec must be greater than 0");
        }

        let badge_poll_interval_secs = file
            .badge_poll_interval_secs
            .or(cli.badge_poll_interval_secs)
            .unwrap_or(DEFAULT_BADGE_POLL_INTERVAL_SECS);
        if badge_poll_interval_secs == 0 {
            bail!("badge_poll_interval_secs must be greater than 0");
        }

        let list_refresh_interval = match file
            .list_refresh_interval_secs
            .or(cli.list_refresh_interval_secs)
            .unwrap_or(0)
        {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let badge_file = file.badge.unwrap_or_default();
        let badge = BadgeSettings {
            auto_update: badge_file.auto_update.unwrap_or(true),
        };

        Ok(Self {
            api_base_url,
            api_token,
            api_timeout_sec,
            badge_poll_interval: Duration::from_secs(badge_poll_interval_secs),
            list_refresh_interval,
            badge,
        })
    }

    pub fn badge_options(&self) -> BadgeOptions {
        BadgeOptions {
            poll_interval: self.badge_poll_interval,
            auto_update: self.badge.auto_update,
            external_count: None,
        }
    }
}
