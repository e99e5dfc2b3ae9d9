use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Remote API (can override CLI)
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub api_timeout_sec: Option<u64>,

    // Timers
    pub badge_poll_interval_secs: Option<u64>,
    /// 0 disables list auto-refresh.
    pub list_refresh_interval_secs: Option<u64>,

    // Feature configs
    pub badge: Option<BadgeConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct BadgeConfig {
    pub auto_update: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_base_url = "https://news.example.com/api"
api_token = "secret"
api_timeout_sec = 10
badge_poll_interval_secs = 120
list_refresh_interval_secs = 300

[badge]
auto_update = false
"#
        )
        .unwrap();

        let config = FileConfig::load(file.path()).unwrap();

        assert_eq!(
            config.api_base_url.as_deref(),
            Some("https://news.example.com/api")
        );
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.api_timeout_sec, Some(10));
        assert_eq!(config.badge_poll_interval_secs, Some(120));
        assert_eq!(config.list_refresh_interval_secs, Some(300));
        assert_eq!(config.badge.unwrap().auto_update, Some(false));
    }

    #[test]
    fn test_load_empty_config() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert!(config.api_base_url.is_none());
        assert!(config.badge.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let result = FileConfig::load(Path::new("/nonexistent/notifications.toml"));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to read config file"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_timeout_sec = \"soon\"").unwrap();
        let result = FileConfig::load(file.path());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to parse config file"));
    }
}
