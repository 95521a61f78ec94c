use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retry policy for task snapshot requests (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/hsmon/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Coordinator base URL, e.g. `https://hashstack.example.com`.
    #[serde(default)]
    pub server_url: Option<String>,
    /// Bearer token for the coordinator API.
    #[serde(default)]
    pub token: Option<String>,
    /// Seconds between monitor refreshes.
    pub poll_interval_secs: u64,
    /// Devices silent for longer than this are left out of speed and device count.
    pub staleness_window_secs: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            token: None,
            poll_interval_secs: 5,
            staleness_window_secs: 120,
            connect_timeout_secs: 15,
            request_timeout_secs: 30,
            retry: None,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn staleness_window(&self) -> Duration {
        Duration::from_secs(self.staleness_window_secs)
    }

    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hsmon")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MonitorConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<MonitorConfig> {
    if !path.exists() {
        let default_cfg = MonitorConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)
            .with_context(|| format!("writing default config to {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: MonitorConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_values() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.poll_interval(), Duration::from_secs(5));
        assert_eq!(cfg.staleness_window(), Duration::from_secs(120));
        assert!(cfg.server_url.is_none());
        assert!(cfg.token.is_none());
        assert_eq!(cfg.retry_config(), RetryConfig::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = MonitorConfig {
            server_url: Some("https://hs.example".into()),
            ..MonitorConfig::default()
        };
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: MonitorConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            server_url = "http://10.0.0.5:8080"
            token = "abc"
            poll_interval_secs = 10
            staleness_window_secs = 60
            connect_timeout_secs = 5
            request_timeout_secs = 20

            [retry]
            max_attempts = 3
            base_delay_secs = 0.5
            max_delay_secs = 15
        "#;
        let cfg: MonitorConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.server_url.as_deref(), Some("http://10.0.0.5:8080"));
        assert_eq!(cfg.token.as_deref(), Some("abc"));
        assert_eq!(cfg.poll_interval(), Duration::from_secs(10));
        assert_eq!(cfg.staleness_window(), Duration::from_secs(60));
        let retry = cfg.retry_config();
        assert_eq!(retry.max_attempts, 3);
        assert!((retry.base_delay_secs - 0.5).abs() < 1e-9);
        assert_eq!(retry.max_delay_secs, 15);
    }

    #[test]
    fn zero_poll_interval_clamped() {
        let cfg = MonitorConfig {
            poll_interval_secs: 0,
            ..MonitorConfig::default()
        };
        assert_eq!(cfg.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn load_or_init_creates_then_reads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let created = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created, MonitorConfig::default());

        fs::write(
            &path,
            "poll_interval_secs = 2\nstaleness_window_secs = 30\nconnect_timeout_secs = 1\nrequest_timeout_secs = 2\n",
        )
        .unwrap();
        let loaded = load_or_init_at(&path).unwrap();
        assert_eq!(loaded.poll_interval_secs, 2);
        assert_eq!(loaded.staleness_window_secs, 30);
    }

    #[test]
    fn load_rejects_bad_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "poll_interval_secs = \"soon\"").unwrap();
        assert!(load_or_init_at(&path).is_err());
    }
}
