//! Configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/rfshare/config.toml`
//! - Windows: `%APPDATA%/rfshare/config.toml`
//!
//! A missing file yields the defaults. Command-line flags override it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use rfshare_client::ClientConfig;
use rfshare_transfer::RetryPolicy;
use serde::{Deserialize, Serialize};

/// rfshare configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server address (`host:port`) for client commands.
    #[serde(default)]
    pub server: Option<String>,

    /// Port `serve` listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory `serve` resolves remote paths against.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Reject remote paths that escape the root.
    #[serde(default)]
    pub confine_paths: bool,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Retry settings for rejected upload chunks.
    #[serde(default)]
    pub retry: RetrySettings,
}

/// The `[retry]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

fn default_port() -> u16 {
    rfshare_server::DEFAULT_PORT
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_call_timeout() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_backoff_factor() -> f64 {
    2.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: None,
            port: default_port(),
            root: default_root(),
            confine_paths: false,
            connect_timeout_secs: default_connect_timeout(),
            call_timeout_secs: default_call_timeout(),
            retry: RetrySettings::default(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl RetrySettings {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_factor: self.backoff_factor,
        }
    }
}

impl Config {
    /// Loads configuration from `explicit`, or from the platform path.
    ///
    /// An explicit path must exist; a missing platform file yields defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::read(path),
            None => {
                let path = config_path();
                if path.exists() {
                    Self::read(&path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration read");
        Ok(config)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            call_timeout: Duration::from_secs(self.call_timeout_secs),
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("rfshare")
            .join("config.toml")
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("rfshare").join("config.toml")
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        PathBuf::from("/tmp/rfshare/config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.server.is_none());
        assert_eq!(config.port, 8000);
        assert_eq!(config.root, PathBuf::from("."));
        assert!(!config.confine_paths);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.call_timeout_secs, 60);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = Config {
            server: Some("files.lan:9000".into()),
            port: 9000,
            root: PathBuf::from("/srv/share"),
            confine_paths: true,
            connect_timeout_secs: 3,
            call_timeout_secs: 30,
            retry: RetrySettings {
                max_attempts: 2,
                ..RetrySettings::default()
            },
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.server.as_deref(), Some("files.lan:9000"));
        assert_eq!(parsed.port, 9000);
        assert_eq!(parsed.root, PathBuf::from("/srv/share"));
        assert!(parsed.confine_paths);
        assert_eq!(parsed.call_timeout_secs, 30);
        assert_eq!(parsed.retry.max_attempts, 2);
    }

    #[test]
    fn config_partial_toml() {
        let toml_str = r#"
server = "localhost:8000"

[retry]
max_attempts = 9
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.as_deref(), Some("localhost:8000"));
        assert_eq!(config.port, 8000);
        assert_eq!(config.retry.max_attempts, 9);
        assert_eq!(config.retry.initial_delay_ms, 100);
    }

    #[test]
    fn retry_settings_to_policy() {
        let policy = RetrySettings::default().to_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(100));
        assert_eq!(policy.max_delay, Duration::from_secs(5));
        assert_eq!(policy.backoff_factor, 2.0);
    }

    #[test]
    fn config_path_not_empty() {
        assert!(config_path().to_string_lossy().contains("rfshare"));
    }

    #[test]
    fn load_explicit_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "port = 7001\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.port, 7001);
    }

    #[test]
    fn load_missing_explicit_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&tmp.path().join("absent.toml"))).is_err());
    }
}
