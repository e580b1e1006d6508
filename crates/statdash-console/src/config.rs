//! Dashboard configuration.
//!
//! Resolution order, lowest to highest precedence: built-in defaults, the TOML
//! file, then command-line flags and their environment variables.
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:8000"
//! request_timeout_secs = 30
//!
//! [chat]
//! user_id = "default"
//! max_messages = 500
//!
//! [logging]
//! level = "info"
//! file = "/tmp/statdash.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use statdash_protocol::{DEFAULT_BASE_URL, DEFAULT_CHAT_USER_ID};

const APP_DIR: &str = "statdash";
const CONFIG_FILE: &str = "config.toml";
const LOG_FILE: &str = "statdash.log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Per-request timeout. Unset means wait on the transport indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub user_id: String,
    /// Oldest transcript entries are dropped beyond this. Unset keeps all.
    pub max_messages: Option<usize>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_CHAT_USER_ID.to_string(),
            max_messages: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `statdash_client=debug`.
    pub level: String,
    /// Log file for console mode.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub backend: BackendConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}

impl DashboardConfig {
    /// Parse a config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chat.max_messages == Some(0) {
            anyhow::bail!("chat.max_messages must be at least 1; omit it to keep every message");
        }
        Ok(())
    }

    /// Load from `explicit` if given, else from the per-user default path if
    /// that file exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/statdash/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Flag/environment overrides. `None` leaves the loaded value.
    pub fn apply_overrides(&mut self, base_url: Option<String>, log_level: Option<String>) {
        if let Some(base_url) = base_url {
            self.backend.base_url = base_url;
        }
        if let Some(level) = log_level {
            self.logging.level = level;
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.backend.request_timeout_secs.map(Duration::from_secs)
    }

    /// Where console mode writes logs.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging.file.clone().or_else(|| {
            dirs::data_local_dir().map(|dir| dir.join(APP_DIR).join(LOG_FILE))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_point_at_local_backend() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.backend.base_url, "http://localhost:8000");
        assert_eq!(cfg.request_timeout(), None);
        assert_eq!(cfg.chat.user_id, "default");
        assert_eq!(cfg.chat.max_messages, None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[backend]\nrequest_timeout_secs = 15\n\n[chat]\nmax_messages = 200"
        )
        .unwrap();

        let cfg = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.backend.base_url, "http://localhost:8000");
        assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(cfg.chat.max_messages, Some(200));
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn overrides_beat_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[backend]\nbase_url = \"http://file:9000\"\n[logging]\nlevel = \"warn\""
        )
        .unwrap();

        let mut cfg = DashboardConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.backend.base_url, "http://file:9000");

        cfg.apply_overrides(Some("http://flag:7000".to_string()), None);
        assert_eq!(cfg.backend.base_url, "http://flag:7000");
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DashboardConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[backend\nbase_url = ").unwrap();
        assert!(DashboardConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn zero_message_cap_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[chat]\nmax_messages = 0").unwrap();

        let err = DashboardConfig::from_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("max_messages"));
    }

    #[test]
    fn explicit_log_file_wins() {
        let mut cfg = DashboardConfig::default();
        cfg.logging.file = Some(PathBuf::from("/tmp/x.log"));
        assert_eq!(cfg.log_file(), Some(PathBuf::from("/tmp/x.log")));
    }
}
