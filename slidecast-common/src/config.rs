//! Bootstrap configuration loading
//!
//! Settings are read once at startup from a TOML file. Every field has a
//! built-in default, so a missing file is never fatal.
//!
//! # Resolution priority
//!
//! Config file path and API base URL are both resolved in this order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file (API base URL only)
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SLIDECAST_CONFIG";

/// Environment variable overriding the backend base URL
pub const API_URL_ENV_VAR: &str = "SLIDECAST_API_URL";

/// Backend base URL used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Backend base URL (sessions, generation, presentations)
    pub api_base_url: Option<String>,

    /// Key sent as `x-api-key` on generation requests
    pub api_key: Option<String>,

    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,

    pub wizard: WizardSettings,
    pub playback: PlaybackSettings,
    pub loader: LoaderSettings,
    pub logging: LoggingConfig,
}

/// Preparation wizard settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WizardSettings {
    /// Length of the generation countdown
    pub countdown_secs: u32,
}

/// Playback controller settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Pause between a slide's narration ending and the next slide starting
    pub advance_delay_ms: u64,

    /// Volume applied when a presentation is first bound (0.0-1.0)
    pub initial_volume: f32,
}

/// Slide/audio loader settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Highest slide position probed when the manifest is unavailable
    pub fallback_max_positions: u32,

    /// Consecutive markup failures that stop probing
    pub fallback_failure_limit: u32,

    /// Probe positions in flight at once
    pub fallback_concurrency: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_key: None,
            request_timeout_secs: 30,
            wizard: WizardSettings::default(),
            playback: PlaybackSettings::default(),
            loader: LoaderSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self { countdown_secs: 30 }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            advance_delay_ms: 1000,
            initial_volume: 1.0,
        }
    }
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            fallback_max_positions: 10,
            fallback_failure_limit: 2,
            fallback_concurrency: 3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl TomlConfig {
    /// Parse and validate a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the components cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.playback.initial_volume) {
            return Err(Error::Config(format!(
                "playback.initial_volume must be within 0.0-1.0, got {}",
                self.playback.initial_volume
            )));
        }
        if self.loader.fallback_failure_limit == 0 {
            return Err(Error::Config(
                "loader.fallback_failure_limit must be at least 1".to_string(),
            ));
        }
        if self.loader.fallback_concurrency == 0 {
            return Err(Error::Config(
                "loader.fallback_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Backend base URL following the resolution priority
    pub fn resolve_api_base_url(&self, cli_arg: Option<&str>) -> String {
        if let Some(url) = cli_arg {
            return url.trim_end_matches('/').to_string();
        }

        if let Ok(url) = std::env::var(API_URL_ENV_VAR) {
            if !url.trim().is_empty() {
                return url.trim().trim_end_matches('/').to_string();
            }
        }

        self.api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.playback.advance_delay_ms)
    }
}

/// Config file path following the resolution priority
///
/// Returns None when neither an argument nor the environment names a file
/// and the platform default location does not exist.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform default location, only if present
    default_config_path().filter(|p| p.exists())
}

/// Platform config location: `<config_dir>/slidecast/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("slidecast").join("config.toml"))
}

/// Load configuration, degrading to defaults when the file is missing
///
/// A file that exists but cannot be parsed or validated is an error.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        debug!("No config file found, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            path = %path.display(),
            "Config file not found, using built-in defaults"
        );
        return Ok(TomlConfig::default());
    }

    let config = TomlConfig::from_file(&path)?;
    debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.wizard.countdown_secs, 30);
        assert_eq!(config.playback.advance_delay_ms, 1000);
        assert_eq!(config.loader.fallback_max_positions, 10);
        assert_eq!(config.loader.fallback_failure_limit, 2);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            api_base_url = "http://backend:9000/"

            [wizard]
            countdown_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.wizard.countdown_secs, 5);
        assert_eq!(config.playback.initial_volume, 1.0);
        assert_eq!(config.resolve_api_base_url(Some("http://cli:1/")), "http://cli:1");
    }

    #[test]
    fn test_validate_rejects_out_of_range_volume() {
        let mut config = TomlConfig::default();
        config.playback.initial_volume = 1.5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_failure_limit() {
        let mut config = TomlConfig::default();
        config.loader.fallback_failure_limit = 0;
        assert!(config.validate().is_err());
    }
}
