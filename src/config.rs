//! Runtime configuration.
//!
//! Every section has working defaults so that an empty or missing file
//! still yields a runnable setup: raw images in `./images`, transformed
//! images in `./wallpapers`, a new code every 30 seconds living for 60.

use crate::keygen::LengthPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("regeneration interval must be at least one second")]
    InvalidInterval,
    #[error("code lifetime must be at least one second")]
    InvalidLifetime,
    #[error("{0} directory must not be empty")]
    EmptyDirectory(&'static str),
    #[error("{0} prefix must not be empty")]
    EmptyPrefix(&'static str),
    #[error("invalid password length policy (need 1 <= min <= fallback, min <= max)")]
    InvalidLengthPolicy,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Where raw images are collected from.
    #[serde(default)]
    pub source: SourceConfig,
    /// Where transformed images are written.
    #[serde(default)]
    pub output: OutputConfig,
    /// Regeneration timing.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Length policy for on-demand passwords.
    #[serde(default)]
    pub password: LengthPolicy,
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where raw lava lamp images are collected from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory the camera uploads into.
    pub dir: PathBuf,
    /// Only files starting with this prefix are considered.
    pub prefix: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("images"),
            prefix: "lava_".to_string(),
        }
    }
}

/// Where transformed images are written and whether to transform at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for transformed images.
    pub dir: PathBuf,
    /// Prefix of minted output keys.
    pub prefix: String,
    /// Run source images through the transform service.
    pub transform: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("wallpapers"),
            prefix: "wallpaper_".to_string(),
            transform: true,
        }
    }
}

/// Timing of the regeneration loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between regeneration cycles.
    pub interval_secs: u64,
    /// Seconds a generated code stays valid.
    pub code_ttl_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            code_ttl_secs: 60,
        }
    }
}

impl ScheduleConfig {
    /// Returns the regeneration interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Returns the code lifetime.
    pub fn code_ttl(&self) -> Duration {
        Duration::from_secs(self.code_ttl_secs)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port for the HTTP endpoint (0 to disable).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 9090 }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.interval_secs == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        if self.schedule.code_ttl_secs == 0 {
            return Err(ConfigError::InvalidLifetime);
        }
        if self.source.dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDirectory("source"));
        }
        if self.output.dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDirectory("output"));
        }
        if self.source.prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix("source"));
        }
        if self.output.prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix("output"));
        }

        let policy = &self.password;
        if policy.min == 0 || policy.min > policy.max || policy.fallback < policy.min {
            return Err(ConfigError::InvalidLengthPolicy);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.schedule.interval(), Duration::from_secs(30));
        assert_eq!(config.schedule.code_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_interval_invalid() {
        let mut config = FileConfig::default();
        config.schedule.interval_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidInterval)
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: FileConfig = toml::from_str(
            r#"
            [source]
            dir = "/var/lava"

            [schedule]
            interval_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.source.dir, PathBuf::from("/var/lava"));
        assert_eq!(config.source.prefix, "lava_");
        assert_eq!(config.schedule.interval_secs, 10);
        assert_eq!(config.schedule.code_ttl_secs, 60);
        assert_eq!(config.password, LengthPolicy::default());
    }

    #[test]
    fn test_from_file_rejects_bad_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lava-seed.toml");
        std::fs::write(&path, "[password]\nmin = 40\nmax = 32\nfallback = 20\n").unwrap();

        assert!(matches!(
            FileConfig::from_file(&path),
            Err(ConfigError::InvalidLengthPolicy)
        ));
    }
}
