//! Bootstrap configuration loading and root folder resolution
//!
//! Configuration is minimal: where the database lives, how loudly to log,
//! and the defaults the analytics views fall back to. Settings sources in
//! priority order:
//!
//! 1. Command-line arguments (`--root-folder`, `--database`)
//! 2. Environment variable (`ONBOARD_ROOT_FOLDER`)
//! 3. TOML configuration file
//! 4. OS-dependent compiled default
//!
//! A missing TOML file is not an error; compiled defaults are used and a
//! warning is logged.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "ONBOARD_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "onboard.db";

/// Largest accepted distance from UTC, in minutes (UTC+14:00)
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Where the bootstrap configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this file
    File(PathBuf),
    /// No file at this location; compiled defaults in use
    Missing(PathBuf),
    /// Platform config directory unknown; compiled defaults in use
    NoConfigDir,
}

impl ConfigSource {
    /// Whether compiled defaults were used
    pub fn is_default(&self) -> bool {
        !matches!(self, ConfigSource::File(_))
    }

    /// Report the source at info, or warn when defaults were used
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => {
                info!("Loaded configuration from {}", path.display());
            }
            ConfigSource::Missing(path) => {
                warn!(
                    "No configuration file at {}, using compiled defaults",
                    path.display()
                );
            }
            ConfigSource::NoConfigDir => {
                warn!("Could not determine config directory, using compiled defaults");
            }
        }
    }
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit database file path; overrides `<root_folder>/onboard.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Analytics defaults (optional)
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Analytics defaults
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Bucket width used by the peak-time view when none is requested
    #[serde(default = "default_interval_minutes")]
    pub default_interval_minutes: u32,

    /// Fixed offset from UTC used to read time-of-day from completion stamps
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_interval_minutes: default_interval_minutes(),
            utc_offset_minutes: 0,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_interval_minutes() -> u32 {
    60
}

impl TomlConfig {
    /// Load and validate configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: TomlConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with graceful degradation
    ///
    /// An explicitly requested file must exist. Without one, the platform
    /// config location is tried and compiled defaults are used if nothing
    /// is there. Nothing is logged here; callers report the returned
    /// [`ConfigSource`] once their subscriber is installed.
    pub fn load_with_source(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        match explicit {
            Some(path) => Ok((Self::load(path)?, ConfigSource::File(path.to_path_buf()))),
            None => Self::load_from_candidate(default_config_path()),
        }
    }

    /// Load `candidate` when it exists, compiled defaults otherwise
    pub fn load_from_candidate(candidate: Option<PathBuf>) -> Result<(Self, ConfigSource)> {
        match candidate {
            Some(path) if path.exists() => {
                let config = Self::load(&path)?;
                Ok((config, ConfigSource::File(path)))
            }
            Some(path) => Ok((Self::default(), ConfigSource::Missing(path))),
            None => Ok((Self::default(), ConfigSource::NoConfigDir)),
        }
    }

    /// Reject values that would make later stages misbehave
    pub fn validate(&self) -> Result<()> {
        if self.logging.level.trim().is_empty() {
            return Err(Error::Config("logging.level must not be empty".to_string()));
        }

        let offset = self.analytics.utc_offset_minutes;
        if offset.unsigned_abs() > MAX_UTC_OFFSET_MINUTES.unsigned_abs() {
            return Err(Error::Config(format!(
                "analytics.utc_offset_minutes must be within ±{}, got {}",
                MAX_UTC_OFFSET_MINUTES, offset
            )));
        }

        Ok(())
    }
}

/// Platform config file location: `<config dir>/onboard/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("onboard").join("config.toml"))
}

/// Resolve the root folder following the documented priority order
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Resolve the database file: CLI argument, then TOML `database_path`,
/// then `<root_folder>/onboard.db`
pub fn resolve_database_path(
    cli_arg: Option<&Path>,
    root_folder: &Path,
    config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Some(path) = &config.database_path {
        return path.clone();
    }
    root_folder.join(DATABASE_FILE_NAME)
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/onboard (or /var/lib/onboard for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("onboard"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/onboard"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("onboard"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/onboard"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("onboard"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\onboard"))
    } else {
        PathBuf::from("./onboard_data")
    }
}
