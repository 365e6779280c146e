//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Weekday;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use hrs_core::ZeroDurationPolicy;
use serde::{Deserialize, Serialize};

/// First day of the week for weekly summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    pub const fn weekday(self) -> Weekday {
        match self {
            Self::Monday => Weekday::Mon,
            Self::Sunday => Weekday::Sun,
        }
    }
}

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// User whose timer and timesheet commands act on.
    pub user: String,

    /// Whether stopping a timer under 30 seconds records a zero-minute entry.
    pub zero_duration: ZeroDurationPolicy,

    pub week_starts_on: WeekStart,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("user", &self.user)
            .field("zero_duration", &self.zero_duration)
            .field("week_starts_on", &self.week_starts_on)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("hrs.db"),
            user: "default".to_string(),
            zero_duration: ZeroDurationPolicy::default(),
            week_starts_on: WeekStart::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (HRS_*)
        figment = figment.merge(Env::prefixed("HRS_"));

        figment.extract()
    }

    /// Path of the lock file guarding a user's writes.
    ///
    /// Characters that are unsafe in file names become `_`. Users whose names
    /// differ only there share a lock, which only serializes them further.
    pub fn lock_path(&self, user: &str) -> PathBuf {
        let dir = self
            .database_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let name: String = user
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        dir.join(format!("hrs-{name}.lock"))
    }
}

/// Returns the platform-specific config directory for hrs.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hrs"))
}

/// Returns the platform-specific data directory for hrs.
///
/// On Linux: `~/.local/share/hrs`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("hrs"))
}
