//! Application configuration
//!
//! Central location for configuration constants, validation boundaries and
//! the daemon's on-disk configuration file.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ===== Notification Defaults =====

/// Lead time applied to prayers with no stored preference
pub const DEFAULT_LEAD_MINUTES: u32 = 10;

/// Maximum lead time in minutes (3 hours).
/// Larger values would overlap the previous prayer for most of the year.
pub const MAX_LEAD_MINUTES: u32 = 180;

/// Canonical sound id used when a preference is missing or unrecognized
pub const DEFAULT_SOUND_ID: &str = "adhan";

/// Haptic pulse pattern played on delivery (on, off, on) in milliseconds
pub const VIBRATION_PATTERN_MS: &[u64] = &[500, 200, 500];

// ===== Storage Keys =====

/// Key of the global switch gating all scheduling
pub const NOTIFICATIONS_ENABLED_KEY: &str = "notifications.enabled";

/// Prefix of the per-prayer preference records
pub const PRAYER_SETTING_KEY_PREFIX: &str = "notifications.prayer.";

/// Settings file name inside the data directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Daemon configuration file name inside the data directory
pub const CONFIG_FILE_NAME: &str = "config.json";

// ===== Daemon Defaults =====

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "ADHAN_NOTIFY_DATA_DIR";

/// Re-run scheduling at the top of every hour. Scheduling is idempotent,
/// so this also picks up the new day's times shortly after midnight.
pub const DEFAULT_REFRESH_CRON: &str = "0 0 * * * *";

/// Marker written into OS-level jobs so they can be matched to a prayer later
pub const NATIVE_JOB_MARKER: &str = "# adhan-notify prayer=";

/// Display language for prayer names and notification text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

/// Device location used for the Qibla bearing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Daemon configuration, read from `config.json` in the data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub locale: Locale,
    /// Use OS-level scheduled notifications when the host supports them
    #[serde(default = "default_true")]
    pub prefer_native: bool,
    /// Show in-process alerts as desktop notifications.
    /// Off means alerts only go to the log.
    #[serde(default = "default_true")]
    pub desktop_alerts: bool,
    /// Notifier run by OS-level jobs, as `<notifier> <title> <body>`
    #[serde(default = "default_notifier")]
    pub notifier: String,
    /// Player run by OS-level jobs, as `<player> <file>`
    #[serde(default = "default_audio_player")]
    pub audio_player: String,
    /// Directory containing `adhan.mp3`, `soft.mp3`, ... (relative to data dir)
    #[serde(default = "default_sounds_dir")]
    pub sounds_dir: PathBuf,
    /// Pre-computed prayer times (relative to data dir)
    #[serde(default = "default_prayer_times_file")]
    pub prayer_times_file: PathBuf,
    #[serde(default = "default_refresh_cron")]
    pub refresh_cron: String,
    #[serde(default)]
    pub location: Option<Location>,
}

fn default_true() -> bool {
    true
}

fn default_notifier() -> String {
    "notify-send".to_string()
}

fn default_audio_player() -> String {
    "paplay".to_string()
}

fn default_sounds_dir() -> PathBuf {
    PathBuf::from("sounds")
}

fn default_prayer_times_file() -> PathBuf {
    PathBuf::from("prayer_times.json")
}

fn default_refresh_cron() -> String {
    DEFAULT_REFRESH_CRON.to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            prefer_native: default_true(),
            desktop_alerts: default_true(),
            notifier: default_notifier(),
            audio_player: default_audio_player(),
            sounds_dir: default_sounds_dir(),
            prayer_times_file: default_prayer_times_file(),
            refresh_cron: default_refresh_cron(),
            location: None,
        }
    }
}

impl DaemonConfig {
    /// Load `config.json` from the data directory, falling back to defaults
    /// when the file does not exist
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default_for(data_dir));
        }

        let content = std::fs::read_to_string(&path)?;
        let mut config: DaemonConfig = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse config: {}", e)))?;
        config.sounds_dir = resolve_relative(data_dir, &config.sounds_dir);
        config.prayer_times_file = resolve_relative(data_dir, &config.prayer_times_file);
        Ok(config)
    }

    /// Defaults with paths anchored at the data directory
    pub fn default_for(data_dir: &Path) -> Self {
        let config = Self::default();
        Self {
            sounds_dir: data_dir.join(&config.sounds_dir),
            prayer_times_file: data_dir.join(&config.prayer_times_file),
            ..config
        }
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Data directory from the environment, or `./data`
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"))
}
