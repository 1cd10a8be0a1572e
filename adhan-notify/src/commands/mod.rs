//! Operations exposed to front ends
//!
//! This module organizes commands into logical submodules:
//! - `settings`: Per-prayer preferences, the global switch and permission
//! - `notifications`: Armed notifications, sounds and today's overview

pub mod notifications;
pub mod settings;

use crate::app::AppState;

// Re-export all commands for convenient use by front ends
pub use notifications::*;
pub use settings::*;

// ===== General Commands =====

/// Get application information
pub fn get_app_info(state: &AppState) -> AppInfo {
    AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        data_dir: state.data_dir.to_string_lossy().to_string(),
        persistent_notifications: state.scheduler.adapter().capabilities().persistent,
    }
}

/// Application information structure
#[derive(Debug, serde::Serialize)]
pub struct AppInfo {
    pub version: String,
    pub data_dir: String,
    /// Armed notifications survive this process exiting
    pub persistent_notifications: bool,
}
