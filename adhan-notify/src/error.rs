//! Error types for adhan-notify
//!
//! All errors use thiserror for structured error handling.
//! Nothing in the notification path is fatal: callers log these and move on.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("File watch error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Cron scheduler error: {0}")]
    CronScheduler(#[from] tokio_cron_scheduler::JobSchedulerError),

    #[error("Settings storage corrupt: {0}")]
    StorageCorrupt(String),

    #[error("Failed to arm notification: {0}")]
    Scheduling(String),

    #[error("Failed to show notification: {0}")]
    Alert(String),

    #[error("Playback failed: {0}")]
    Playback(String),

    #[error("No prayer times available for {0}")]
    PrayerTimesUnavailable(chrono::NaiveDate),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid setting: {0}")]
    Validation(String),

    #[error("{0}")]
    Generic(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
