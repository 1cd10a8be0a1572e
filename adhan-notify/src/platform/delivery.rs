//! Notification delivery
//!
//! What happens when an in-process timer fires: show the alert, pulse the
//! haptic pattern, play the sound. Each channel is best-effort and a failure
//! in one never stops the others. Audio decoding needs the `audio` feature;
//! without it playback is reported as failed and the alert still goes out.

use crate::error::{AppError, Result};
use crate::models::NotificationPayload;
use crate::services::sounds::Sound;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn show(&self, title: &str, body: &str) -> Result<()>;
    async fn vibrate(&self, pattern: &[u64]) -> Result<()>;
}

#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, sound: Sound) -> Result<()>;
}

/// Writes alerts to the log. Used when no desktop notifier is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn show(&self, title: &str, body: &str) -> Result<()> {
        tracing::info!(title, body, "Prayer notification");
        Ok(())
    }

    async fn vibrate(&self, pattern: &[u64]) -> Result<()> {
        tracing::debug!(?pattern, "Haptic pulse");
        Ok(())
    }
}

/// Shows alerts as desktop notifications
#[derive(Debug, Clone)]
pub struct DesktopAlertSink {
    app_name: String,
}

impl DesktopAlertSink {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

#[async_trait]
impl AlertSink for DesktopAlertSink {
    async fn show(&self, title: &str, body: &str) -> Result<()> {
        let mut notification = notify_rust::Notification::new();
        notification
            .appname(&self.app_name)
            .summary(title)
            .body(body);

        // The D-Bus round trip blocks
        tokio::task::spawn_blocking(move || notification.show().map(|_| ()))
            .await
            .map_err(|e| AppError::Alert(format!("notification task failed: {}", e)))?
            .map_err(|e| AppError::Alert(e.to_string()))
    }

    /// Desktop notifications have no haptics
    async fn vibrate(&self, pattern: &[u64]) -> Result<()> {
        tracing::trace!(?pattern, "Skipping haptic pulse");
        Ok(())
    }
}

/// Plays the bundled sound files from `sounds_dir` on the default output device
#[derive(Debug, Clone)]
pub struct SoundFilePlayer {
    sounds_dir: PathBuf,
}

impl SoundFilePlayer {
    pub fn new(sounds_dir: PathBuf) -> Self {
        Self { sounds_dir }
    }

    pub fn sound_path(&self, sound: Sound) -> Option<PathBuf> {
        sound.file_name().map(|file| self.sounds_dir.join(file))
    }
}

#[async_trait]
impl AudioPlayer for SoundFilePlayer {
    async fn play(&self, sound: Sound) -> Result<()> {
        let Some(path) = self.sound_path(sound) else {
            return Ok(());
        };
        if !path.exists() {
            return Err(AppError::Playback(format!("sound file missing: {:?}", path)));
        }

        // Fire and forget; the adhan runs for minutes
        tokio::task::spawn_blocking(move || {
            if let Err(e) = play_to_end(&path) {
                tracing::warn!("Playback of {:?} failed: {}", path, e);
            }
        });
        tracing::debug!("Playing {}", sound);
        Ok(())
    }
}

#[cfg(feature = "audio")]
fn play_to_end(path: &std::path::Path) -> Result<()> {
    use rodio::{Decoder, OutputStream, Sink};

    let (_stream, stream_handle) = OutputStream::try_default().map_err(playback_error)?;
    let sink = Sink::try_new(&stream_handle).map_err(playback_error)?;
    let file = std::fs::File::open(path)?;
    let source = Decoder::new(std::io::BufReader::new(file)).map_err(playback_error)?;
    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}

#[cfg(feature = "audio")]
fn playback_error(e: impl std::fmt::Display) -> AppError {
    AppError::Playback(e.to_string())
}

#[cfg(not(feature = "audio"))]
fn play_to_end(_path: &std::path::Path) -> Result<()> {
    Err(AppError::Playback("built without the `audio` feature".to_string()))
}

/// The downstream channels a fired notification goes out on
#[derive(Clone)]
pub struct Delivery {
    alerts: Arc<dyn AlertSink>,
    audio: Arc<dyn AudioPlayer>,
}

impl Delivery {
    pub fn new(alerts: Arc<dyn AlertSink>, audio: Arc<dyn AudioPlayer>) -> Self {
        Self { alerts, audio }
    }

    /// Deliver a notification. Counts as delivered even if the sound fails.
    pub async fn deliver(&self, payload: &NotificationPayload) {
        if let Err(e) = self.alerts.show(&payload.title, &payload.body).await {
            tracing::error!("Failed to show {} notification: {}", payload.prayer_id, e);
        }

        if let Err(e) = self.alerts.vibrate(&payload.vibration).await {
            tracing::warn!("Haptic pulse failed: {}", e);
        }

        if let Err(e) = self.audio.play(payload.sound).await {
            tracing::warn!("Failed to play {} for {}: {}", payload.sound, payload.prayer_id, e);
        }

        tracing::info!("Delivered {} notification", payload.prayer_id);
    }
}
