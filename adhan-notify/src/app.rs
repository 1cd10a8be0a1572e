//! Application state and initialization
//!
//! All services are constructed here, once, and shared through `AppState`.
//! The notification scheduler is an owned instance; nothing lives in
//! process-wide statics.

use crate::clock::{Clock, SystemClock};
use crate::config::{DaemonConfig, SETTINGS_FILE_NAME};
use crate::error::Result;
use crate::platform::{
    self, AlertSink, AtHost, Delivery, DesktopAlertSink, SoundFilePlayer, TracingAlertSink,
};
use crate::services::permission::PermissionFlag;
use crate::services::prayer_times::{PrayerTimeProvider, StaticPrayerTimes};
use crate::services::refresh::RefreshService;
use crate::services::scheduler::NotificationScheduler;
use crate::services::settings::SettingsStore;
use crate::storage::JsonFileStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub config: DaemonConfig,
    pub settings_file: Arc<JsonFileStore>,
    pub settings: SettingsStore,
    pub permission: PermissionFlag,
    pub provider: Arc<dyn PrayerTimeProvider>,
    pub clock: Arc<dyn Clock>,
    pub scheduler: Arc<NotificationScheduler>,
    pub refresh: Arc<RefreshService>,
}

/// Application setup - called once on startup
pub async fn setup(data_dir: PathBuf) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("Data directory: {:?}", data_dir);

    std::fs::create_dir_all(&data_dir)?;
    let config = DaemonConfig::load(&data_dir)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let settings_file = Arc::new(JsonFileStore::open(data_dir.join(SETTINGS_FILE_NAME))?);
    let settings = SettingsStore::new(settings_file.clone());

    let provider: Arc<dyn PrayerTimeProvider> = Arc::new(StaticPrayerTimes::load(
        &config.prayer_times_file,
        config.locale,
        clock.clone(),
    )?);

    let alerts: Arc<dyn AlertSink> = if config.desktop_alerts {
        Arc::new(DesktopAlertSink::new(env!("CARGO_PKG_NAME")))
    } else {
        Arc::new(TracingAlertSink)
    };
    let audio = Arc::new(SoundFilePlayer::new(config.sounds_dir.clone()));
    let host = AtHost::new(
        config.notifier.clone(),
        config.audio_player.clone(),
        config.sounds_dir.clone(),
    );
    let adapter = platform::select_adapter(
        config.prefer_native,
        host,
        Delivery::new(alerts, audio),
        clock.clone(),
    )
    .await;

    let permission = PermissionFlag::new(true);
    let scheduler = Arc::new(NotificationScheduler::new(
        adapter,
        settings.clone(),
        Arc::new(permission.clone()),
        clock.clone(),
        config.locale,
    ));

    let refresh = Arc::new(
        RefreshService::new(
            scheduler.clone(),
            provider.clone(),
            clock.clone(),
            Some(settings_file.clone()),
        )
        .await?,
    );

    tracing::info!("Application initialized successfully");

    Ok(AppState {
        data_dir,
        config,
        settings_file,
        settings,
        permission,
        provider,
        clock,
        scheduler,
        refresh,
    })
}
