//! Settings-related commands
//!
//! Every edit is persisted first, then a rebuild of the armed notifications
//! is queued on the refresh loop and awaited.

use crate::app::AppState;
use crate::error::Result;
use crate::models::{NotificationSetting, NotificationSettings, PrayerId};
use crate::services::permission::PermissionGateway;
use crate::services::refresh::RefreshTrigger;
use crate::services::scheduler::ScheduleReport;

/// Get notification preferences for every prayer
pub fn get_notification_settings(state: &AppState) -> NotificationSettings {
    state.settings.get_settings()
}

/// Update one prayer's preference and reschedule
pub async fn update_notification_setting(
    state: &AppState,
    prayer: PrayerId,
    setting: NotificationSetting,
) -> Result<ScheduleReport> {
    state.settings.update_setting(prayer, &setting)?;
    state.refresh.request(RefreshTrigger::SettingsEdited).await
}

/// Replace all preferences and reschedule
pub async fn update_notification_settings(
    state: &AppState,
    settings: NotificationSettings,
) -> Result<ScheduleReport> {
    state.settings.save_settings(&settings)?;
    state.refresh.request(RefreshTrigger::SettingsEdited).await
}

/// Flip the global notification switch. Turning it off leaves nothing armed.
pub async fn set_notifications_enabled(state: &AppState, enabled: bool) -> Result<()> {
    state.settings.set_notifications_enabled(enabled)?;
    let report = state.refresh.request(RefreshTrigger::SettingsEdited).await?;
    tracing::info!(
        "Notifications {}, {} armed",
        if enabled { "enabled" } else { "disabled" },
        report.armed.len()
    );
    Ok(())
}

/// Ask for notification permission; schedules right away when granted
pub async fn request_permission(state: &AppState) -> Result<bool> {
    let granted = state.permission.request().await;
    if granted {
        state.refresh.request(RefreshTrigger::SettingsEdited).await?;
    } else {
        tracing::info!("Notification permission still not granted");
    }
    Ok(granted)
}
