//! Notification-related commands

use crate::app::AppState;
use crate::calendar::{qibla_bearing, HijriDate};
use crate::error::Result;
use crate::models::{PrayerTime, ScheduledNotification};
use crate::services::sounds;
use serde::Serialize;

/// Armed notifications, in prayer order
pub async fn list_scheduled_notifications(state: &AppState) -> Vec<ScheduledNotification> {
    state.scheduler.armed().await
}

/// Canonical sound ids for the settings picker
pub fn list_sounds() -> Vec<&'static str> {
    sounds::known_sound_ids()
}

/// Today's prayer times with the Hijri date and Qibla bearing
#[derive(Debug, Serialize)]
pub struct TodayOverview {
    pub date: chrono::NaiveDate,
    pub hijri: HijriDate,
    pub hijri_label: String,
    pub prayers: Vec<PrayerTime>,
    /// Degrees from true north; `None` without a configured location
    pub qibla_bearing: Option<f64>,
}

pub fn get_today(state: &AppState) -> Result<TodayOverview> {
    let date = state.clock.now().date();
    let hijri = HijriDate::from_gregorian(date);
    Ok(TodayOverview {
        date,
        hijri,
        hijri_label: hijri.to_string(),
        prayers: state.provider.prayer_times(date)?,
        qibla_bearing: state.config.location.map(qibla_bearing),
    })
}
