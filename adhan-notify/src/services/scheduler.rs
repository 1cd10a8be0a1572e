//! Prayer notification scheduler
//!
//! Owns the registry of armed notifications. Each notifiable prayer moves
//! through `Unscheduled -> Armed -> {Fired | Cancelled}`, and the registry
//! holds at most one live entry per prayer: anything already armed for a
//! prayer is cancelled before a new entry is armed for it.

use crate::clock::{local_epoch_millis, Clock};
use crate::config::{Locale, VIBRATION_PATTERN_MS};
use crate::error::Result;
use crate::i18n;
use crate::models::{NotificationPayload, PrayerId, PrayerTime, ScheduledNotification};
use crate::platform::{ArmRequest, NotificationAdapter};
use crate::services::permission::PermissionGateway;
use crate::services::settings::SettingsStore;
use crate::services::sounds;
use chrono::{Duration, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of one scheduling pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub armed: Vec<PrayerId>,
    pub failed: Vec<(PrayerId, String)>,
    /// Scheduling was skipped because notifications aren't permitted
    pub permission_denied: bool,
    /// Scheduling was skipped because the global switch is off
    pub globally_disabled: bool,
}

/// When to fire for a prayer at `prayer_time` with `lead_minutes` of warning.
///
/// Targets the earliest occurrence of the prayer whose fire time is still
/// after `now`. A lead time reaching back past midnight moves on to a later
/// day's prayer, never to "now".
pub fn fire_time(now: NaiveDateTime, prayer_time: NaiveTime, lead_minutes: u32) -> NaiveDateTime {
    let lead = Duration::minutes(i64::from(lead_minutes));
    let mut candidate = now.date().and_time(prayer_time) - lead;
    while candidate <= now {
        candidate += Duration::days(1);
    }
    candidate
}

pub struct NotificationScheduler {
    adapter: Arc<dyn NotificationAdapter>,
    settings: SettingsStore,
    permission: Arc<dyn PermissionGateway>,
    clock: Arc<dyn Clock>,
    locale: Locale,
    registry: Mutex<HashMap<PrayerId, ScheduledNotification>>,
    prayers: Mutex<Vec<PrayerTime>>,
}

impl NotificationScheduler {
    pub fn new(
        adapter: Arc<dyn NotificationAdapter>,
        settings: SettingsStore,
        permission: Arc<dyn PermissionGateway>,
        clock: Arc<dyn Clock>,
        locale: Locale,
    ) -> Self {
        Self {
            adapter,
            settings,
            permission,
            clock,
            locale,
            registry: Mutex::new(HashMap::new()),
            prayers: Mutex::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn adapter(&self) -> &Arc<dyn NotificationAdapter> {
        &self.adapter
    }

    /// Arm a notification for every enabled prayer in `prayers`.
    ///
    /// Failures are per prayer: one rejected arm request is logged and
    /// reported, and the rest of the batch still goes ahead.
    pub async fn schedule_all(&self, prayers: &[PrayerTime]) -> Result<ScheduleReport> {
        *self.prayers.lock().await = prayers.to_vec();
        let mut report = ScheduleReport::default();

        if !self.settings.notifications_enabled() {
            tracing::info!("Notifications disabled globally, nothing scheduled");
            report.globally_disabled = true;
            return Ok(report);
        }

        if !self.permission.check().await {
            tracing::warn!("Notification permission not granted, skipping scheduling");
            report.permission_denied = true;
            return Ok(report);
        }

        let settings = self.settings.get_settings();
        let now = self.clock.now();
        let mut registry = self.registry.lock().await;

        for prayer_id in PrayerId::NOTIFIABLE {
            let Some(prayer) = prayers.iter().find(|p| p.id == prayer_id) else {
                continue;
            };

            // Never leave two live entries for one prayer
            if let Some(previous) = registry.remove(&prayer_id) {
                if let Err(e) = self.adapter.cancel(&previous.handle).await {
                    tracing::warn!("Failed to cancel previous {} notification: {}", prayer_id, e);
                }
            }

            let setting = settings.get(prayer_id);
            if !setting.enabled {
                continue;
            }

            let fire_at = fire_time(now, prayer.time, setting.lead_minutes);
            let sound = sounds::resolve(&setting.sound_id);
            let payload = NotificationPayload {
                prayer_id,
                title: i18n::notification_title(&prayer.name, self.locale),
                body: i18n::notification_body(&prayer.name, setting.lead_minutes, self.locale),
                sound,
                minutes_remaining: setting.lead_minutes,
                vibration: VIBRATION_PATTERN_MS.to_vec(),
            };

            match self.adapter.schedule(ArmRequest { fire_at, payload }).await {
                Ok(handle) => {
                    tracing::info!("Scheduled {} notification at {} ({})", prayer_id, fire_at, sound);
                    registry.insert(
                        prayer_id,
                        ScheduledNotification {
                            prayer_id,
                            fire_at,
                            fire_at_epoch_millis: local_epoch_millis(fire_at),
                            sound,
                            handle,
                        },
                    );
                    report.armed.push(prayer_id);
                }
                Err(e) => {
                    tracing::error!("Failed to schedule {} notification: {}", prayer_id, e);
                    report.failed.push((prayer_id, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Cancel one prayer's notification. Unknown or fired entries are a no-op.
    pub async fn cancel_prayer(&self, prayer_id: PrayerId) -> Result<()> {
        let removed = self.registry.lock().await.remove(&prayer_id);
        if let Some(entry) = removed {
            self.adapter.cancel(&entry.handle).await?;
            tracing::info!("Cancelled {} notification", prayer_id);
        }
        Ok(())
    }

    /// Cancel every notification, including OS-side entries.
    ///
    /// The registry is only cleared once the adapter has let go of its
    /// entries, so a failed cancel leaves every handle tracked.
    pub async fn cancel_all(&self) -> Result<()> {
        let mut registry = self.registry.lock().await;
        self.adapter.cancel_all().await?;
        registry.clear();
        tracing::info!("Cancelled all prayer notifications");
        Ok(())
    }

    /// Cancel everything, then schedule again from the current settings and
    /// the most recent prayer times.
    ///
    /// If the bulk cancel fails the pass still runs: `schedule_all` replaces
    /// each tracked entry one prayer at a time.
    pub async fn refresh(&self) -> Result<ScheduleReport> {
        if let Err(e) = self.cancel_all().await {
            tracing::warn!("Bulk cancel failed, replacing entries one by one: {}", e);
        }
        let prayers = self.prayers.lock().await.clone();
        self.schedule_all(&prayers).await
    }

    /// Live entries in prayer order. Entries whose fire time has passed are
    /// dropped first.
    pub async fn armed(&self) -> Vec<ScheduledNotification> {
        let now = self.clock.now();
        let mut registry = self.registry.lock().await;
        registry.retain(|prayer_id, entry| {
            let live = entry.fire_at > now;
            if !live {
                tracing::debug!("{} notification fired at {}", prayer_id, entry.fire_at);
            }
            live
        });

        let mut entries: Vec<_> = registry.values().cloned().collect();
        entries.sort_by_key(|e| e.prayer_id);
        entries
    }
}
