//! Settings service
//!
//! Per-prayer notification preferences and the global notification switch,
//! persisted one record per key in durable key-value storage.

use crate::config::{NOTIFICATIONS_ENABLED_KEY, PRAYER_SETTING_KEY_PREFIX};
use crate::error::{AppError, Result};
use crate::models::{NotificationSetting, NotificationSettings, PrayerId};
use crate::storage::KeyValueStore;
use std::sync::Arc;

/// Service for reading and writing notification preferences
#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn prayer_key(prayer: PrayerId) -> String {
        format!("{}{}", PRAYER_SETTING_KEY_PREFIX, prayer.as_str())
    }

    /// Preferences for every notifiable prayer.
    ///
    /// Missing or unreadable records come back as defaults. Nothing is
    /// written, so reading never changes storage.
    pub fn get_settings(&self) -> NotificationSettings {
        let mut settings = NotificationSettings::defaults();
        for prayer in PrayerId::NOTIFIABLE {
            if let Some(setting) = self.read_setting(prayer) {
                settings.set(prayer, setting);
            }
        }
        settings
    }

    /// Preference for a single prayer
    pub fn get_setting(&self, prayer: PrayerId) -> NotificationSetting {
        self.read_setting(prayer).unwrap_or_default()
    }

    fn read_setting(&self, prayer: PrayerId) -> Option<NotificationSetting> {
        let key = Self::prayer_key(prayer);
        let raw = match self.store.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::error!("Failed to read {}: {}", key, e);
                return None;
            }
        };

        let parsed = serde_json::from_str::<NotificationSetting>(&raw)
            .map_err(AppError::from)
            .and_then(|setting| setting.validate().map(|()| setting));
        match parsed {
            Ok(setting) => Some(setting),
            Err(e) => {
                tracing::warn!("Corrupt setting {} ({}), using defaults", key, e);
                None
            }
        }
    }

    /// Persist preferences for every prayer in `settings`
    pub fn save_settings(&self, settings: &NotificationSettings) -> Result<()> {
        for (_, setting) in settings.iter() {
            setting.validate()?;
        }
        for (prayer, setting) in settings.iter() {
            self.write_setting(prayer, setting)?;
        }
        tracing::info!("Notification settings saved");
        Ok(())
    }

    /// Persist the preference for one prayer
    pub fn update_setting(&self, prayer: PrayerId, setting: &NotificationSetting) -> Result<()> {
        setting.validate()?;
        self.write_setting(prayer, setting)?;
        tracing::info!(
            "Updated {} notification: enabled={}, lead={}m, sound={}",
            prayer,
            setting.enabled,
            setting.lead_minutes,
            setting.sound_id
        );
        Ok(())
    }

    fn write_setting(&self, prayer: PrayerId, setting: &NotificationSetting) -> Result<()> {
        if !prayer.is_notifiable() {
            return Ok(());
        }
        let value = serde_json::to_string(setting)?;
        self.store.set(&Self::prayer_key(prayer), &value)
    }

    /// Global switch gating all scheduling. Defaults to on.
    pub fn notifications_enabled(&self) -> bool {
        match self.store.get(NOTIFICATIONS_ENABLED_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<bool>(&raw).unwrap_or_else(|e| {
                tracing::warn!("Corrupt {} ({}), assuming enabled", NOTIFICATIONS_ENABLED_KEY, e);
                true
            }),
            Ok(None) => true,
            Err(e) => {
                tracing::error!("Failed to read {}: {}", NOTIFICATIONS_ENABLED_KEY, e);
                true
            }
        }
    }

    pub fn set_notifications_enabled(&self, enabled: bool) -> Result<()> {
        self.store
            .set(NOTIFICATIONS_ENABLED_KEY, &serde_json::to_string(&enabled)?)?;
        tracing::info!("Notifications globally {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::storage::{JsonFileStore, MemoryStore};
    use tempfile::TempDir;

    fn create_test_store() -> (SettingsStore, Arc<MemoryStore>) {
        let backing = Arc::new(MemoryStore::new());
        (SettingsStore::new(backing.clone()), backing)
    }

    #[test]
    fn test_missing_record_returns_default_without_writing() {
        let (store, backing) = create_test_store();
        backing
            .set(
                "notifications.prayer.fajr",
                r#"{"enabled":false,"leadMinutes":20,"soundId":"soft"}"#,
            )
            .unwrap();

        let settings = store.get_settings();

        assert_eq!(
            settings.get(PrayerId::Asr),
            NotificationSetting {
                enabled: true,
                lead_minutes: 10,
                sound_id: "adhan".to_string(),
            }
        );
        assert!(!settings.get(PrayerId::Fajr).enabled);
        assert_eq!(backing.keys().unwrap(), vec!["notifications.prayer.fajr".to_string()]);
    }

    #[test]
    fn test_corrupt_record_falls_back_to_default() {
        let (store, backing) = create_test_store();
        backing.set("notifications.prayer.isha", "{lead: ten}").unwrap();

        assert_eq!(store.get_setting(PrayerId::Isha), NotificationSetting::default());
    }

    #[test]
    fn test_out_of_range_stored_lead_falls_back_to_default() {
        let (store, backing) = create_test_store();
        backing
            .set("notifications.prayer.asr", r#"{"leadMinutes":900}"#)
            .unwrap();

        assert_eq!(store.get_setting(PrayerId::Asr), NotificationSetting::default());
    }

    #[test]
    fn test_update_rejects_invalid_lead_time() {
        let (store, backing) = create_test_store();
        let setting = NotificationSetting {
            lead_minutes: 600,
            ..NotificationSetting::default()
        };

        let result = store.update_setting(PrayerId::Dhuhr, &setting);

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(backing.keys().unwrap().is_empty());
    }

    #[test]
    fn test_global_switch_defaults_on() {
        let (store, backing) = create_test_store();
        assert!(store.notifications_enabled());

        store.set_notifications_enabled(false).unwrap();
        assert!(!store.notifications_enabled());

        backing.set(NOTIFICATIONS_ENABLED_KEY, "maybe").unwrap();
        assert!(store.notifications_enabled());
    }

    #[test]
    fn test_settings_persistence() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");

        {
            let store = SettingsStore::new(Arc::new(JsonFileStore::open(&path).unwrap()));
            let mut settings = store.get_settings();
            settings.set(
                PrayerId::Maghrib,
                NotificationSetting {
                    enabled: false,
                    lead_minutes: 0,
                    sound_id: "beep".to_string(),
                },
            );
            store.save_settings(&settings).unwrap();
        }

        let store = SettingsStore::new(Arc::new(JsonFileStore::open(&path).unwrap()));
        let loaded = store.get_setting(PrayerId::Maghrib);
        assert!(!loaded.enabled);
        assert_eq!(loaded.lead_minutes, 0);
        assert_eq!(loaded.sound_id, "beep");
        assert_eq!(store.get_setting(PrayerId::Fajr), NotificationSetting::default());
    }
}
