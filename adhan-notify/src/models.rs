//! Domain models
//!
//! Prayer times, per-prayer notification preferences and the records the
//! scheduler keeps for armed notifications.

use crate::config::{DEFAULT_LEAD_MINUTES, DEFAULT_SOUND_ID, MAX_LEAD_MINUTES};
use crate::error::{AppError, Result};
use crate::services::sounds::Sound;
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The six daily times. Variant order is the order of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrayerId {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl PrayerId {
    pub const ALL: [PrayerId; 6] = [
        PrayerId::Fajr,
        PrayerId::Sunrise,
        PrayerId::Dhuhr,
        PrayerId::Asr,
        PrayerId::Maghrib,
        PrayerId::Isha,
    ];

    /// Prayers that can carry a notification, in scheduling order.
    /// Sunrise is a time marker, not a prayer.
    pub const NOTIFIABLE: [PrayerId; 5] = [
        PrayerId::Fajr,
        PrayerId::Dhuhr,
        PrayerId::Asr,
        PrayerId::Maghrib,
        PrayerId::Isha,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrayerId::Fajr => "fajr",
            PrayerId::Sunrise => "sunrise",
            PrayerId::Dhuhr => "dhuhr",
            PrayerId::Asr => "asr",
            PrayerId::Maghrib => "maghrib",
            PrayerId::Isha => "isha",
        }
    }

    pub fn is_notifiable(self) -> bool {
        self != PrayerId::Sunrise
    }
}

impl fmt::Display for PrayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrayerId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        PrayerId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| AppError::Generic(format!("Unknown prayer id: {}", s)))
    }
}

/// One prayer time for a given day, as returned by the prayer time provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerTime {
    pub id: PrayerId,
    /// Localized display name
    pub name: String,
    /// Local wall-clock time, "HH:MM" on the wire
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    #[serde(rename = "isNext", default)]
    pub is_next: bool,
}

impl PrayerTime {
    pub fn new(id: PrayerId, name: impl Into<String>, time: &str) -> Result<Self> {
        Ok(Self {
            id,
            name: name.into(),
            time: parse_hhmm(time)?,
            is_next: false,
        })
    }
}

/// Parse a 24-hour "HH:MM" clock time
pub fn parse_hhmm(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| AppError::InvalidTime(format!("{:?}: {}", value, e)))
}

pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_hhmm(&raw).map_err(serde::de::Error::custom)
    }
}

/// Per-prayer notification preference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSetting {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_lead_minutes")]
    pub lead_minutes: u32,
    #[serde(default = "default_sound_id")]
    pub sound_id: String,
}

fn default_enabled() -> bool {
    true
}

fn default_lead_minutes() -> u32 {
    DEFAULT_LEAD_MINUTES
}

fn default_sound_id() -> String {
    DEFAULT_SOUND_ID.to_string()
}

impl Default for NotificationSetting {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            lead_minutes: default_lead_minutes(),
            sound_id: default_sound_id(),
        }
    }
}

impl NotificationSetting {
    pub fn validate(&self) -> Result<()> {
        if self.lead_minutes > MAX_LEAD_MINUTES {
            return Err(AppError::Validation(format!(
                "lead time {} exceeds maximum of {} minutes",
                self.lead_minutes, MAX_LEAD_MINUTES
            )));
        }
        Ok(())
    }
}

/// Preferences for every notifiable prayer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationSettings(BTreeMap<PrayerId, NotificationSetting>);

impl NotificationSettings {
    /// Every notifiable prayer with the default preference
    pub fn defaults() -> Self {
        Self(
            PrayerId::NOTIFIABLE
                .into_iter()
                .map(|id| (id, NotificationSetting::default()))
                .collect(),
        )
    }

    /// Preference for a prayer; the default when none is recorded
    pub fn get(&self, prayer: PrayerId) -> NotificationSetting {
        self.0.get(&prayer).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, prayer: PrayerId, setting: NotificationSetting) {
        if prayer.is_notifiable() {
            self.0.insert(prayer, setting);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PrayerId, &NotificationSetting)> {
        self.0.iter().map(|(id, setting)| (*id, setting))
    }
}

/// Opaque platform identifier of an armed notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKey {
    /// In-process timer id
    Timer(u64),
    /// Identifier assigned by the OS notification subsystem
    Os(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationHandle {
    pub prayer_id: PrayerId,
    pub key: HandleKey,
}

/// What gets shown and played when a notification fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    pub prayer_id: PrayerId,
    pub title: String,
    pub body: String,
    pub sound: Sound,
    pub minutes_remaining: u32,
    pub vibration: Vec<u64>,
}

/// An armed notification, owned by the scheduler registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledNotification {
    pub prayer_id: PrayerId,
    /// Local wall-clock fire time
    pub fire_at: NaiveDateTime,
    pub fire_at_epoch_millis: i64,
    pub sound: Sound,
    pub handle: NotificationHandle,
}
