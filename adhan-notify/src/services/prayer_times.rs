//! Prayer time provider
//!
//! Serves pre-computed daily prayer times from a static JSON file keyed by
//! date. No astronomical calculation happens here.

use crate::clock::Clock;
use crate::config::Locale;
use crate::error::{AppError, Result};
use crate::i18n;
use crate::models::{parse_hhmm, PrayerId, PrayerTime};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

pub trait PrayerTimeProvider: Send + Sync {
    /// Ordered prayer times for `date`, sunrise included
    fn prayer_times(&self, date: NaiveDate) -> Result<Vec<PrayerTime>>;
}

/// One day of the static timetable: prayer id -> "HH:MM"
type DayTable = BTreeMap<PrayerId, String>;

/// Timetable loaded from `prayer_times.json`:
/// `{ "2026-10-19": { "fajr": "05:12", "sunrise": "06:31", ... } }`
pub struct StaticPrayerTimes {
    days: BTreeMap<NaiveDate, DayTable>,
    locale: Locale,
    clock: Arc<dyn Clock>,
}

impl StaticPrayerTimes {
    pub fn load(path: &Path, locale: Locale, clock: Arc<dyn Clock>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let provider = Self::from_json(&content, locale, clock)?;
        tracing::info!(
            "Loaded prayer times for {} days from {:?}",
            provider.days.len(),
            path
        );
        Ok(provider)
    }

    pub fn from_json(content: &str, locale: Locale, clock: Arc<dyn Clock>) -> Result<Self> {
        let days: BTreeMap<NaiveDate, DayTable> = serde_json::from_str(content)?;
        Ok(Self {
            days,
            locale,
            clock,
        })
    }
}

impl PrayerTimeProvider for StaticPrayerTimes {
    fn prayer_times(&self, date: NaiveDate) -> Result<Vec<PrayerTime>> {
        let table = self
            .days
            .get(&date)
            .ok_or(AppError::PrayerTimesUnavailable(date))?;

        let mut prayers = Vec::with_capacity(table.len());
        for (id, raw) in table {
            prayers.push(PrayerTime {
                id: *id,
                name: i18n::prayer_name(*id, self.locale).to_string(),
                time: parse_hhmm(raw)?,
                is_next: false,
            });
        }

        mark_next(&mut prayers, date, self.clock.now());
        Ok(prayers)
    }
}

/// Flag the first prayer still ahead of `now`. Only today's list gets a flag.
fn mark_next(prayers: &mut [PrayerTime], date: NaiveDate, now: chrono::NaiveDateTime) {
    if date != now.date() {
        return;
    }
    if let Some(next) = prayers.iter_mut().find(|p| p.time > now.time()) {
        next.is_next = true;
    }
}
