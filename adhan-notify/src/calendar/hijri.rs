//! Islamic (Hijri) calendar approximation
//!
//! Uses the tabular calendar: 30-year cycles with 11 leap years, civil
//! epoch 16 July 622. It can differ by a day or two from dates fixed by
//! moon sighting.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

/// Julian day number of 0000-12-31 (chrono's day zero)
const JDN_CE_OFFSET: i64 = 1_721_425;
/// Julian day number of 1 Muharram 1 AH (civil epoch)
const HIJRI_EPOCH_JDN: i64 = 1_948_440;

const MONTH_NAMES: [&str; 12] = [
    "Muharram",
    "Safar",
    "Rabi' al-Awwal",
    "Rabi' al-Thani",
    "Jumada al-Ula",
    "Jumada al-Akhirah",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qa'dah",
    "Dhu al-Hijjah",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct HijriDate {
    pub year: i64,
    /// 1-based
    pub month: u32,
    pub day: u32,
}

impl HijriDate {
    pub fn from_gregorian(date: NaiveDate) -> Self {
        let jdn = i64::from(date.num_days_from_ce()) + JDN_CE_OFFSET;

        let mut l = jdn - HIJRI_EPOCH_JDN + 10632;
        let n = (l - 1) / 10631;
        l = l - 10631 * n + 354;
        let j = ((10985 - l) / 5316) * ((50 * l) / 17719) + (l / 5670) * ((43 * l) / 15238);
        l = l - ((30 - j) / 15) * ((17719 * j) / 50) - (j / 16) * ((15238 * j) / 43) + 29;
        let month = (24 * l) / 709;
        let day = l - (709 * month) / 24;
        let year = 30 * n + j - 30;

        Self {
            year,
            month: month as u32,
            day: day as u32,
        }
    }

    pub fn to_gregorian(self) -> Option<NaiveDate> {
        let (y, m, d) = (self.year, i64::from(self.month), i64::from(self.day));
        let jdn = (11 * y + 3) / 30 + 354 * y + 30 * m - (m - 1) / 2 + d + HIJRI_EPOCH_JDN - 385;
        NaiveDate::from_num_days_from_ce_opt(i32::try_from(jdn - JDN_CE_OFFSET).ok()?)
    }

    pub fn month_name(self) -> &'static str {
        MONTH_NAMES[(self.month.clamp(1, 12) - 1) as usize]
    }

    pub fn is_ramadan(self) -> bool {
        self.month == 9
    }
}

impl fmt::Display for HijriDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} AH", self.day, self.month_name(), self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_known_dates() {
        assert_eq!(
            HijriDate::from_gregorian(date(2025, 3, 1)),
            HijriDate { year: 1446, month: 9, day: 1 }
        );
        assert_eq!(
            HijriDate::from_gregorian(date(2000, 1, 1)),
            HijriDate { year: 1420, month: 9, day: 24 }
        );
        assert_eq!(
            HijriDate::from_gregorian(date(622, 7, 19)),
            HijriDate { year: 1, month: 1, day: 1 }
        );
    }

    #[test]
    fn test_round_trip_over_a_cycle() {
        let mut day = date(2020, 1, 1);
        while day < date(2031, 1, 1) {
            let hijri = HijriDate::from_gregorian(day);
            assert_eq!(hijri.to_gregorian(), Some(day), "{}", hijri);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_display() {
        let hijri = HijriDate::from_gregorian(date(2026, 10, 19));
        assert_eq!(hijri.to_string(), "7 Jumada al-Ula 1448 AH");
        assert!(!hijri.is_ramadan());
    }
}
