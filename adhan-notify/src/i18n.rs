//! Localized prayer names and notification text

use crate::config::Locale;
use crate::models::PrayerId;

pub fn prayer_name(prayer: PrayerId, locale: Locale) -> &'static str {
    match locale {
        Locale::En => match prayer {
            PrayerId::Fajr => "Fajr",
            PrayerId::Sunrise => "Sunrise",
            PrayerId::Dhuhr => "Dhuhr",
            PrayerId::Asr => "Asr",
            PrayerId::Maghrib => "Maghrib",
            PrayerId::Isha => "Isha",
        },
        Locale::Ar => match prayer {
            PrayerId::Fajr => "الفجر",
            PrayerId::Sunrise => "الشروق",
            PrayerId::Dhuhr => "الظهر",
            PrayerId::Asr => "العصر",
            PrayerId::Maghrib => "المغرب",
            PrayerId::Isha => "العشاء",
        },
    }
}

pub fn notification_title(prayer_name: &str, locale: Locale) -> String {
    match locale {
        Locale::En => format!("{} prayer", prayer_name),
        Locale::Ar => format!("صلاة {}", prayer_name),
    }
}

/// Message body; a zero lead time announces the prayer itself
pub fn notification_body(prayer_name: &str, minutes_remaining: u32, locale: Locale) -> String {
    match (locale, minutes_remaining) {
        (Locale::En, 0) => format!("It's time for {}", prayer_name),
        (Locale::En, 1) => format!("{} in 1 minute", prayer_name),
        (Locale::En, n) => format!("{} in {} minutes", prayer_name, n),
        (Locale::Ar, 0) => format!("حان الآن وقت صلاة {}", prayer_name),
        (Locale::Ar, n) => format!("بقي {} دقيقة على صلاة {}", n, prayer_name),
    }
}
