//! Sound resolver
//!
//! Maps stored sound preferences, including legacy ids written by older
//! releases, to the canonical sound that is actually played.

use serde::Serialize;
use std::fmt;

/// Canonical notification sounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sound {
    Adhan,
    Soft,
    Beep,
    Silent,
}

/// Sound used for missing, corrupted or unrecognized preferences
pub const DEFAULT_SOUND: Sound = Sound::Adhan;

const ALIASES: &[(&str, Sound)] = &[
    ("adhan", Sound::Adhan),
    ("adhan-traditional", Sound::Adhan),
    ("traditional_adhan", Sound::Adhan),
    ("makkah_adhan", Sound::Adhan),
    ("makkah", Sound::Adhan),
    ("default", Sound::Adhan),
    ("soft", Sound::Soft),
    ("adhan-soft", Sound::Soft),
    ("soft_adhan", Sound::Soft),
    ("gentle", Sound::Soft),
    ("beep", Sound::Beep),
    ("notification", Sound::Beep),
    ("chime", Sound::Beep),
    ("silent", Sound::Silent),
    ("none", Sound::Silent),
    ("mute", Sound::Silent),
];

impl Sound {
    pub const ALL: [Sound; 4] = [Sound::Adhan, Sound::Soft, Sound::Beep, Sound::Silent];

    /// Canonical id
    pub fn as_str(self) -> &'static str {
        match self {
            Sound::Adhan => "adhan",
            Sound::Soft => "soft",
            Sound::Beep => "beep",
            Sound::Silent => "silent",
        }
    }

    /// Audio resource backing this sound, `None` when nothing should play
    pub fn file_name(self) -> Option<&'static str> {
        match self {
            Sound::Adhan => Some("adhan.mp3"),
            Sound::Soft => Some("soft.mp3"),
            Sound::Beep => Some("beep.mp3"),
            Sound::Silent => None,
        }
    }
}

impl fmt::Display for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve any stored sound id to a canonical sound.
///
/// Never fails: an unknown id degrades to [`DEFAULT_SOUND`] so a bad
/// preference can't stop a notification from firing.
pub fn resolve(sound_id: &str) -> Sound {
    let normalized = sound_id.trim().to_lowercase();
    match ALIASES.iter().find(|(alias, _)| *alias == normalized) {
        Some((_, sound)) => *sound,
        None => {
            tracing::debug!("Unknown sound id {:?}, using {}", sound_id, DEFAULT_SOUND);
            DEFAULT_SOUND
        }
    }
}

/// Canonical ids offered to settings screens
pub fn known_sound_ids() -> Vec<&'static str> {
    Sound::ALL.iter().map(|s| s.as_str()).collect()
}
