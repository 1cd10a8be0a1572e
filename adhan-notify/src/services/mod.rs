//! Services module
//!
//! Business logic services that coordinate between commands, storage and
//! the platform adapters.

pub mod permission;
pub mod prayer_times;
pub mod refresh;
pub mod scheduler;
pub mod settings;
pub mod sounds;

pub use permission::{PermissionFlag, PermissionGateway};
pub use prayer_times::{PrayerTimeProvider, StaticPrayerTimes};
pub use refresh::{RefreshService, RefreshTrigger};
pub use scheduler::{fire_time, NotificationScheduler, ScheduleReport};
pub use settings::SettingsStore;
pub use sounds::{resolve as resolve_sound, Sound};
