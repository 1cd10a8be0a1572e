//! Wall-clock access
//!
//! Prayer times are local clock times, so the scheduler reasons in naive
//! local date-times and converts to an instant only when arming.

use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use parking_lot::Mutex;

pub trait Clock: Send + Sync {
    /// Current local date and time
    fn now(&self) -> NaiveDateTime;
}

/// The system's local clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}

/// Milliseconds since the Unix epoch for a local wall-clock time.
///
/// Ambiguous times (clocks turned back) take the earlier instant; times that
/// don't exist (clocks turned forward) are pushed past the gap.
pub fn local_epoch_millis(local: NaiveDateTime) -> i64 {
    let resolved = Local
        .from_local_datetime(&local)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(local + chrono::Duration::hours(1)))
                .earliest()
        });
    match resolved {
        Some(dt) => dt.timestamp_millis(),
        None => Utc.from_utc_datetime(&local).timestamp_millis(),
    }
}
