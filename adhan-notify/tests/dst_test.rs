//! Daylight saving transitions
//!
//! Every test here pins the process time zone to US Eastern, whose clocks
//! jump from 02:00 to 03:00 on 2026-03-08. This file is its own test binary,
//! so the zone never leaks into other tests.

use adhan_notify::clock::{local_epoch_millis, FixedClock};
use adhan_notify::config::Locale;
use adhan_notify::error::Result;
use adhan_notify::models::{NotificationPayload, PrayerId, PrayerTime};
use adhan_notify::platform::{
    AlertSink, ArmRequest, AudioPlayer, Delivery, NotificationAdapter, TimerAdapter,
};
use adhan_notify::services::{NotificationScheduler, PermissionFlag, SettingsStore, Sound};
use adhan_notify::storage::MemoryStore;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

fn use_eastern_time() {
    std::env::set_var("TZ", "EST5EDT,M3.2.0,M11.1.0");
}

fn spring_forward_at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 8)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

#[derive(Default)]
struct CountingSink {
    shown: Mutex<usize>,
}

#[async_trait]
impl AlertSink for CountingSink {
    async fn show(&self, _title: &str, _body: &str) -> Result<()> {
        *self.shown.lock() += 1;
        Ok(())
    }

    async fn vibrate(&self, _pattern: &[u64]) -> Result<()> {
        Ok(())
    }
}

struct Mute;

#[async_trait]
impl AudioPlayer for Mute {
    async fn play(&self, _sound: Sound) -> Result<()> {
        Ok(())
    }
}

#[test]
fn test_lost_hour_is_not_counted() {
    use_eastern_time();

    let before = local_epoch_millis(spring_forward_at(1, 30));
    let after = local_epoch_millis(spring_forward_at(5, 2));

    assert_eq!(after - before, 152 * 60 * 1000);
}

#[tokio::test(start_paused = true)]
async fn test_timer_fires_on_time_across_spring_forward() {
    use_eastern_time();
    let clock = Arc::new(FixedClock::new(spring_forward_at(1, 30)));
    let sink = Arc::new(CountingSink::default());
    let adapter = TimerAdapter::new(Delivery::new(sink.clone(), Arc::new(Mute)), clock);

    adapter
        .schedule(ArmRequest {
            fire_at: spring_forward_at(5, 2),
            payload: NotificationPayload {
                prayer_id: PrayerId::Fajr,
                title: "Fajr prayer".to_string(),
                body: "Fajr in 10 minutes".to_string(),
                sound: Sound::Adhan,
                minutes_remaining: 10,
                vibration: vec![],
            },
        })
        .await
        .unwrap();

    // 152 real minutes, though the wall clock moves 3h32m
    tokio::time::sleep(Duration::from_secs(151 * 60)).await;
    assert_eq!(*sink.shown.lock(), 0);

    tokio::time::sleep(Duration::from_secs(2 * 60)).await;
    assert_eq!(*sink.shown.lock(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_arms_fajr_ahead_on_spring_forward_night() {
    use_eastern_time();
    let now = spring_forward_at(1, 30);
    let clock = Arc::new(FixedClock::new(now));
    let sink = Arc::new(CountingSink::default());
    let adapter = Arc::new(TimerAdapter::new(
        Delivery::new(sink.clone(), Arc::new(Mute)),
        clock.clone(),
    ));
    let scheduler = NotificationScheduler::new(
        adapter,
        SettingsStore::new(Arc::new(MemoryStore::new())),
        Arc::new(PermissionFlag::new(true)),
        clock,
        Locale::En,
    );

    let prayers = vec![PrayerTime::new(PrayerId::Fajr, "Fajr", "05:12").unwrap()];
    let report = scheduler.schedule_all(&prayers).await.unwrap();
    assert_eq!(report.armed, vec![PrayerId::Fajr]);

    let armed = scheduler.armed().await;
    assert_eq!(armed.len(), 1);
    assert!(armed[0].fire_at > now);
    assert_eq!(armed[0].fire_at, spring_forward_at(5, 2));
    assert_eq!(
        armed[0].fire_at_epoch_millis - local_epoch_millis(now),
        152 * 60 * 1000
    );

    tokio::time::sleep(Duration::from_secs(153 * 60)).await;
    assert_eq!(*sink.shown.lock(), 1);
}
