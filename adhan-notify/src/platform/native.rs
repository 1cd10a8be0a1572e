//! OS-level scheduled notifications
//!
//! The OS assigns the notification id, so the adapter can't know it ahead of
//! time and can't trust ids remembered from a previous run. Every entry is
//! tagged with its prayer id instead, and cancellation asks the host what is
//! pending and removes the entries carrying that tag.

use super::{ArmRequest, Capabilities, NotificationAdapter};
use crate::config::NATIVE_JOB_MARKER;
use crate::error::{AppError, Result};
use crate::models::{HandleKey, NotificationHandle, NotificationPayload, PrayerId};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Notification handed to the OS
#[derive(Debug, Clone)]
pub struct OsNotification {
    pub fire_at: NaiveDateTime,
    pub payload: NotificationPayload,
}

/// Entry in the OS queue. `prayer_id` is `None` for entries we didn't create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsPending {
    pub id: i64,
    pub prayer_id: Option<PrayerId>,
}

/// The device-side notification scheduler
#[async_trait]
pub trait NativeHost: Send + Sync {
    async fn schedule(&self, notification: &OsNotification) -> Result<i64>;
    async fn pending(&self) -> Result<Vec<OsPending>>;
    async fn cancel(&self, ids: &[i64]) -> Result<()>;
}

pub struct NativeAdapter<H: NativeHost> {
    host: H,
}

impl<H: NativeHost> NativeAdapter<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    async fn cancel_matching(&self, wanted: impl Fn(PrayerId) -> bool + Send) -> Result<usize> {
        let ids: Vec<i64> = self
            .host
            .pending()
            .await?
            .into_iter()
            .filter(|entry| entry.prayer_id.is_some_and(&wanted))
            .map(|entry| entry.id)
            .collect();
        if !ids.is_empty() {
            self.host.cancel(&ids).await?;
        }
        Ok(ids.len())
    }
}

#[async_trait]
impl<H: NativeHost> NotificationAdapter for NativeAdapter<H> {
    async fn schedule(&self, request: ArmRequest) -> Result<NotificationHandle> {
        let prayer_id = request.payload.prayer_id;
        let notification = OsNotification {
            fire_at: request.fire_at,
            payload: request.payload,
        };
        let id = self.host.schedule(&notification).await?;

        tracing::debug!("OS accepted {} notification as #{}", prayer_id, id);
        Ok(NotificationHandle {
            prayer_id,
            key: HandleKey::Os(id),
        })
    }

    async fn cancel(&self, handle: &NotificationHandle) -> Result<()> {
        let prayer_id = handle.prayer_id;
        let removed = self.cancel_matching(|p| p == prayer_id).await?;
        if removed > 0 {
            tracing::debug!("Removed {} OS entries for {}", removed, prayer_id);
        }
        Ok(())
    }

    async fn cancel_all(&self) -> Result<()> {
        let removed = self.cancel_matching(|_| true).await?;
        if removed > 0 {
            tracing::debug!("Removed {} OS entries", removed);
        }
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<NotificationHandle>> {
        let mut handles: Vec<_> = self
            .host
            .pending()
            .await?
            .into_iter()
            .filter_map(|entry| {
                entry.prayer_id.map(|prayer_id| NotificationHandle {
                    prayer_id,
                    key: HandleKey::Os(entry.id),
                })
            })
            .collect();
        handles.sort_by_key(|h| h.prayer_id);
        Ok(handles)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities { persistent: true }
    }
}

/// Schedules notifications through the system `at` queue.
///
/// Each job runs the notifier and the audio player at fire time, whether or
/// not this process is still alive.
#[derive(Debug, Clone)]
pub struct AtHost {
    notifier: String,
    audio_player: String,
    sounds_dir: PathBuf,
}

impl AtHost {
    pub fn new(
        notifier: impl Into<String>,
        audio_player: impl Into<String>,
        sounds_dir: PathBuf,
    ) -> Self {
        Self {
            notifier: notifier.into(),
            audio_player: audio_player.into(),
            sounds_dir,
        }
    }

    /// Whether the `at` daemon answers on this host
    pub async fn is_available(&self) -> bool {
        match Command::new("atq").stdout(Stdio::null()).stderr(Stdio::null()).status().await {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::debug!("atq unavailable: {}", e);
                false
            }
        }
    }

    fn job_script(&self, notification: &OsNotification) -> String {
        let payload = &notification.payload;
        let mut script = format!(
            "{}{}\n{} {} {}\n",
            NATIVE_JOB_MARKER,
            payload.prayer_id,
            self.notifier,
            shell_quote(&payload.title),
            shell_quote(&payload.body),
        );
        if let Some(file) = payload.sound.file_name() {
            let path = self.sounds_dir.join(file);
            script.push_str(&format!(
                "{} {}\n",
                self.audio_player,
                shell_quote(&path.to_string_lossy())
            ));
        }
        script
    }

    async fn job_prayer(&self, id: i64) -> Result<Option<PrayerId>> {
        let output = Command::new("at").arg("-c").arg(id.to_string()).output().await?;
        if !output.status.success() {
            // Job ran or was removed between atq and now
            return Ok(None);
        }
        Ok(parse_marker(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[async_trait]
impl NativeHost for AtHost {
    async fn schedule(&self, notification: &OsNotification) -> Result<i64> {
        let mut child = Command::new("at")
            .arg("-t")
            .arg(notification.fire_at.format("%Y%m%d%H%M").to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(self.job_script(notification).as_bytes())
                .await?;
        }

        let output = child.wait_with_output().await?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(AppError::Scheduling(format!("at rejected job: {}", stderr.trim())));
        }
        parse_job_id(&stderr)
            .ok_or_else(|| AppError::Scheduling(format!("unrecognized at output: {}", stderr.trim())))
    }

    async fn pending(&self) -> Result<Vec<OsPending>> {
        let output = Command::new("atq").output().await?;
        if !output.status.success() {
            return Err(AppError::Scheduling(format!(
                "atq failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mut entries = Vec::new();
        for id in parse_atq(&String::from_utf8_lossy(&output.stdout)) {
            entries.push(OsPending {
                id,
                prayer_id: self.job_prayer(id).await?,
            });
        }
        Ok(entries)
    }

    async fn cancel(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let output = Command::new("atrm")
            .args(ids.iter().map(|id| id.to_string()))
            .output()
            .await?;
        if !output.status.success() {
            // atrm fails on jobs that already ran; nothing left to cancel
            tracing::debug!(
                "atrm reported: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// `at` prints "job 12 at Mon Oct 19 05:02:00 2026" on stderr
fn parse_job_id(output: &str) -> Option<i64> {
    output.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("job ")?;
        rest.split_whitespace().next()?.parse().ok()
    })
}

/// Job ids from `atq`, one job per line, id first
fn parse_atq(output: &str) -> Vec<i64> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next()?.parse().ok())
        .collect()
}

fn parse_marker(script: &str) -> Option<PrayerId> {
    script
        .lines()
        .find_map(|line| line.trim().strip_prefix(NATIVE_JOB_MARKER))
        .and_then(|id| id.parse().ok())
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Host that keeps its queue in memory, for embedding and tests.
/// Ids are assigned the way an OS would: increasing, never reused.
#[derive(Debug, Default)]
pub struct MemoryHost {
    queue: Mutex<Vec<(i64, OsNotification)>>,
    next_id: Mutex<i64>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an entry in the queue that this crate did not create
    pub fn insert_foreign(&self, notification: OsNotification) -> i64 {
        let id = self.allocate();
        self.queue.lock().push((-id, notification));
        -id
    }

    pub fn queued(&self) -> Vec<(i64, OsNotification)> {
        self.queue.lock().clone()
    }

    fn allocate(&self) -> i64 {
        let mut next = self.next_id.lock();
        *next += 1;
        *next
    }
}

#[async_trait]
impl NativeHost for MemoryHost {
    async fn schedule(&self, notification: &OsNotification) -> Result<i64> {
        let id = self.allocate();
        self.queue.lock().push((id, notification.clone()));
        Ok(id)
    }

    async fn pending(&self) -> Result<Vec<OsPending>> {
        Ok(self
            .queue
            .lock()
            .iter()
            .map(|(id, n)| OsPending {
                id: *id,
                // negative ids stand in for other applications' entries
                prayer_id: (*id > 0).then_some(n.payload.prayer_id),
            })
            .collect())
    }

    async fn cancel(&self, ids: &[i64]) -> Result<()> {
        self.queue.lock().retain(|(id, _)| !ids.contains(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sounds::Sound;
    use chrono::NaiveDate;

    fn notification(prayer_id: PrayerId, sound: Sound) -> OsNotification {
        OsNotification {
            fire_at: NaiveDate::from_ymd_opt(2026, 10, 19)
                .unwrap()
                .and_hms_opt(5, 2, 0)
                .unwrap(),
            payload: NotificationPayload {
                prayer_id,
                title: "Fajr prayer".to_string(),
                body: "It's time for Fajr".to_string(),
                sound,
                minutes_remaining: 10,
                vibration: vec![],
            },
        }
    }

    fn request(prayer_id: PrayerId) -> ArmRequest {
        let n = notification(prayer_id, Sound::Adhan);
        ArmRequest {
            fire_at: n.fire_at,
            payload: n.payload,
        }
    }

    #[tokio::test]
    async fn test_cancel_matches_by_prayer_not_by_id() {
        let adapter = NativeAdapter::new(MemoryHost::new());
        let fajr = adapter.schedule(request(PrayerId::Fajr)).await.unwrap();
        adapter.schedule(request(PrayerId::Isha)).await.unwrap();
        // a second fajr entry, e.g. left over from a previous run
        adapter.schedule(request(PrayerId::Fajr)).await.unwrap();

        adapter.cancel(&fajr).await.unwrap();

        let remaining: Vec<PrayerId> = adapter
            .pending()
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.prayer_id)
            .collect();
        assert_eq!(remaining, vec![PrayerId::Isha]);
    }

    #[tokio::test]
    async fn test_cancel_all_leaves_foreign_entries() {
        let adapter = NativeAdapter::new(MemoryHost::new());
        for prayer in PrayerId::NOTIFIABLE {
            adapter.schedule(request(prayer)).await.unwrap();
        }
        adapter
            .host()
            .insert_foreign(notification(PrayerId::Fajr, Sound::Beep));

        adapter.cancel_all().await.unwrap();

        assert!(adapter.pending().await.unwrap().is_empty());
        assert_eq!(adapter.host().queued().len(), 1);
        assert!(adapter.capabilities().persistent);
    }

    #[test]
    fn test_parse_at_output() {
        assert_eq!(
            parse_job_id("warning: commands will be executed using /bin/sh\njob 42 at Mon Oct 19 05:02:00 2026\n"),
            Some(42)
        );
        assert_eq!(parse_job_id("garbage"), None);
        assert_eq!(
            parse_atq("7\tMon Oct 19 05:02:00 2026 a user\n12\tMon Oct 19 12:00:00 2026 a user\n"),
            vec![7, 12]
        );
    }

    #[test]
    fn test_job_script_is_tagged_and_quoted() {
        let host = AtHost::new("notify-send", "paplay", PathBuf::from("/opt/sounds"));
        let mut n = notification(PrayerId::Fajr, Sound::Soft);
        n.payload.body = "It's time".to_string();

        let script = host.job_script(&n);

        assert_eq!(parse_marker(&script), Some(PrayerId::Fajr));
        assert!(script.contains(r"'It'\''s time'"));
        assert!(script.contains("paplay '/opt/sounds/soft.mp3'"));

        let silent = host.job_script(&notification(PrayerId::Asr, Sound::Silent));
        assert!(!silent.contains("paplay"));
    }
}
