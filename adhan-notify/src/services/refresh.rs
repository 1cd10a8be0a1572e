//! Refresh service
//!
//! Keeps the armed notifications in step with the day and with the settings
//! file. A cron job re-runs scheduling periodically, and a file watcher
//! re-runs it when another process edits the settings. Every trigger goes
//! through one channel consumed by a single task, so passes never overlap.

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::services::prayer_times::PrayerTimeProvider;
use crate::services::scheduler::{NotificationScheduler, ScheduleReport};
use crate::storage::JsonFileStore;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

/// Why a scheduling pass was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Periodic tick: reload the day's prayer times
    Tick,
    /// The settings file changed on disk
    SettingsChanged,
    /// Settings or permission were changed through this process
    SettingsEdited,
}

type Reply = oneshot::Sender<Result<ScheduleReport>>;

/// A queued trigger, with an optional waiter for the pass's outcome
struct RefreshRequest {
    trigger: RefreshTrigger,
    reply: Option<Reply>,
}

impl RefreshRequest {
    fn detached(trigger: RefreshTrigger) -> Self {
        Self {
            trigger,
            reply: None,
        }
    }
}

pub struct RefreshService {
    cron: Arc<RwLock<JobScheduler>>,
    current_job_id: Arc<RwLock<Option<Uuid>>>,
    notifications: Arc<NotificationScheduler>,
    provider: Arc<dyn PrayerTimeProvider>,
    clock: Arc<dyn Clock>,
    settings_file: Option<Arc<JsonFileStore>>,
    watcher: parking_lot::Mutex<Option<RecommendedWatcher>>,
    trigger_tx: mpsc::UnboundedSender<RefreshRequest>,
    trigger_rx: tokio::sync::Mutex<Option<mpsc::UnboundedReceiver<RefreshRequest>>>,
}

impl RefreshService {
    pub async fn new(
        notifications: Arc<NotificationScheduler>,
        provider: Arc<dyn PrayerTimeProvider>,
        clock: Arc<dyn Clock>,
        settings_file: Option<Arc<JsonFileStore>>,
    ) -> Result<Self> {
        let cron = JobScheduler::new().await?;
        cron.start().await?;
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();

        Ok(Self {
            cron: Arc::new(RwLock::new(cron)),
            current_job_id: Arc::new(RwLock::new(None)),
            notifications,
            provider,
            clock,
            settings_file,
            watcher: parking_lot::Mutex::new(None),
            trigger_tx,
            trigger_rx: tokio::sync::Mutex::new(Some(trigger_rx)),
        })
    }

    /// Queue a pass without waiting for it
    pub fn trigger(&self, trigger: RefreshTrigger) -> Result<()> {
        self.trigger_tx
            .send(RefreshRequest::detached(trigger))
            .map_err(|_| AppError::Generic("Refresh loop has stopped".to_string()))
    }

    /// Queue a pass and wait for its report. Needs `run()` to be running.
    pub async fn request(&self, trigger: RefreshTrigger) -> Result<ScheduleReport> {
        let (reply, outcome) = oneshot::channel();
        self.trigger_tx
            .send(RefreshRequest {
                trigger,
                reply: Some(reply),
            })
            .map_err(|_| AppError::Generic("Refresh loop has stopped".to_string()))?;
        outcome
            .await
            .map_err(|_| AppError::Generic("Refresh loop dropped the request".to_string()))?
    }

    /// Load today's prayer times and arm them from scratch
    pub async fn reschedule_today(&self) -> Result<ScheduleReport> {
        let today = self.clock.now().date();
        let prayers = self.provider.prayer_times(today)?;
        self.notifications.cancel_all().await?;
        self.notifications.schedule_all(&prayers).await
    }

    /// Start the periodic tick on `cron_expr` (six fields, seconds first)
    pub async fn start(&self, cron_expr: &str) -> Result<()> {
        self.stop_tick().await?;

        let tx = self.trigger_tx.clone();
        let job = Job::new_async(cron_expr, move |_uuid, _l| {
            let tx = tx.clone();
            Box::pin(async move {
                if tx.send(RefreshRequest::detached(RefreshTrigger::Tick)).is_err() {
                    tracing::warn!("Refresh loop has stopped, dropping tick");
                }
            })
        })?;
        let job_id = job.guid();

        self.cron.write().await.add(job).await?;
        *self.current_job_id.write().await = Some(job_id);

        tracing::info!("Refresh tick scheduled ({})", cron_expr);
        Ok(())
    }

    async fn stop_tick(&self) -> Result<()> {
        let mut current_job = self.current_job_id.write().await;
        if let Some(job_id) = *current_job {
            self.cron.write().await.remove(&job_id).await?;
            *current_job = None;
            tracing::info!("Refresh tick cancelled");
        }
        Ok(())
    }

    /// Watch the settings file for changes made by other processes
    pub fn watch_settings(&self, settings_path: &Path) -> Result<()> {
        let mut slot = self.watcher.lock();
        if slot.is_some() {
            return Ok(());
        }

        let dir = settings_path
            .parent()
            .ok_or_else(|| AppError::Generic(format!("No parent for {:?}", settings_path)))?
            .to_path_buf();
        let file_name = settings_path.file_name().map(|n| n.to_os_string());
        let tx = self.trigger_tx.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    let touches_settings = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if touches_settings && (event.kind.is_modify() || event.kind.is_create()) {
                        tracing::debug!(?event, "settings file change detected");
                        let _ = tx.send(RefreshRequest::detached(RefreshTrigger::SettingsChanged));
                    }
                }
                Err(e) => tracing::warn!("Settings watch error: {}", e),
            }
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        *slot = Some(watcher);

        tracing::info!("Watching {:?} for settings changes", settings_path);
        Ok(())
    }

    /// Consume triggers for as long as the service lives. Call once.
    pub async fn run(&self) -> Result<()> {
        let mut rx = self
            .trigger_rx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::Generic("Refresh loop already running".to_string()))?;

        while let Some(first) = rx.recv().await {
            // Collapse bursts, e.g. several filesystem events for one save
            let mut batch = vec![first];
            while let Ok(next) = rx.try_recv() {
                batch.push(next);
            }
            let tick = batch.iter().any(|r| r.trigger == RefreshTrigger::Tick);
            let reload = batch
                .iter()
                .any(|r| r.trigger == RefreshTrigger::SettingsChanged);

            let outcome = self.handle(tick, reload).await;
            if let Err(e) = &outcome {
                tracing::error!("Refresh failed: {}", e);
            }
            for reply in batch.into_iter().filter_map(|r| r.reply) {
                let shared = match &outcome {
                    Ok(report) => Ok(report.clone()),
                    Err(e) => Err(AppError::Scheduling(e.to_string())),
                };
                // The waiter may have given up
                let _ = reply.send(shared);
            }
        }
        Ok(())
    }

    async fn handle(&self, tick: bool, reload: bool) -> Result<ScheduleReport> {
        if reload {
            if let Some(store) = &self.settings_file {
                store.reload()?;
            }
        }

        let report = if tick {
            self.reschedule_today().await?
        } else {
            self.notifications.refresh().await?
        };
        tracing::info!(
            "Refresh complete: {} armed, {} failed",
            report.armed.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Stop the tick and the watcher
    pub async fn shutdown(&self) -> Result<()> {
        self.stop_tick().await?;
        self.watcher.lock().take();
        self.cron.write().await.shutdown().await?;
        tracing::info!("Refresh service shutdown");
        Ok(())
    }
}
