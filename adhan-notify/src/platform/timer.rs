//! In-process timer adapter

use super::{ArmRequest, Capabilities, Delivery, NotificationAdapter};
use crate::clock::{local_epoch_millis, Clock};
use crate::error::Result;
use crate::models::{HandleKey, NotificationHandle, PrayerId};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;

type TimerMap = HashMap<u64, (PrayerId, AbortHandle)>;

/// Arms one tokio task per notification. Timers die with the process.
pub struct TimerAdapter {
    delivery: Delivery,
    clock: Arc<dyn Clock>,
    timers: Arc<Mutex<TimerMap>>,
    next_id: AtomicU64,
}

impl TimerAdapter {
    pub fn new(delivery: Delivery, clock: Arc<dyn Clock>) -> Self {
        Self {
            delivery,
            clock,
            timers: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }
}

/// Real time between two local wall-clock readings. Measured between
/// instants, so a DST change in between is accounted for.
fn delay_until(now: NaiveDateTime, fire_at: NaiveDateTime) -> Duration {
    let millis = local_epoch_millis(fire_at) - local_epoch_millis(now);
    Duration::from_millis(u64::try_from(millis).unwrap_or(0))
}

#[async_trait]
impl NotificationAdapter for TimerAdapter {
    async fn schedule(&self, request: ArmRequest) -> Result<NotificationHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let prayer_id = request.payload.prayer_id;
        let delay = delay_until(self.clock.now(), request.fire_at);

        let registry = Arc::clone(&self.timers);
        let delivery = self.delivery.clone();
        let payload = request.payload;
        {
            // Hold the map while spawning so the task can't finish and remove
            // itself before it has been registered
            let mut timers = self.timers.lock();
            let task = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                registry.lock().remove(&id);
                delivery.deliver(&payload).await;
            });
            timers.insert(id, (prayer_id, task.abort_handle()));
        }

        tracing::debug!("Armed timer {} for {} in {:?}", id, prayer_id, delay);
        Ok(NotificationHandle {
            prayer_id,
            key: HandleKey::Timer(id),
        })
    }

    async fn cancel(&self, handle: &NotificationHandle) -> Result<()> {
        let HandleKey::Timer(id) = handle.key else {
            tracing::warn!("Ignoring foreign handle {:?}", handle);
            return Ok(());
        };
        if let Some((_, task)) = self.timers.lock().remove(&id) {
            task.abort();
            tracing::debug!("Cancelled timer {} for {}", id, handle.prayer_id);
        }
        Ok(())
    }

    async fn cancel_all(&self) -> Result<()> {
        let drained: Vec<_> = self.timers.lock().drain().collect();
        for (_, (_, task)) in &drained {
            task.abort();
        }
        if !drained.is_empty() {
            tracing::debug!("Cancelled {} timers", drained.len());
        }
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<NotificationHandle>> {
        let mut handles: Vec<_> = self
            .timers
            .lock()
            .iter()
            .map(|(id, (prayer_id, _))| NotificationHandle {
                prayer_id: *prayer_id,
                key: HandleKey::Timer(*id),
            })
            .collect();
        handles.sort_by_key(|h| h.prayer_id);
        Ok(handles)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities { persistent: false }
    }
}
