//! Platform notification adapters
//!
//! Two ways to arm a notification:
//! - [`TimerAdapter`]: in-process tokio timers. Cheap, but nothing fires if
//!   the process is suspended or exits.
//! - [`NativeAdapter`]: hands the notification to the OS scheduler, which
//!   delivers it even when this process is gone.
//!
//! The choice is made once, in [`select_adapter`], and advertised through
//! [`Capabilities::persistent`].

pub mod delivery;
pub mod native;
pub mod timer;

pub use delivery::{
    AlertSink, AudioPlayer, Delivery, DesktopAlertSink, SoundFilePlayer, TracingAlertSink,
};
pub use native::{AtHost, MemoryHost, NativeAdapter, NativeHost, OsNotification, OsPending};
pub use timer::TimerAdapter;

use crate::clock::Clock;
use crate::error::Result;
use crate::models::{NotificationHandle, NotificationPayload};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;

/// Request to arm one notification
#[derive(Debug, Clone)]
pub struct ArmRequest {
    /// Local wall-clock fire time
    pub fire_at: NaiveDateTime,
    pub payload: NotificationPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Armed notifications survive process suspension and exit
    pub persistent: bool,
}

#[async_trait]
pub trait NotificationAdapter: Send + Sync {
    async fn schedule(&self, request: ArmRequest) -> Result<NotificationHandle>;

    /// Cancel an armed notification. Unknown or already-fired handles are a no-op.
    async fn cancel(&self, handle: &NotificationHandle) -> Result<()>;

    /// Cancel everything this adapter armed, including entries left behind by
    /// an earlier process when the adapter is persistent
    async fn cancel_all(&self) -> Result<()>;

    async fn pending(&self) -> Result<Vec<NotificationHandle>>;

    fn capabilities(&self) -> Capabilities;
}

/// Pick the adapter for this host. Runs once at startup.
pub async fn select_adapter(
    prefer_native: bool,
    host: AtHost,
    delivery: Delivery,
    clock: Arc<dyn Clock>,
) -> Arc<dyn NotificationAdapter> {
    if prefer_native && host.is_available().await {
        tracing::info!("Using OS-level scheduled notifications (at queue)");
        return Arc::new(NativeAdapter::new(host));
    }

    if prefer_native {
        tracing::info!("OS scheduler unavailable, falling back to in-process timers");
    } else {
        tracing::info!("Using in-process notification timers");
    }
    Arc::new(TimerAdapter::new(delivery, clock))
}
