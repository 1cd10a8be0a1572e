//! Notification permission gateway

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[async_trait]
pub trait PermissionGateway: Send + Sync {
    /// Whether notifications may currently be shown
    async fn check(&self) -> bool;

    /// Ask the user for permission. May wait on user interaction.
    async fn request(&self) -> bool;
}

/// Permission state owned by the host and shared with the scheduler.
/// Desktop sessions have no permission prompt and start out granted.
#[derive(Debug, Clone)]
pub struct PermissionFlag {
    granted: Arc<AtomicBool>,
}

impl PermissionFlag {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: Arc::new(AtomicBool::new(granted)),
        }
    }

    pub fn set(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
        tracing::info!("Notification permission {}", if granted { "granted" } else { "revoked" });
    }
}

#[async_trait]
impl PermissionGateway for PermissionFlag {
    async fn check(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    /// Nothing to prompt; reports the host's current answer
    async fn request(&self) -> bool {
        self.check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flag_is_shared_between_clones() {
        let flag = PermissionFlag::new(false);
        let seen_by_scheduler = flag.clone();
        assert!(!seen_by_scheduler.check().await);

        flag.set(true);
        assert!(seen_by_scheduler.request().await);
    }
}
