//! Periodic cleanup of stale artifacts.

use crate::services::storage::ArtifactStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Removes artifacts a crashed process left behind. Normal deletion goes
/// through `ExpiryService`; this worker only catches what that missed.
pub struct BackgroundWorker {
    store: Arc<dyn ArtifactStore>,
    max_age: Duration,
    shutdown: watch::Receiver<bool>,
}

impl BackgroundWorker {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        max_age: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            max_age,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("🚀 Background worker started");

        self.perform_cleanup().await;

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Background worker shutting down");
                    break;
                }
                _ = sleep(SWEEP_INTERVAL) => {
                    self.perform_cleanup().await;
                }
            }
        }
    }

    async fn perform_cleanup(&self) {
        tracing::info!("🧹 Sweeping stale artifacts...");
        match self.store.sweep_older_than(self.max_age).await {
            Ok(0) => {}
            Ok(n) => tracing::info!("Removed {} stale artifacts", n),
            Err(e) => tracing::error!("Artifact sweep failed: {}", e),
        }
    }
}
