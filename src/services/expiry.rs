//! Deferred one-shot artifact deletion.

use crate::services::storage::ArtifactStore;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Delayed deletions keyed by artifact name.
///
/// Scheduling a name that already has a pending deletion cancels and
/// replaces it, so duplicate artifacts coalesce onto a single timer.
/// Once a deletion fires it runs to completion regardless of what
/// happened to the request that scheduled it.
pub struct ExpiryService {
    delay: Duration,
    store: Arc<dyn ArtifactStore>,
    pending: DashMap<String, CancellationToken>,
}

impl ExpiryService {
    pub fn new(store: Arc<dyn ArtifactStore>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            store,
            pending: DashMap::new(),
        })
    }

    /// Schedule `name` for deletion after the configured delay.
    pub fn schedule(self: &Arc<Self>, name: String) {
        let token = CancellationToken::new();
        if let Some(previous) = self.pending.insert(name.clone(), token.clone()) {
            previous.cancel();
        }

        let service = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = sleep(service.delay) => {}
            }

            // best-effort: the artifact may already be gone
            match service.store.remove(&name).await {
                Ok(()) => tracing::info!("Expired artifact {}", name),
                Err(e) => tracing::warn!("Failed to expire artifact {}: {}", name, e),
            }
            service.pending.remove(&name);
        });
    }

    /// Cancel a pending deletion, leaving the artifact in place.
    /// Returns whether a deletion was actually pending.
    pub fn cancel(&self, name: &str) -> bool {
        match self.pending.remove(name) {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Number of deletions currently scheduled.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
