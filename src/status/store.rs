use super::backend::StatusBackend;
use super::types::{SiteState, SiteStatus, StatusResponse};
use crate::error::{Result, SitegateError};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Authoritative in-memory holder of the site status.
///
/// Cloning the store hands out another handle to the same state; the
/// composition root creates one and passes it to the poller, the gate and the
/// admin panel. Every mutation goes through the methods below and is
/// broadcast to [`StatusStore::subscribe`] receivers.
///
/// A successful admin write stands until a read that started after it
/// completes; reads already in flight when the write lands only end
/// `loading`.
#[derive(Clone)]
pub struct StatusStore {
    backend: Arc<dyn StatusBackend>,
    status: Arc<watch::Sender<SiteStatus>>,
    // Bumped under the watch lock by every successful write
    write_generation: Arc<AtomicU64>,
}

impl StatusStore {
    pub fn new(backend: Arc<dyn StatusBackend>) -> Self {
        let (sender, _) = watch::channel(SiteStatus::default());
        Self {
            backend,
            status: Arc::new(sender),
            write_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current snapshot
    pub fn status(&self) -> SiteStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> SiteState {
        self.status.borrow().state
    }

    /// Receiver notified after every mutation
    pub fn subscribe(&self) -> watch::Receiver<SiteStatus> {
        self.status.subscribe()
    }

    /// Read the remote status once.
    ///
    /// A failed read never flips a confirmed shutdown back to running; from
    /// any other state it falls back to running. Either way `loading` ends.
    pub async fn refresh(&self) -> Result<SiteStatus> {
        let generation = self.write_generation.load(Ordering::Acquire);

        match self.backend.fetch_status().await {
            Ok(response) => {
                self.apply_remote(response, generation);
                Ok(self.status())
            }
            Err(e) => {
                warn!("Failed to read site status: {}", e);
                self.status.send_modify(|status| {
                    if !status.is_shutdown() {
                        status.set_running();
                    }
                    status.loading = false;
                });
                Err(e)
            }
        }
    }

    /// Put the site into maintenance with `message` shown to visitors.
    ///
    /// Returns the API's confirmation text. Nothing changes locally unless the
    /// remote write succeeds.
    pub async fn enter_maintenance(&self, message: &str) -> Result<String> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SitegateError::validation(
                "Maintenance message must not be empty",
            ));
        }

        let action = self.backend.trigger_shutdown(message).await.map_err(|e| {
            error!("Failed to enter maintenance mode: {}", e);
            e
        })?;

        self.status.send_modify(|status| {
            self.write_generation.fetch_add(1, Ordering::AcqRel);
            status.set_shutdown(message);
        });
        info!("Site entered maintenance mode: {}", message);

        Ok(action.message)
    }

    /// Bring the site back up. Succeeds (and changes nothing) when already running.
    pub async fn exit_maintenance(&self) -> Result<String> {
        let action = self.backend.restart().await.map_err(|e| {
            error!("Failed to exit maintenance mode: {}", e);
            e
        })?;

        self.status.send_modify(|status| {
            self.write_generation.fetch_add(1, Ordering::AcqRel);
            status.set_running();
        });
        info!("Site left maintenance mode");

        Ok(action.message)
    }

    /// Back to the startup defaults; used on teardown
    pub fn reset(&self) {
        debug!("Resetting site status to defaults");
        self.status.send_replace(SiteStatus::default());
    }

    fn written_since(&self, generation: u64) -> bool {
        self.write_generation.load(Ordering::Acquire) != generation
    }

    /// Apply a read that started at write `generation`
    fn apply_remote(&self, response: StatusResponse, generation: u64) {
        let StatusResponse {
            status: remote_state,
            maintenance_message,
        } = response;
        let previous = self.state();
        let mut stale = false;

        self.status.send_modify(|status| {
            stale = self.written_since(generation);
            if !stale {
                match remote_state {
                    SiteState::Running => status.set_running(),
                    SiteState::Shutdown => {
                        status.set_shutdown(maintenance_message.unwrap_or_default())
                    }
                }
                status.last_checked = Some(Utc::now());
            }
            status.loading = false;
        });

        if stale {
            debug!(
                "Discarding status read ({}) that started before an admin write",
                remote_state
            );
        } else if previous != remote_state {
            info!("Site status changed: {} -> {}", previous, remote_state);
        } else {
            debug!("Site status confirmed: {}", remote_state);
        }
    }
}
