use super::types::{Component, ComponentState, ShutdownReason};
use crate::config::SitegateConfig;
use crate::error::Result;
use crate::gate::GateServer;
use crate::status::{HttpStatusBackend, PollIntervals, StatusBackend, StatusPoller, StatusStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Composition root of the gate service.
///
/// Owns the one [`StatusStore`] and hands clones of it to the poller and the
/// gate server.
pub struct SitegateOrchestrator {
    pub(super) config: SitegateConfig,
    pub(super) store: StatusStore,

    // Components
    pub(super) poller: StatusPoller,
    pub(super) gate_server: Arc<GateServer>,
    pub(super) server_task: Option<JoinHandle<()>>,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<Component, ComponentState>>>,
    pub(super) shutdown_sender: Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
}

impl SitegateOrchestrator {
    /// Create an orchestrator talking to the configured status API
    pub fn new(config: SitegateConfig) -> Result<Self> {
        let backend = HttpStatusBackend::new(&config.api)?;
        info!("Using status API at {}", backend.base_url());
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Create an orchestrator on top of any status backend
    pub fn with_backend(config: SitegateConfig, backend: Arc<dyn StatusBackend>) -> Self {
        let store = StatusStore::new(backend);
        let intervals = PollIntervals::from_config(&config.poll);
        let poller = StatusPoller::new(store.clone(), intervals);
        let gate_server = Arc::new(GateServer::new(
            config.gate.clone(),
            store.clone(),
            intervals.shutdown,
        ));
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        Self {
            config,
            store,
            poller,
            gate_server,
            server_task: None,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Arc::new(Mutex::new(Some(shutdown_sender))),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &SitegateConfig {
        &self.config
    }

    /// Handle to the shared status store
    pub fn store(&self) -> StatusStore {
        self.store.clone()
    }

    /// Ask [`SitegateOrchestrator::run`] to shut down; later requests are ignored
    pub async fn request_shutdown(&self, reason: ShutdownReason) {
        request_shutdown(&self.shutdown_sender, reason).await;
    }
}

pub(super) async fn request_shutdown(
    sender: &Mutex<Option<oneshot::Sender<ShutdownReason>>>,
    reason: ShutdownReason,
) {
    match sender.lock().await.take() {
        Some(sender) => {
            let _ = sender.send(reason);
        }
        None => warn!("Shutdown already requested, ignoring {:?}", reason),
    }
}
