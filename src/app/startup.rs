use super::orchestrator::request_shutdown;
use super::{Component, ComponentState, ShutdownReason, SitegateOrchestrator};
use crate::error::Result;
use std::sync::Arc;
use tracing::{error, info};

impl SitegateOrchestrator {
    /// Register all components
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing sitegate components");

        for component in Component::ALL {
            self.set_component_state(component, ComponentState::Stopped)
                .await;
        }

        info!("All components initialized successfully");
        Ok(())
    }

    /// Start polling, then open the gate server
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting sitegate");

        self.set_component_state(Component::StatusPoller, ComponentState::Starting)
            .await;
        if let Err(e) = self.poller.start().await {
            error!("Failed to start status poller: {}", e);
            self.set_component_state(Component::StatusPoller, ComponentState::Failed)
                .await;
            return Err(e);
        }
        self.set_component_state(Component::StatusPoller, ComponentState::Running)
            .await;

        self.set_component_state(Component::GateServer, ComponentState::Starting)
            .await;
        let listener = match self.gate_server.bind().await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to start gate server: {}", e);
                self.set_component_state(Component::GateServer, ComponentState::Failed)
                    .await;
                return Err(e);
            }
        };

        let server = Arc::clone(&self.gate_server);
        let token = self.cancellation_token.clone();
        let states = Arc::clone(&self.component_states);
        let shutdown_sender = Arc::clone(&self.shutdown_sender);

        // Serve in the background; a serving error takes the whole service down
        self.server_task = Some(tokio::spawn(async move {
            if let Err(e) = server.serve(listener, token).await {
                error!("Gate server error: {}", e);
                states
                    .lock()
                    .await
                    .insert(Component::GateServer, ComponentState::Failed);
                request_shutdown(&shutdown_sender, ShutdownReason::Error(e.to_string())).await;
            }
        }));

        self.set_component_state(Component::GateServer, ComponentState::Running)
            .await;
        info!("Sitegate started on {}", self.gate_server.address());
        Ok(())
    }
}
