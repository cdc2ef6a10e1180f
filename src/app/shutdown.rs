use super::{Component, ComponentState, SitegateOrchestrator};
use crate::error::{Result, SitegateError};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

const STOP_TIMEOUT: Duration = Duration::from_secs(10);

impl SitegateOrchestrator {
    /// Perform graceful shutdown of all components
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        // Cancel all background tasks
        self.cancellation_token.cancel();

        let mut exit_code = 0;

        // Reverse start order: stop admitting requests before polling ends
        for component in Component::ALL.into_iter().rev() {
            if let Err(e) = self.stop_component(component).await {
                error!("Error stopping {}: {}", component, e);
                exit_code = 1;
            }
        }

        self.store.reset();

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    async fn stop_component(&mut self, component: Component) -> Result<()> {
        if self.component_state(component).await == Some(ComponentState::Failed) {
            info!("{} already failed, skipping stop", component);
            return Ok(());
        }

        info!("Stopping {}", component);
        self.set_component_state(component, ComponentState::Stopping)
            .await;

        let result = match component {
            Component::GateServer => match self.server_task.take() {
                Some(task) => match timeout(STOP_TIMEOUT, task).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(SitegateError::component(
                        component.as_str(),
                        format!("Server task panicked: {}", e),
                    )),
                    Err(_) => Err(SitegateError::component(
                        component.as_str(),
                        "Timed out waiting for server to stop",
                    )),
                },
                None => Ok(()),
            },
            Component::StatusPoller => match timeout(STOP_TIMEOUT, self.poller.stop()).await {
                Ok(result) => result,
                Err(_) => Err(SitegateError::component(
                    component.as_str(),
                    "Timed out waiting for poller to stop",
                )),
            },
        };

        match &result {
            Ok(()) => {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                info!("{} stopped", component);
            }
            Err(e) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("Error stopping {}: {}", component, e);
            }
        }
        result
    }
}
