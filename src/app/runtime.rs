use super::orchestrator::request_shutdown;
use super::{ShutdownReason, SitegateOrchestrator};
use crate::error::{Result, SitegateError};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info};

impl SitegateOrchestrator {
    /// Run until a signal or a shutdown request, then shut down gracefully
    pub async fn run(&mut self) -> Result<i32> {
        info!("Sitegate is running");

        let shutdown_receiver =
            self.shutdown_receiver
                .take()
                .ok_or_else(|| SitegateError::System {
                    message: "Shutdown receiver already taken".to_string(),
                })?;

        // Spawn signal handlers
        self.setup_signal_handlers(Arc::clone(&self.shutdown_sender));

        // Wait for shutdown signal
        let shutdown_reason = shutdown_receiver.await.map_err(|_| SitegateError::System {
            message: "Shutdown channel closed unexpectedly".to_string(),
        })?;

        info!("Shutdown initiated: {:?}", shutdown_reason);

        let exit_code = self.shutdown().await?.max(shutdown_reason.exit_code());

        info!("Sitegate shutdown complete");
        Ok(exit_code)
    }

    /// Set up signal handlers for graceful shutdown
    fn setup_signal_handlers(
        &self,
        shutdown_sender: Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>,
    ) {
        // Handle SIGTERM (systemd stop) - Unix only
        #[cfg(unix)]
        {
            let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
            tokio::spawn(async move {
                let mut sigterm =
                    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                        Ok(sigterm) => sigterm,
                        Err(e) => {
                            error!("Failed to register SIGTERM handler: {}", e);
                            return;
                        }
                    };

                if let Some(()) = sigterm.recv().await {
                    info!("Received SIGTERM signal");
                    request_shutdown(
                        &shutdown_sender_sigterm,
                        ShutdownReason::Signal("SIGTERM".to_string()),
                    )
                    .await;
                }
            });
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        let shutdown_sender_sigint = Arc::clone(&shutdown_sender);
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                request_shutdown(
                    &shutdown_sender_sigint,
                    ShutdownReason::Signal("SIGINT".to_string()),
                )
                .await;
            }
        });
    }
}
