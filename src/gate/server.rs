use crate::{
    config::GateConfig,
    error::{Result, SitegateError},
    status::StatusStore,
};
use axum::{middleware, routing::get, Router};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers::{health_handler, status_handler};
use super::middleware::site_gate;

/// Shared state for the gate's Axum handlers
#[derive(Clone)]
pub struct GateState {
    pub(crate) store: StatusStore,
    pub(crate) default_notice: Arc<str>,
    pub(crate) retry_after: Duration,
}

impl GateState {
    /// `retry_after` is advertised to blocked clients, usually the shutdown
    /// poll interval.
    pub fn new(store: StatusStore, default_notice: &str, retry_after: Duration) -> Self {
        Self {
            store,
            default_notice: Arc::from(default_notice),
            retry_after,
        }
    }
}

/// Put `protected` behind the site gate and add the ungated status routes
pub fn gated_router(state: GateState, protected: Router) -> Router {
    let protected = protected.layer(middleware::from_fn_with_state(state.clone(), site_gate));

    Router::new()
        .route("/health", get(health_handler))
        .route("/sitegate/status", get(status_handler))
        .with_state(state)
        .merge(protected)
}

/// HTTP server that serves the front-end build behind the site gate
pub struct GateServer {
    pub(crate) config: GateConfig,
    pub(crate) state: GateState,
}

impl GateServer {
    pub fn new(config: GateConfig, store: StatusStore, retry_after: Duration) -> Self {
        let state = GateState::new(store, &config.default_notice, retry_after);
        Self { config, state }
    }

    /// Full application router: static site behind the gate plus status routes
    pub fn router(&self) -> Router {
        let root = Path::new(&self.config.site_root);
        // Unknown paths fall back to index.html so client-side routes resolve
        let site = ServeDir::new(root)
            .append_index_html_on_directories(true)
            .fallback(ServeFile::new(root.join("index.html")));

        gated_router(self.state.clone(), Router::new().fallback_service(site))
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.ip, self.config.port)
    }

    /// Bind and serve until `shutdown` is cancelled
    pub async fn start(&self, shutdown: CancellationToken) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.address();
        info!("Starting gate server on {}", addr);

        TcpListener::bind(&addr).await.map_err(|e| {
            SitegateError::component("gate_server", format!("Failed to bind {}: {}", addr, e))
        })
    }

    /// Serve on an already bound listener until `shutdown` is cancelled
    pub async fn serve(&self, listener: TcpListener, shutdown: CancellationToken) -> Result<()> {
        if let Ok(local) = listener.local_addr() {
            info!(
                "Gate server listening on {} (site root: {})",
                local, self.config.site_root
            );
        }

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| {
                SitegateError::component("gate_server", format!("Server error: {}", e))
            })?;

        info!("Gate server stopped");
        Ok(())
    }
}

/// Gate server builder for configuration
pub struct GateServerBuilder {
    config: Option<GateConfig>,
    store: Option<StatusStore>,
    retry_after: Option<Duration>,
}

impl GateServerBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            store: None,
            retry_after: None,
        }
    }

    /// Set the gate configuration
    pub fn config(mut self, config: GateConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the status store consulted on every request
    pub fn store(mut self, store: StatusStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the Retry-After hint sent while the site is down
    pub fn retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Build the gate server
    pub fn build(self) -> Result<GateServer> {
        let config = self.config.ok_or_else(|| {
            SitegateError::component("gate_server", "Gate configuration is required")
        })?;

        let store = self
            .store
            .ok_or_else(|| SitegateError::component("gate_server", "Status store is required"))?;

        let retry_after = self.retry_after.unwrap_or(Duration::from_secs(30));

        Ok(GateServer::new(config, store, retry_after))
    }
}

impl Default for GateServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
