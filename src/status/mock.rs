use super::backend::StatusBackend;
use super::types::{ActionResponse, SiteState, StatusResponse};
use crate::error::{Result, SitegateError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// In-memory status API for tests and offline runs
pub struct MockStatusBackend {
    remote: Mutex<StatusResponse>,
    read_failure: Mutex<Option<String>>,
    write_failure: Mutex<Option<String>>,
    read_delay: Mutex<Option<Duration>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MockStatusBackend {
    /// Create a mock remote reporting a running site
    pub fn new() -> Self {
        Self::with_status(SiteState::Running, None)
    }

    pub fn with_status(status: SiteState, maintenance_message: Option<&str>) -> Self {
        Self {
            remote: Mutex::new(StatusResponse {
                status,
                maintenance_message: maintenance_message.map(str::to_string),
            }),
            read_failure: Mutex::new(None),
            write_failure: Mutex::new(None),
            read_delay: Mutex::new(None),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Change the remote status behind the store's back
    pub fn set_remote(&self, status: SiteState, maintenance_message: Option<&str>) {
        *self.remote.lock() = StatusResponse {
            status,
            maintenance_message: maintenance_message.map(str::to_string),
        };
    }

    pub fn remote(&self) -> StatusResponse {
        self.remote.lock().clone()
    }

    /// Make every read fail with `message` until cleared with `None`
    pub fn fail_reads(&self, message: Option<&str>) {
        *self.read_failure.lock() = message.map(str::to_string);
    }

    /// Make every write fail with `message` until cleared with `None`
    pub fn fail_writes(&self, message: Option<&str>) {
        *self.write_failure.lock() = message.map(str::to_string);
    }

    /// Hold each read for `delay` before answering
    pub fn delay_reads(&self, delay: Option<Duration>) {
        *self.read_delay.lock() = delay;
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn write_error(&self) -> Option<SitegateError> {
        self.write_failure
            .lock()
            .clone()
            .map(|message| SitegateError::remote(500, message))
    }
}

impl Default for MockStatusBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusBackend for MockStatusBackend {
    async fn fetch_status(&self) -> Result<StatusResponse> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        // Answer with the remote state as of the start of the read
        let snapshot = self.remote();

        let delay = *self.read_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.read_failure.lock().clone();
        if let Some(message) = failure {
            debug!("Mock status read failing: {}", message);
            return Err(SitegateError::remote(503, message));
        }

        Ok(snapshot)
    }

    async fn trigger_shutdown(&self, maintenance_message: &str) -> Result<ActionResponse> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.write_error() {
            return Err(err);
        }

        self.set_remote(SiteState::Shutdown, Some(maintenance_message));
        Ok(ActionResponse {
            success: true,
            message: "Website shut down successfully".to_string(),
        })
    }

    async fn restart(&self) -> Result<ActionResponse> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.write_error() {
            return Err(err);
        }

        self.set_remote(SiteState::Running, None);
        Ok(ActionResponse {
            success: true,
            message: "Website restarted successfully".to_string(),
        })
    }
}
