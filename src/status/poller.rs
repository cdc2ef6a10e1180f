use super::store::StatusStore;
use super::types::{SiteState, SiteStatus};
use crate::config::PollConfig;
use crate::error::{Result, SitegateError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Poll cadence per site state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub running: Duration,
    pub shutdown: Duration,
}

impl PollIntervals {
    pub fn from_config(config: &PollConfig) -> Self {
        Self {
            running: config.running_interval(),
            shutdown: config.shutdown_interval(),
        }
    }

    pub fn for_state(&self, state: SiteState) -> Duration {
        match state {
            SiteState::Running => self.running,
            SiteState::Shutdown => self.shutdown,
        }
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            running: Duration::from_secs(60),
            shutdown: Duration::from_secs(30),
        }
    }
}

/// Keeps a [`StatusStore`] fresh by polling the status API.
///
/// The first refresh happens as soon as the poller starts. After that the
/// delay until the next refresh follows the store's current state, and is
/// recomputed from the moment the state changes, whoever changed it.
pub struct StatusPoller {
    store: StatusStore,
    intervals: PollIntervals,
    in_flight: Arc<AtomicBool>,
    cancellation_token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StatusPoller {
    pub fn new(store: StatusStore, intervals: PollIntervals) -> Self {
        Self {
            store,
            intervals,
            in_flight: Arc::new(AtomicBool::new(false)),
            cancellation_token: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// Start the background polling task
    pub async fn start(&self) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(SitegateError::component(
                "status_poller",
                "Poller has already been stopped",
            ));
        }

        let mut task = self.task.lock();
        if task.is_some() {
            return Err(SitegateError::component(
                "status_poller",
                "Poller is already running",
            ));
        }

        info!(
            "Starting status poller (running: {:?}, shutdown: {:?})",
            self.intervals.running, self.intervals.shutdown
        );

        *task = Some(tokio::spawn(poll_loop(
            self.store.clone(),
            self.intervals,
            Arc::clone(&self.in_flight),
            self.cancellation_token.clone(),
        )));

        Ok(())
    }

    /// Cancel the timer and wait for the polling task to exit.
    ///
    /// A refresh still in flight is abandoned; no refresh is issued once this
    /// returns.
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping status poller");
        self.cancellation_token.cancel();

        let task = self.task.lock().take();
        if let Some(task) = task {
            task.await.map_err(|e| {
                SitegateError::component("status_poller", e.to_string())
            })?;
        }

        debug!("Status poller stopped");
        Ok(())
    }

    /// Refresh right now unless a poll is already in flight.
    ///
    /// Returns `None` when the refresh was skipped.
    pub async fn poll_now(&self) -> Option<Result<SiteStatus>> {
        guarded_refresh(&self.store, &self.in_flight).await
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Interval that applies to the store's current state
    pub fn current_interval(&self) -> Duration {
        self.intervals.for_state(self.store.state())
    }

    pub fn intervals(&self) -> PollIntervals {
        self.intervals
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

/// Clears the in-flight flag even when the refresh future is dropped
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self(Arc::clone(flag)))
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn guarded_refresh(
    store: &StatusStore,
    in_flight: &Arc<AtomicBool>,
) -> Option<Result<SiteStatus>> {
    let Some(_guard) = InFlight::acquire(in_flight) else {
        debug!("Status refresh already in flight, skipping");
        return None;
    };

    // Failures are already logged and folded into the store
    Some(store.refresh().await)
}

async fn poll_loop(
    store: StatusStore,
    intervals: PollIntervals,
    in_flight: Arc<AtomicBool>,
    cancellation_token: CancellationToken,
) {
    let mut changes = store.subscribe();

    tokio::select! {
        biased;
        _ = cancellation_token.cancelled() => return,
        _ = guarded_refresh(&store, &in_flight) => {}
    }

    let mut scheduled_for = changes.borrow_and_update().state;
    let mut deadline = Instant::now() + intervals.for_state(scheduled_for);
    debug!(
        "Next status poll in {:?} ({})",
        intervals.for_state(scheduled_for),
        scheduled_for
    );

    loop {
        tokio::select! {
            biased;
            _ = cancellation_token.cancelled() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }

                let state = changes.borrow_and_update().state;
                if state != scheduled_for {
                    let interval = intervals.for_state(state);
                    info!(
                        "Site state is now {}, rescheduling status poll in {:?}",
                        state, interval
                    );
                    scheduled_for = state;
                    deadline = Instant::now() + interval;
                }
            }
            _ = sleep_until(deadline) => {
                debug!("Polling site status");
                tokio::select! {
                    biased;
                    _ = cancellation_token.cancelled() => break,
                    _ = guarded_refresh(&store, &in_flight) => {}
                }

                scheduled_for = changes.borrow_and_update().state;
                let interval = intervals.for_state(scheduled_for);
                deadline = Instant::now() + interval;
                debug!("Next status poll in {:?} ({})", interval, scheduled_for);
            }
        }
    }

    debug!("Status poll loop exited");
}
