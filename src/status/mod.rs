mod backend;
mod mock;
mod poller;
mod store;
mod types;
#[cfg(test)]
mod tests;

pub use backend::{HttpStatusBackend, StatusBackend};
pub use mock::MockStatusBackend;
pub use poller::{PollIntervals, StatusPoller};
pub use store::StatusStore;
pub use types::{ActionResponse, ErrorBody, SiteState, SiteStatus, StatusResponse, TriggerRequest};
