mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use orchestrator::SitegateOrchestrator;
pub use types::{Component, ComponentState, ShutdownReason};
