pub mod admin;
pub mod config;
pub mod error;
pub mod gate;
pub mod logging;
pub mod status;

#[cfg(feature = "server")]
pub mod app;

pub use admin::{AdminConsole, AdminControlPanel, PanelNotice, PanelView, Prompter};
pub use config::SitegateConfig;
pub use error::{Result, SitegateError};
pub use gate::GateView;
pub use status::{
    HttpStatusBackend, MockStatusBackend, SiteState, SiteStatus, StatusBackend, StatusPoller,
    StatusStore,
};

#[cfg(feature = "server")]
pub use app::{ComponentState, ShutdownReason, SitegateOrchestrator};
#[cfg(feature = "server")]
pub use gate::{GateServer, GateServerBuilder};
