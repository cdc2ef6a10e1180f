mod render;
mod view;

#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
mod middleware;
#[cfg(feature = "server")]
mod server;

pub use render::{loading_page, maintenance_page};
pub use view::GateView;

#[cfg(feature = "server")]
pub use middleware::site_gate;
#[cfg(feature = "server")]
pub use server::{gated_router, GateServer, GateServerBuilder, GateState};
