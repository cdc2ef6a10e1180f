use std::fmt;

/// Long-running parts of the gate service, in start order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    StatusPoller,
    GateServer,
}

impl Component {
    pub const ALL: [Component; 2] = [Component::StatusPoller, Component::GateServer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::StatusPoller => "status_poller",
            Component::GateServer => "gate_server",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
}

/// What ended [`super::SitegateOrchestrator::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT or SIGTERM
    Signal(String),
    /// A component failed after startup
    Error(String),
    UserRequest,
}

impl ShutdownReason {
    /// Process exit code implied by the reason alone
    pub fn exit_code(&self) -> i32 {
        match self {
            ShutdownReason::Error(_) => 1,
            ShutdownReason::Signal(_) | ShutdownReason::UserRequest => 0,
        }
    }
}
