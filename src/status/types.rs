use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Availability of the public site as reported by the status API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteState {
    Running,
    Shutdown,
}

impl fmt::Display for SiteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteState::Running => write!(f, "running"),
            SiteState::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Snapshot held by the status store.
///
/// `maintenance_message` is only ever non-empty while `state` is
/// [`SiteState::Shutdown`]. `loading` stays true until the first refresh
/// attempt finishes, whatever its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatus {
    pub state: SiteState,
    pub maintenance_message: String,
    pub loading: bool,
    pub last_checked: Option<DateTime<Utc>>,
}

impl SiteStatus {
    pub fn is_shutdown(&self) -> bool {
        self.state == SiteState::Shutdown
    }

    pub(crate) fn set_running(&mut self) {
        self.state = SiteState::Running;
        self.maintenance_message.clear();
    }

    pub(crate) fn set_shutdown(&mut self, message: impl Into<String>) {
        self.state = SiteState::Shutdown;
        self.maintenance_message = message.into();
    }
}

impl Default for SiteStatus {
    fn default() -> Self {
        Self {
            state: SiteState::Running,
            maintenance_message: String::new(),
            loading: true,
            last_checked: None,
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.loading {
            return write!(f, "loading");
        }

        match self.state {
            SiteState::Running => write!(f, "running"),
            SiteState::Shutdown if self.maintenance_message.is_empty() => write!(f, "shutdown"),
            SiteState::Shutdown => write!(f, "shutdown ({})", self.maintenance_message),
        }
    }
}

/// Body of `GET /shutdown/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: SiteState,
    #[serde(
        rename = "maintenanceMessage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub maintenance_message: Option<String>,
}

/// Body of `POST /shutdown/trigger`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRequest {
    #[serde(rename = "maintenanceMessage")]
    pub maintenance_message: String,
}

/// Body returned by both write endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Failure body; the API uses either key
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn text(&self) -> Option<&str> {
        let present = |text: &&str| !text.trim().is_empty();
        self.error
            .as_deref()
            .filter(present)
            .or_else(|| self.message.as_deref().filter(present))
    }
}
