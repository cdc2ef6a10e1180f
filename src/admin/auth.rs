use crate::config::AdminConfig;
use crate::error::{Result, SitegateError};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn { username: String },
}

/// Login gate in front of the admin controls.
///
/// Credentials are compared as plain strings against the local
/// configuration. Anyone who can read that configuration can log in, so this
/// only keeps the controls out of casual reach; the status API has to
/// authenticate write requests on its own. Sessions never expire.
pub struct AdminSession {
    credentials: AdminConfig,
    state: SessionState,
}

impl AdminSession {
    pub fn new(credentials: AdminConfig) -> Self {
        warn!("Admin login is checked locally and is not an access control for the status API");
        Self {
            credentials,
            state: SessionState::LoggedOut,
        }
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        if username != self.credentials.username || password != self.credentials.password {
            warn!("Rejected admin login for '{}'", username);
            return Err(SitegateError::validation("Invalid username or password"));
        }

        info!("Admin '{}' logged in", username);
        self.state = SessionState::LoggedIn {
            username: username.to_string(),
        };
        Ok(())
    }

    pub fn logout(&mut self) {
        if let SessionState::LoggedIn { username } = &self.state {
            info!("Admin '{}' logged out", username);
        }
        self.state = SessionState::LoggedOut;
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, SessionState::LoggedIn { .. })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }
}
