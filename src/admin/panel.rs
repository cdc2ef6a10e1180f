use super::auth::{AdminSession, SessionState};
use super::prompt::Prompter;
use crate::config::AdminConfig;
use crate::status::{SiteStatus, StatusStore};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Screen the admin panel is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelView {
    Login,
    Controls,
    /// Confirmation that the public site is down
    SiteDown,
}

/// Outcome of a panel action, shown to the admin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelNotice {
    Success(String),
    Warning(String),
    Error(String),
    Cancelled,
}

impl PanelNotice {
    pub fn is_success(&self) -> bool {
        matches!(self, PanelNotice::Success(_))
    }
}

impl fmt::Display for PanelNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelNotice::Success(message) => write!(f, "✓ {}", message),
            PanelNotice::Warning(message) => write!(f, "! {}", message),
            PanelNotice::Error(message) => write!(f, "✗ {}", message),
            PanelNotice::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Privileged controls for taking the site down and bringing it back
pub struct AdminControlPanel {
    store: StatusStore,
    session: AdminSession,
    prompter: Arc<dyn Prompter>,
    view: PanelView,
}

impl AdminControlPanel {
    pub fn new(store: StatusStore, credentials: AdminConfig, prompter: Arc<dyn Prompter>) -> Self {
        Self {
            store,
            session: AdminSession::new(credentials),
            prompter,
            view: PanelView::Login,
        }
    }

    pub fn view(&self) -> PanelView {
        self.view
    }

    pub fn session(&self) -> &SessionState {
        self.session.state()
    }

    pub fn status(&self) -> SiteStatus {
        self.store.status()
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    pub fn login(&mut self, username: &str, password: &str) -> PanelNotice {
        match self.session.login(username, password) {
            Ok(()) => {
                self.view = if self.store.status().is_shutdown() {
                    PanelView::SiteDown
                } else {
                    PanelView::Controls
                };
                PanelNotice::Success(format!("Logged in as {}", username))
            }
            Err(e) => PanelNotice::Error(e.to_string()),
        }
    }

    pub fn logout(&mut self) -> PanelNotice {
        self.session.logout();
        self.view = PanelView::Login;
        PanelNotice::Success("Logged out".to_string())
    }

    /// Take the public site down with `message` shown to visitors
    pub async fn request_enter_maintenance(&mut self, message: &str) -> PanelNotice {
        if !self.session.is_logged_in() {
            return PanelNotice::Warning("Please log in first".to_string());
        }

        if message.trim().is_empty() {
            return PanelNotice::Warning("Please enter a maintenance message".to_string());
        }

        match self.store.enter_maintenance(message).await {
            Ok(confirmation) => {
                info!("Admin took the site down");
                self.view = PanelView::SiteDown;
                PanelNotice::Success(non_empty_or(confirmation, "Website shut down successfully"))
            }
            Err(e) if e.is_validation() => PanelNotice::Warning(e.to_string()),
            Err(e) => {
                warn!("Admin shutdown request failed: {}", e);
                PanelNotice::Error(format!("Failed to shut down website: {}", e))
            }
        }
    }

    /// Bring the public site back after an explicit yes
    pub async fn request_exit_maintenance(&mut self) -> PanelNotice {
        if !self.session.is_logged_in() {
            return PanelNotice::Warning("Please log in first".to_string());
        }

        if !self
            .prompter
            .confirm("Are you sure you want to restart the website?")
            .await
        {
            return PanelNotice::Cancelled;
        }

        match self.store.exit_maintenance().await {
            Ok(confirmation) => {
                info!("Admin restarted the site");
                self.view = PanelView::Controls;
                PanelNotice::Success(non_empty_or(confirmation, "Website restarted successfully"))
            }
            Err(e) => {
                warn!("Admin restart request failed: {}", e);
                PanelNotice::Error(format!("Failed to restart website: {}", e))
            }
        }
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
