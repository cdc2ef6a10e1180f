use crate::status::{SiteState, SiteStatus};

/// What the gate shows in place of the protected site.
///
/// Exactly one variant applies to any [`SiteStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateView {
    /// First status read has not finished yet
    Loading,
    /// Site is shut down; nothing behind the gate is reachable
    Blocked { message: String },
    /// Site is running; pass through untouched
    Admit,
}

impl GateView {
    pub fn evaluate(status: &SiteStatus, default_notice: &str) -> Self {
        if status.loading {
            return GateView::Loading;
        }

        match status.state {
            SiteState::Shutdown => {
                let message = if status.maintenance_message.trim().is_empty() {
                    default_notice.to_string()
                } else {
                    status.maintenance_message.clone()
                };
                GateView::Blocked { message }
            }
            SiteState::Running => GateView::Admit,
        }
    }

    pub fn admits(&self) -> bool {
        matches!(self, GateView::Admit)
    }
}
