mod auth;
mod console;
mod panel;
mod prompt;

pub use auth::{AdminSession, SessionState};
pub use console::AdminConsole;
pub use panel::{AdminControlPanel, PanelNotice, PanelView};
pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
