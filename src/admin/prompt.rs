use async_trait::async_trait;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::Write;
use tokio::task;
use tracing::{debug, error, warn};

/// Interactive questions the admin panel and console need answered
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Yes/no question; anything but an explicit yes is a no
    async fn confirm(&self, prompt: &str) -> bool;

    /// Hidden input such as a password; `None` when aborted
    async fn secret(&self, prompt: &str) -> Option<String>;
}

/// Prompter with fixed answers, for `--yes` runs and tests
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    pub confirm: bool,
    pub secret: Option<String>,
}

impl ScriptedPrompter {
    pub fn confirming(confirm: bool) -> Self {
        Self {
            confirm,
            secret: None,
        }
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn confirm(&self, prompt: &str) -> bool {
        debug!("Auto-answering '{}' with {}", prompt, self.confirm);
        self.confirm
    }

    async fn secret(&self, _prompt: &str) -> Option<String> {
        self.secret.clone()
    }
}

/// Prompter that reads single key presses from the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = format!("{} [y/N] ", prompt);
        task::spawn_blocking(move || read_confirmation(&prompt))
            .await
            .unwrap_or_else(|e| {
                error!("Confirmation prompt task failed: {}", e);
                false
            })
    }

    async fn secret(&self, prompt: &str) -> Option<String> {
        let prompt = prompt.to_string();
        task::spawn_blocking(move || read_secret(&prompt))
            .await
            .unwrap_or_else(|e| {
                error!("Secret prompt task failed: {}", e);
                None
            })
    }
}

/// Leaves raw mode when dropped
struct RawMode;

impl RawMode {
    fn enable() -> Option<Self> {
        match enable_raw_mode() {
            Ok(()) => Some(Self),
            Err(e) => {
                warn!("Failed to enable raw mode for prompt: {}", e);
                None
            }
        }
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            error!("Failed to disable raw mode: {}", e);
        }
    }
}

fn show_prompt(prompt: &str) {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "{}", prompt);
    let _ = stdout.flush();
}

fn read_confirmation(prompt: &str) -> bool {
    show_prompt(prompt);

    let answer = {
        let Some(_raw) = RawMode::enable() else {
            return false;
        };

        loop {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => break true,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        break false
                    }
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Enter | KeyCode::Esc => {
                        break false
                    }
                    other => debug!("Ignoring key {:?} at confirmation prompt", other),
                },
                Ok(_) => {}
                Err(e) => {
                    warn!("Error reading confirmation key: {}", e);
                    break false;
                }
            }
        }
    };

    println!("{}", if answer { "yes" } else { "no" });
    answer
}

fn read_secret(prompt: &str) -> Option<String> {
    show_prompt(prompt);

    let secret = {
        let _raw = RawMode::enable()?;
        let mut secret = String::new();

        loop {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        break None
                    }
                    KeyCode::Char(c) => secret.push(c),
                    KeyCode::Backspace => {
                        secret.pop();
                    }
                    KeyCode::Enter => break Some(secret),
                    KeyCode::Esc => break None,
                    _ => {}
                },
                Ok(_) => {}
                Err(e) => {
                    warn!("Error reading secret input: {}", e);
                    break None;
                }
            }
        }
    };

    println!();
    secret
}
