use super::panel::{AdminControlPanel, PanelNotice, PanelView};
use super::prompt::Prompter;
use crate::error::Result;
use crate::status::SiteStatus;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::debug;

const HELP: &str = "\
Commands:
  login <username> [password]   log in (prompts for the password if omitted)
  logout                        log out
  status                        read and show the current site status
  down <message>                shut the website down, showing <message> to visitors
  up                            restart the website (asks for confirmation)
  help                          show this help
  quit                          leave the console";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Login {
        username: String,
        password: Option<String>,
    },
    Logout,
    Status,
    Down(String),
    Up,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Command::Empty,
            "login" => {
                let mut parts = rest.split_whitespace();
                match parts.next() {
                    Some(username) => Command::Login {
                        username: username.to_string(),
                        password: parts.next().map(str::to_string),
                    },
                    None => Command::Unknown("login needs a username".to_string()),
                }
            }
            "logout" => Command::Logout,
            "status" => Command::Status,
            "down" => Command::Down(rest.to_string()),
            "up" => Command::Up,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => Command::Unknown(format!("Unknown command '{}'", other)),
        }
    }
}

/// Line-oriented front end for [`AdminControlPanel`]
pub struct AdminConsole<R, W> {
    panel: AdminControlPanel,
    prompter: Arc<dyn Prompter>,
    input: Lines<R>,
    output: W,
}

impl<R, W> AdminConsole<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(panel: AdminControlPanel, prompter: Arc<dyn Prompter>, input: R, output: W) -> Self {
        Self {
            panel,
            prompter,
            input: input.lines(),
            output,
        }
    }

    /// Read commands until `quit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        self.write_line("Sitegate admin console. Type 'help' for commands.")
            .await?;

        loop {
            let prompt = self.prompt_text();
            self.write(prompt).await?;

            let Some(line) = self.input.next_line().await? else {
                self.write_line("").await?;
                break;
            };

            match Command::parse(&line) {
                Command::Empty => {}
                Command::Quit => break,
                command => self.dispatch(command).await?,
            }
        }

        debug!("Admin console closed");
        Ok(())
    }

    pub fn panel(&self) -> &AdminControlPanel {
        &self.panel
    }

    pub fn into_output(self) -> W {
        self.output
    }

    async fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Login { username, password } => {
                let password = match password {
                    Some(password) => Some(password),
                    None => self.prompter.secret("Password: ").await,
                };

                let notice = match password {
                    Some(password) => self.panel.login(&username, &password),
                    None => PanelNotice::Cancelled,
                };
                self.show(notice).await?;
            }
            Command::Logout => {
                let notice = self.panel.logout();
                self.show(notice).await?;
            }
            Command::Status => {
                // A failed read is still folded into the store; show what it holds
                if let Err(e) = self.panel.store().refresh().await {
                    self.show(PanelNotice::Warning(format!("Could not read status: {}", e)))
                        .await?;
                }
                let status = self.panel.status();
                self.write_line(&describe(&status)).await?;
            }
            Command::Down(message) => {
                let notice = self.panel.request_enter_maintenance(&message).await;
                self.show(notice).await?;
            }
            Command::Up => {
                let notice = self.panel.request_exit_maintenance().await;
                self.show(notice).await?;
            }
            Command::Help => self.write_line(HELP).await?,
            Command::Unknown(message) => {
                self.show(PanelNotice::Warning(format!("{} (try 'help')", message)))
                    .await?
            }
            Command::Empty | Command::Quit => {}
        }

        Ok(())
    }

    async fn show(&mut self, notice: PanelNotice) -> Result<()> {
        let entered_site_down = notice.is_success() && self.panel.view() == PanelView::SiteDown;
        self.write_line(&notice.to_string()).await?;

        if entered_site_down {
            let status = self.panel.status();
            self.write_line(&format!(
                "The website is DOWN. Visitors see: \"{}\"\nUse 'up' to restart it.",
                status.maintenance_message
            ))
            .await?;
        }

        Ok(())
    }

    fn prompt_text(&self) -> &'static str {
        match self.panel.view() {
            PanelView::Login => "sitegate (logged out)> ",
            PanelView::Controls => "sitegate> ",
            PanelView::SiteDown => "sitegate [SITE DOWN]> ",
        }
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn write_line(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }
}

fn describe(status: &SiteStatus) -> String {
    let checked = status
        .last_checked
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    format!("Site status: {} (last checked: {})", status, checked)
}
