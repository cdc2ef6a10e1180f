use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SitegateConfig {
    pub api: ApiConfig,
    pub poll: PollConfig,
    pub gate: GateConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the institute REST API (the `/shutdown/*` routes live under it)
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PollConfig {
    /// Poll interval while the site is running
    #[serde(default = "default_running_interval")]
    pub running_interval_secs: u64,

    /// Poll interval while the site is shut down
    #[serde(default = "default_shutdown_interval")]
    pub shutdown_interval_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GateConfig {
    /// IP address to bind to
    #[serde(default = "default_gate_ip")]
    pub ip: String,

    /// Port to listen on
    #[serde(default = "default_gate_port")]
    pub port: u16,

    /// Directory holding the front-end build served behind the gate
    #[serde(default = "default_site_root")]
    pub site_root: String,

    /// Notice shown when the site is shut down without a message
    #[serde(default = "default_notice")]
    pub default_notice: String,
}

/// Credentials for the admin console.
///
/// These are compared as plain strings on the machine running the console.
/// They keep casual visitors out of the controls; they are not an access
/// control for the status API, which must verify its callers itself.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,

    #[serde(default = "default_admin_password")]
    pub password: String,
}

impl PollConfig {
    pub fn running_interval(&self) -> Duration {
        Duration::from_secs(self.running_interval_secs)
    }

    pub fn shutdown_interval(&self) -> Duration {
        Duration::from_secs(self.shutdown_interval_secs)
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SitegateConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("api.base_url", default_api_base_url())?
            .set_default("api.request_timeout_secs", default_request_timeout())?
            .set_default("poll.running_interval_secs", default_running_interval())?
            .set_default("poll.shutdown_interval_secs", default_shutdown_interval())?
            .set_default("gate.ip", default_gate_ip())?
            .set_default("gate.port", default_gate_port())?
            .set_default("gate.site_root", default_site_root())?
            .set_default("gate.default_notice", default_notice())?
            .set_default("admin.username", default_admin_username())?
            .set_default("admin.password", default_admin_password())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // SITEGATE_API__BASE_URL, SITEGATE_GATE__PORT, ...
            .add_source(
                Environment::with_prefix("SITEGATE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: SitegateConfig = settings.try_deserialize()?;

        if config.admin.password == default_admin_password() {
            warn!("Admin console is using the default password; set admin.password");
        }

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::Message(
                "API base_url must not be empty".to_string(),
            ));
        }

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Message(format!(
                "API base_url must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "API request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.poll.running_interval_secs == 0 || self.poll.shutdown_interval_secs == 0 {
            return Err(ConfigError::Message(
                "Poll intervals must be greater than 0".to_string(),
            ));
        }

        // Shut-down polling must not be slower than running polling
        if self.poll.shutdown_interval_secs > self.poll.running_interval_secs {
            return Err(ConfigError::Message(
                "Poll shutdown_interval_secs must not exceed running_interval_secs".to_string(),
            ));
        }

        if self.gate.default_notice.trim().is_empty() {
            return Err(ConfigError::Message(
                "Gate default_notice must not be empty".to_string(),
            ));
        }

        if self.admin.username.is_empty() || self.admin.password.is_empty() {
            return Err(ConfigError::Message(
                "Admin username and password must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for SitegateConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: default_api_base_url(),
                request_timeout_secs: default_request_timeout(),
            },
            poll: PollConfig {
                running_interval_secs: default_running_interval(),
                shutdown_interval_secs: default_shutdown_interval(),
            },
            gate: GateConfig {
                ip: default_gate_ip(),
                port: default_gate_port(),
                site_root: default_site_root(),
                default_notice: default_notice(),
            },
            admin: AdminConfig {
                username: default_admin_username(),
                password: default_admin_password(),
            },
        }
    }
}

// Default value functions
fn default_api_base_url() -> String {
    "http://localhost:5000/api".to_string()
}
fn default_request_timeout() -> u64 {
    10
}

fn default_running_interval() -> u64 {
    60
}
fn default_shutdown_interval() -> u64 {
    30
}

fn default_gate_ip() -> String {
    "0.0.0.0".to_string()
}
fn default_gate_port() -> u16 {
    8080
}
fn default_site_root() -> String {
    "./dist".to_string()
}
pub(crate) fn default_notice() -> String {
    "We're sorry, the website is temporarily unavailable for maintenance. Please check back soon."
        .to_string()
}

fn default_admin_username() -> String {
    "admin".to_string()
}
fn default_admin_password() -> String {
    "change-me".to_string()
}
