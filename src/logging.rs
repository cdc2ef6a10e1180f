use crate::error::{Result, SitegateError};
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// How and where log lines are written
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Level for the `sitegate` target when `RUST_LOG` is unset
    pub level: String,
    /// `json`, `pretty` or `compact`
    pub format: Option<String>,
    /// Daily rotated files in this directory instead of the terminal
    pub log_dir: Option<PathBuf>,
    /// Keep stdout free for an interactive console
    pub interactive: bool,
    /// File, thread and line details in pretty output
    pub detailed: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: None,
            log_dir: None,
            interactive: false,
            detailed: false,
        }
    }
}

/// Flushes buffered file output when dropped.
///
/// `std::process::exit` skips destructors, so call [`LogGuard::exit`] rather
/// than exiting with the guard still alive.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard(Option<WorkerGuard>);

impl LogGuard {
    /// Flush pending log lines, then exit the process
    pub fn exit(self, code: i32) -> ! {
        drop(self);
        std::process::exit(code)
    }
}

/// Install the global subscriber
pub fn init(options: &LogOptions) -> Result<LogGuard> {
    let (subscriber, guard) = subscriber(options)?;
    subscriber
        .try_init()
        .map_err(|e| SitegateError::system(format!("Failed to install logger: {}", e)))?;
    Ok(guard)
}

/// Build the subscriber without installing it
pub fn subscriber(
    options: &LogOptions,
) -> Result<(impl Subscriber + Send + Sync + 'static, LogGuard)> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sitegate={}", options.level)));

    let (writer, guard, ansi) = match &options.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "sitegate.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard), false)
        }
        None if options.interactive => (BoxMakeWriter::new(std::io::stderr), None, true),
        None => (BoxMakeWriter::new(std::io::stdout), None, true),
    };

    let fmt_layer = match options.format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .with_thread_ids(options.detailed)
            .with_file(options.detailed)
            .with_line_number(options.detailed)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(true)
                .boxed()
        }
    };

    let subscriber = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter);

    Ok((subscriber, LogGuard(guard)))
}
