use anyhow::Result;
use clap::{Parser, Subcommand};
use sitegate::admin::{ScriptedPrompter, TerminalPrompter};
use sitegate::logging::{self, LogOptions};
use sitegate::{
    AdminConsole, AdminControlPanel, HttpStatusBackend, MockStatusBackend, Prompter,
    SitegateConfig, StatusBackend, StatusStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "sitegate")]
#[command(about = "Maintenance-mode gate and admin console for the institute website")]
#[command(version)]
#[command(long_about = "Polls the site status API and keeps visitors away from the website \
while it is in maintenance mode. The same binary provides a one-shot status check and an \
interactive admin console for taking the site down and bringing it back up.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "sitegate.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Write logs to daily rotated files in this directory
    #[arg(long, value_name = "DIR", help = "Directory for daily rotated log files")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the status API and serve the gated site (default)
    Serve {
        /// Initialize components but don't start them
        #[arg(long)]
        dry_run: bool,

        /// Use an in-memory status API that always reports a running site
        #[arg(long)]
        offline: bool,
    },
    /// Read the site status once and print it
    Status,
    /// Interactive admin console
    Admin {
        /// Answer yes to confirmation prompts
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let command = args.command.take().unwrap_or(Command::Serve {
        dry_run: false,
        offline: false,
    });

    let log_guard = logging::init(&log_options(&args, &command))?;

    let exit_code = run(&args, command).await.map_err(|e| {
        error!("Sitegate failed: {:#}", e);
        e
    })?;

    info!("Sitegate exited with code: {}", exit_code);
    log_guard.exit(exit_code);
}

async fn run(args: &Args, command: Command) -> Result<i32> {
    info!("Starting sitegate v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match SitegateConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        return match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                Ok(0)
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                Ok(1)
            }
        };
    }

    config.validate()?;

    match command {
        Command::Serve { dry_run, offline } => serve(config, dry_run, offline).await,
        Command::Status => status(&config).await,
        Command::Admin { yes } => admin(config, yes).await,
    }
}

#[cfg(feature = "server")]
async fn serve(config: SitegateConfig, dry_run: bool, offline: bool) -> Result<i32> {
    use sitegate::SitegateOrchestrator;

    let mut orchestrator = if offline {
        info!("Offline mode - using in-memory status API");
        SitegateOrchestrator::with_backend(config, Arc::new(MockStatusBackend::new()))
    } else {
        SitegateOrchestrator::new(config).map_err(|e| {
            error!("Failed to create orchestrator: {}", e);
            e
        })?
    };

    orchestrator.initialize().await.map_err(|e| {
        error!("Failed to initialize sitegate: {}", e);
        e
    })?;

    if dry_run {
        info!("Dry run mode - components initialized but not started");
        println!("✓ Dry run completed successfully - all components initialized");
        return Ok(0);
    }

    orchestrator.start().await.map_err(|e| {
        error!("Failed to start sitegate: {}", e);
        e
    })?;

    let exit_code = orchestrator.run().await.map_err(|e| {
        error!("Sitegate error during execution: {}", e);
        e
    })?;

    Ok(exit_code)
}

#[cfg(not(feature = "server"))]
async fn serve(_config: SitegateConfig, _dry_run: bool, _offline: bool) -> Result<i32> {
    anyhow::bail!("sitegate was built without the 'server' feature")
}

async fn status(config: &SitegateConfig) -> Result<i32> {
    let store = StatusStore::new(http_backend(config)?);

    match store.refresh().await {
        Ok(status) => {
            println!("Site status: {}", status);
            Ok(0)
        }
        Err(e) => {
            error!("Failed to read site status: {}", e);
            eprintln!("✗ Could not read site status: {}", e);
            Ok(1)
        }
    }
}

async fn admin(config: SitegateConfig, yes: bool) -> Result<i32> {
    let store = StatusStore::new(http_backend(&config)?);
    if let Err(e) = store.refresh().await {
        eprintln!("! Could not read site status: {}", e);
    }

    let confirmer: Arc<dyn Prompter> = if yes {
        Arc::new(ScriptedPrompter::confirming(true))
    } else {
        Arc::new(TerminalPrompter)
    };
    let panel = AdminControlPanel::new(store, config.admin, confirmer);

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut console = AdminConsole::new(panel, Arc::new(TerminalPrompter), input, tokio::io::stdout());
    console.run().await?;

    Ok(0)
}

fn http_backend(config: &SitegateConfig) -> Result<Arc<dyn StatusBackend>> {
    let backend = HttpStatusBackend::new(&config.api)?;
    info!("Using status API at {}", backend.base_url());
    Ok(Arc::new(backend))
}

fn log_options(args: &Args, command: &Command) -> LogOptions {
    // Determine log level based on flags
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    LogOptions {
        level: level.to_string(),
        format: args.log_format.clone(),
        log_dir: args.log_dir.as_ref().map(PathBuf::from),
        interactive: matches!(command, Command::Admin { .. }),
        detailed: args.debug,
    }
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Sitegate Configuration File");
    println!("# Every option can also be set through SITEGATE_<SECTION>__<KEY>");
    println!();
    println!("{}", toml::to_string_pretty(&SitegateConfig::default())?);
    Ok(())
}
