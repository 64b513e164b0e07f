//! regather - scatter-queue drain worker entry point
//!
//! Loads configuration, wires the concrete collaborators (SQS client,
//! handshake client, optional audit sink), and drives one gather session.

use clap::{Parser, Subcommand};
use regather::audit::AuditLog;
use regather::config::GatherConfig;
use regather::handshake::HandshakeClient;
use regather::observability::init_default_logging;
use regather::queue::sqs::SqsQueue;
use regather::session::GatherSession;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Scatter-queue drain worker
#[derive(Parser)]
#[command(name = "regather")]
#[command(about = "Drains a scatter queue and republishes the reassembled phrase")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one gather session: handshake, drain, assemble, publish
    Run,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging(cli.verbose);

    info!("Starting regather v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_session(config).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<GatherConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(GatherConfig::load_from_file(path)?)
        }
        None => {
            // Try default locations
            let default_paths = vec!["regather.toml", "config/regather.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(GatherConfig::load_from_file(&path)?);
                }
            }

            error!(
                "No configuration file found. Please provide one with -c/--config or create regather.toml"
            );
            process::exit(1);
        }
    }
}

/// Bootstrap and run one session - all factory wiring lives here, separated
/// from the session's business logic
async fn run_session(config: GatherConfig) -> Result<(), Box<dyn std::error::Error>> {
    let session_id = Uuid::new_v4();
    info!(%session_id, identity_id = %config.session.identity_id, "Session starting");

    let queue = SqsQueue::connect(&config.queue).await;
    let handshake = HandshakeClient::new(&config.handshake)?;

    let audit = match config.audit.path.as_deref() {
        Some(path) => {
            info!("Audit log: {}", path.display());
            Some(AuditLog::create(path, session_id)?)
        }
        None => None,
    };

    let session = GatherSession::new(session_id, config, handshake, &queue, audit);
    let outcome = session.run().await?;

    if !outcome.complete {
        warn!(
            cycles = outcome.cycles,
            "Session ended at the cycle ceiling; the submitted phrase may be incomplete"
        );
    }
    info!(
        collected = outcome.collected,
        cycles = outcome.cycles,
        "Session complete"
    );
    println!("{}", outcome.phrase);

    Ok(())
}

fn handle_config_command(
    config: GatherConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}
