//! Tessera CLI - decode and inspect raw tensor buffers

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

mod commands;
mod config;
mod utils;

use commands::{batch::BatchCommand, inspect::InspectCommand, Command};

#[derive(Parser)]
#[command(
    name = "tessera",
    version = env!("CARGO_PKG_VERSION"),
    about = "Decode and inspect multi-precision tensor buffers",
    long_about = "Decodes raw fp32, fp16, int32, int8, packed int4 and packed ternary buffers into tensors and reports their contents."
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TESSERA_CONFIG")]
    config: Option<PathBuf>,

    /// JSON output format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one raw file and summarize it
    #[command(name = "inspect", alias = "i")]
    Inspect(InspectCommand),

    /// Decode every tensor listed in a TOML manifest
    #[command(name = "batch", alias = "b")]
    Batch(BatchCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load(cli.config.as_deref())?;

    // Initialize logging; flags override the configured level
    init_logging(&cli, config.factory.logging.level.as_tracing_level())?;

    debug!("Tessera CLI v{} starting", env!("CARGO_PKG_VERSION"));
    debug!("Configuration loaded: {:?}", config);

    // Execute command
    let result = match &cli.command {
        Commands::Inspect(cmd) => cmd.execute(&config, cli.json),
        Commands::Batch(cmd) => cmd.execute(&config, cli.json),
    };

    match result {
        Ok(_) => {
            if !cli.quiet {
                info!("Command completed successfully");
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_logging(cli: &Cli, configured: Level) -> Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else if cli.quiet {
        Level::ERROR
    } else {
        configured
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
