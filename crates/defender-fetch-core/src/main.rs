//! defender-fetch CLI
//!
//! Meant to be started by an external scheduler. Each invocation performs a
//! single run and exits non-zero if any step fails.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use defender_fetch::fetch::Pipeline;
use defender_fetch::logging;
use defender_fetch::models::{TimeRange, TimeWindow};
use defender_fetch::Config;

/// defender-fetch - append new Defender alerts to a dated file
#[derive(Parser)]
#[command(name = "defender-fetch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        env = "DEFENDER_CONFIG",
        default_value = "config.yaml"
    )]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Subcommand)]
enum Commands {
    /// Fetch alerts and append them to today's file (default)
    Run,

    /// Validate the configuration and show the threshold a run would use
    Validate,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A .env file may provide DEFENDER_* overrides, including the config path
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run);

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            if logging::init("error", None).is_ok() {
                error!("Check {}: {e}", cli.config.display());
            } else {
                eprintln!("Error loading configuration: {e}");
            }
            return ExitCode::FAILURE;
        }
    };

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let output_dir = config.output_dir();
    let log_dir = match command {
        Commands::Run => Some(output_dir.as_path()),
        Commands::Validate => None,
    };

    let _guard = match logging::init(level, log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match command {
        Commands::Run => run(&config).await,
        Commands::Validate => validate(&config, &cli.config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config).context("failed to set up pipeline")?;
    let report = pipeline.run().await?;

    info!(
        alerts = report.alerts_written,
        since = %report.window,
        file = ?report.output_file,
        "Run complete"
    );

    Ok(())
}

fn validate(config: &Config, path: &std::path::Path) -> anyhow::Result<()> {
    let range = TimeRange::parse(&config.timerange)?;
    let window = TimeWindow::from_now(range)?;
    let pipeline = Pipeline::new(config)?;

    println!("Configuration OK: {}", path.display());
    println!("  Token endpoint: {}", pipeline.authenticator().token_url());
    println!("  Alerts API:     {}", pipeline.fetcher().alerts_url());
    println!("  Output dir:     {}", pipeline.writer().output_dir().display());
    println!("  Threshold:      {}", window.threshold());

    Ok(())
}
