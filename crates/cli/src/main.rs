//! Sutr CLI - Main Entry Point
//!
//! `sutr configure` stores credentials and writes publish profiles;
//! `sutr publish` deploys a profile's skill and lambda code.

use clap::{Parser, Subcommand};

use sutr_cli::commands::{configure, publish};
use sutr_cli::{output, CliError};

/// Sutr - publish voice assistant skills
#[derive(Parser)]
#[command(name = "sutr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure credentials and create a publish profile
    Configure(configure::ConfigureArgs),

    /// Publish a skill and/or its lambda code
    Publish(publish::PublishArgs),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Configure(args) => configure::execute(args).await,
        Commands::Publish(args) => publish::execute(args, cli.verbose).await,
        Commands::Version => {
            println!("sutr v{}", sutr_common::VERSION);
            Ok(())
        }
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(CliError::exit_code_of(&e));
    }
}
