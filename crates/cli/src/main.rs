//! PowerSeq CLI - Main Entry Point
//!
//! Builds the test sequence and controller command sequence for a TV power
//! consumption run from the model's data folder.

use clap::{Parser, Subcommand};

mod commands;
mod output;
mod prompt;

use commands::{catalog, generate, show};

/// PowerSeq - TV power test sequence generator
#[derive(Parser)]
#[command(name = "powerseq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and save the test and command sequences
    Generate(generate::GenerateArgs),

    /// Print the sequence for a data folder without saving it
    Show(show::ShowArgs),

    /// List the test kinds in the catalog
    Catalog(catalog::CatalogArgs),

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
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

    match cli.command {
        Commands::Generate(args) => generate::execute(args, cli.format)?,
        Commands::Show(args) => show::execute(args, cli.format)?,
        Commands::Catalog(args) => catalog::execute(args, cli.format)?,
        Commands::Version => {
            output::print_message(
                &format!("PowerSeq CLI v{}", powerseq_common::VERSION),
                cli.format,
            );
        }
    }

    Ok(())
}
