//! arch-gate CLI tool.
//!
//! Usage:
//! ```bash
//! arch-gate check [OPTIONS] --usages <FILE> [PATH]
//! arch-gate components [PATH]
//! arch-gate init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Architecture conformance checker: finds dependency-rule violations
/// hidden behind dependency injection
#[derive(Parser)]
#[command(name = "arch-gate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the rule document
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the deep scan
    Check {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// JSON file with usage trees exported by a language front-end
        #[arg(short, long, env = "ARCH_GATE_USAGES")]
        usages: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Number of components checked in parallel (default: CPU-based)
        #[arg(short, long)]
        workers: Option<NonZeroUsize>,

        /// Walk files ignored by .gitignore too
        #[arg(long)]
        no_gitignore: bool,
    },

    /// Print every component with its resolved allowed imports
    Components {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Initialize a rule document
    Init {
        /// Overwrite existing document
        #[arg(long)]
        force: bool,
    },
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with code previews.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-warning compact format.
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            path,
            usages,
            format,
            workers,
            no_gitignore,
        } => {
            let source = config_resolver::resolve(&path, cli.config.as_deref());
            commands::check::run(&commands::check::CheckArgs {
                path,
                usages,
                format,
                workers,
                respect_gitignore: !no_gitignore,
                source,
            })
        }
        Commands::Components { path } => {
            let source = config_resolver::resolve(&path, cli.config.as_deref());
            commands::components::run(&path, &source)
        }
        Commands::Init { force } => commands::init::run(force),
    }
}
