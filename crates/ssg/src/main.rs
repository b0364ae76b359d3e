//! ssg CLI - Incremental static site generator.
//!
//! Provides commands for:
//! - `build`: Render changed Markdown sources into the output directory
//! - `clean`: Remove the output directory and the build cache

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, CleanArgs};
use output::Output;

/// ssg - Incremental static site generator.
#[derive(Parser)]
#[command(name = "ssg", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site, rendering only what changed.
    Build(BuildArgs),
    /// Remove generated output and the build cache.
    Clean(CleanArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG
    let verbose = matches!(&cli.command, Commands::Build(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::Clean(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::try_parse_from(["ssg", "build", "--jobs", "4", "--strict", "--force", "-v"]).unwrap();
        assert!(matches!(cli.command, Commands::Build(args) if args.verbose));
    }

    #[test]
    fn test_parse_clean() {
        let cli = Cli::try_parse_from(["ssg", "clean", "--config", "site/ssg.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::Clean(_)));
    }
}
