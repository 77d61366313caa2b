//! folio CLI - extensible markdown renderer.
//!
//! Provides commands for:
//! - `render`: Render a markdown file to HTML, JSON or an AST dump
//! - `extensions`: List the active extensions and their rule counts

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ExtensionsArgs, RenderArgs};
use output::Output;

/// folio - extensible markdown renderer.
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown file.
    Render(RenderArgs),
    /// List the active extensions in registration order.
    Extensions(ExtensionsArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::Extensions(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render_flags() {
        let cli = Cli::try_parse_from([
            "folio",
            "render",
            "doc.md",
            "--format",
            "json",
            "--max-depth",
            "50",
            "--no-front-matter",
            "-v",
        ])
        .unwrap();
        assert!(matches!(&cli.command, Commands::Render(args) if args.verbose));
    }

    #[test]
    fn test_reject_unknown_format() {
        assert!(Cli::try_parse_from(["folio", "render", "doc.md", "--format", "pdf"]).is_err());
    }
}
