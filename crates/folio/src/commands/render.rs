//! `folio render` command implementation.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use folio_config::{CliSettings, Config};
use folio_renderer::Pipeline;

use crate::commands::pipeline_from_config;
use crate::error::CliError;
use crate::output::Output;

/// Output format for the render command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    /// The HTML fragment.
    #[default]
    Html,
    /// `{"html": ..., "metadata": ...}` for a templating step.
    Json,
    /// The parsed document tree.
    Ast,
}

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Path to the markdown file.
    file: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    format: Format,

    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum nesting depth (overrides config).
    #[arg(long)]
    max_depth: Option<usize>,

    /// Treat a leading `---` block as ordinary markdown.
    #[arg(long)]
    no_front_matter: bool,

    /// Enable verbose output (per-document parse and render logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, reading or rendering fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            max_nesting_depth: self.max_depth,
            front_matter: self.no_front_matter.then_some(false),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let pipeline = pipeline_from_config(&config)?;

        let text = std::fs::read_to_string(&self.file)?;
        tracing::info!(file = %self.file.display(), bytes = text.len(), "Rendering");

        let rendered = render(&pipeline, &text, self.format)?;
        output.document(&rendered)?;
        Ok(())
    }
}

/// Render `text` in the requested format.
fn render(pipeline: &Pipeline, text: &str, format: Format) -> Result<String, CliError> {
    match format {
        Format::Html => Ok(pipeline.render_document(text)?.html),
        Format::Json => {
            let rendered = pipeline.render_document(text)?;
            let mut json = serde_json::to_string_pretty(&rendered)?;
            json.push('\n');
            Ok(json)
        }
        Format::Ast => {
            let document = pipeline.parse(text)?;
            let mut json = serde_json::to_string_pretty(&document)?;
            json.push('\n');
            Ok(json)
        }
    }
}
