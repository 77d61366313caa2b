//! `folio extensions` command implementation.

use std::path::PathBuf;

use clap::Args;
use folio_config::Config;
use folio_renderer::ExtensionSummary;

use crate::commands::pipeline_from_config;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the extensions command.
#[derive(Args)]
pub(crate) struct ExtensionsArgs {
    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ExtensionsArgs {
    /// Execute the extensions command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the extension list is invalid.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let pipeline = pipeline_from_config(&config)?;

        let summaries = pipeline.registry().summaries();
        output.highlight(&format!("{} extensions, in registration order:", summaries.len()));
        for line in format_summaries(&summaries) {
            output.line(&line);
        }
        Ok(())
    }
}

fn format_summaries(summaries: &[ExtensionSummary]) -> Vec<String> {
    let width = summaries.iter().map(|s| s.name.len()).max().unwrap_or(0);
    summaries
        .iter()
        .map(|s| {
            format!(
                "  {:<width$}  parse: {:>2}  render: {:>2}",
                s.name, s.parse_rules, s.render_rules
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_format_summaries_aligns_names() {
        let summaries = [
            ExtensionSummary {
                name: "emoji".to_owned(),
                parse_rules: 1,
                render_rules: 1,
            },
            ExtensionSummary {
                name: "core".to_owned(),
                parse_rules: 14,
                render_rules: 21,
            },
        ];
        assert_eq!(
            format_summaries(&summaries),
            [
                "  emoji  parse:  1  render:  1",
                "  core   parse: 14  render: 21",
            ]
        );
    }

    #[test]
    fn test_configured_subset_lists_core_last() {
        let mut config = Config::default();
        config.render.extensions = Some(vec!["footnote".to_owned()]);
        let pipeline = pipeline_from_config(&config).unwrap();
        let names: Vec<_> = pipeline.registry().summaries().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["footnote", "core"]);
    }
}
