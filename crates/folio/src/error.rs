//! CLI error types.

use folio_config::ConfigError;
use folio_renderer::{ParseError, PipelineError, RegistryError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
