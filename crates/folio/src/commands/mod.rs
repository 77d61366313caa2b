//! CLI command implementations.

pub(crate) mod extensions;
pub(crate) mod render;

pub(crate) use extensions::ExtensionsArgs;
pub(crate) use render::RenderArgs;

use std::sync::Arc;

use folio_config::Config;
use folio_renderer::Pipeline;
use folio_renderer::ext::standard_registry;

use crate::error::CliError;

/// Build the pipeline described by a loaded configuration.
pub(crate) fn pipeline_from_config(config: &Config) -> Result<Pipeline, CliError> {
    let registry = standard_registry(config.extensions(), &config.standard_options())?;
    Ok(Pipeline::new(Arc::new(registry), config.pipeline_options()))
}
