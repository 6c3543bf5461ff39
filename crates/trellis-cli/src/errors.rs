//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;
use trellis_plugins::CatalogError;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to list plugins: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(#[from] io::Error),
}
