//! CLI errors.

use ormbind_core::BindError;
use thiserror::Error;

/// Errors reported by the command-line compiler.
#[derive(Debug, Error)]
pub enum CliError {
    /// The mapping document could not be loaded.
    #[error("{0}")]
    Load(#[from] ormbind_core::Error),

    /// Compilation failed.
    #[error("{0}")]
    Bind(#[from] BindError),

    /// The model could not be rendered.
    #[error("failed to render model: {0}")]
    Render(#[from] serde_json::Error),
}
