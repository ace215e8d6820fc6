//! Error types for reference stages.

use scanline_core::{ImageAttributes, PixelType};
use scanline_graph::GraphError;
use thiserror::Error;

/// Error type for stage construction.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Operation not supported for this format.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Graph construction or execution failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Core type rejected the request.
    #[error(transparent)]
    Core(#[from] scanline_core::Error),
}

/// Result type for stage construction.
pub type OpsResult<T> = Result<T, OpsError>;

/// Stages doing arithmetic on samples work on `f32` planes.
pub(crate) fn require_float(stage: &str, attr: &ImageAttributes) -> OpsResult<()> {
    if attr.pixel_type != PixelType::Float {
        return Err(OpsError::Unsupported(format!(
            "{} works on float planes, got {}",
            stage, attr.pixel_type
        )));
    }
    Ok(())
}
