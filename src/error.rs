//! Error taxonomy for the editing core.
//!
//! Nothing here is fatal. Remote failures are reverted locally and surfaced
//! as notices; hydration failures mark a single layer as failed. Invariant
//! violations (unknown ids and the like) are not errors at all: they are
//! logged and ignored by the action planner.

use crate::layers::LayerKind;

/// Stable, machine-readable code for an error.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}

/// Failure reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("remote rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("remote unreachable: {0}")]
    Unreachable(String),
    #[error("malformed remote response: {0}")]
    Malformed(String),
}

impl ErrorCode for RemoteError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "E_SYNC_REJECTED",
            Self::Unreachable(_) => "E_SYNC_UNREACHABLE",
            Self::Malformed(_) => "E_SYNC_MALFORMED",
        }
    }
}

/// Failure to load one layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HydrateError {
    #[error("layer {layer}: record {index} is missing required field `{field}`")]
    MissingField { layer: LayerKind, index: usize, field: &'static str },
    #[error("layer {layer}: record {index} has invalid field `{field}`")]
    InvalidField { layer: LayerKind, index: usize, field: &'static str },
    #[error("layer {layer}: more than {max} pages")]
    TooManyPages { layer: LayerKind, max: usize },
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl ErrorCode for HydrateError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField { .. } | Self::InvalidField { .. } => "E_LAYER_MALFORMED",
            Self::TooManyPages { .. } => "E_LAYER_TOO_LARGE",
            Self::Remote(e) => e.error_code(),
        }
    }
}
