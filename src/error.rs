use crate::parameters::{ConstructionError, ParameterError, TypeMismatch, VariableError};
use thiserror::Error;

/// Error types for the libdsp-rs library.
#[derive(Error, Debug)]
pub enum LibDspError {
    /// Invalid range, set or variable definition.
    #[error("Construction error: {0}")]
    Construction(#[from] ConstructionError),

    /// Error raised while writing a variable.
    #[error("Variable error: {0}")]
    Variable(#[from] VariableError),

    /// Error for parameter-related problems.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<TypeMismatch> for LibDspError {
    fn from(err: TypeMismatch) -> Self {
        LibDspError::Variable(VariableError::TypeMismatch(err))
    }
}

/// Result type alias for libdsp-rs operations.
pub type Result<T> = std::result::Result<T, LibDspError>;
