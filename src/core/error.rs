//! Error types for SVM implementation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SVMError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Model not trained")]
    ModelNotTrained,

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Invalid label at index {index}: expected -1 or +1, got {label}")]
    InvalidLabel { index: usize, label: i32 },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty dataset")]
    EmptyDataset,
}

pub type Result<T> = std::result::Result<T, SVMError>;
