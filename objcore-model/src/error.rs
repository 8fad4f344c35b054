//! Error types for the object kernel.

use thiserror::Error;

/// Result type for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

/// Errors raised by the strict kernel surface.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Copy target (or decoded payload) is not the expected variant.
    #[error("type mismatch: expected variant `{expected}`, got `{actual}`")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Canonical text is malformed or cannot be decoded into the variant.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The receiver refuses the operation (the Void sentinel on copy).
    #[error("unsupported operation `{operation}` on {variant}")]
    UnsupportedOperation {
        operation: &'static str,
        variant: &'static str,
    },

    /// Field is not part of the variant's declared field set.
    #[error("variant `{variant}` has no field `{field}`")]
    UnknownField {
        variant: &'static str,
        field: String,
    },

    /// Value kind does not match the declared field type.
    #[error("field `{field}` expects {expected}, got {actual}")]
    FieldType {
        field: String,
        expected: String,
        actual: &'static str,
    },

    /// Metadata keys must be non-blank.
    #[error("invalid metadata key: {0:?}")]
    InvalidMetadataKey(String),

    /// Value nesting exceeded the codec limit (usually a reference cycle).
    #[error("nesting depth exceeded (max {max_depth})")]
    DepthExceeded { max_depth: usize },

    /// A shared container was mutably borrowed while the kernel read it.
    #[error("{0} is mutably borrowed elsewhere")]
    BorrowConflict(&'static str),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
