//! Error types for cubeql operations.

use thiserror::Error;

/// Result type alias using [`CubeError`].
pub type Result<T> = std::result::Result<T, CubeError>;

/// Coarse classification of a [`CubeError`].
///
/// Hosts use this to tell caller misuse apart from state problems and from
/// rendering paths a dialect does not provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller broke an API contract.
    Contract,
    /// The operation needs state that is not there yet (or any more).
    InvalidState,
    /// The node, value or dialect combination is not supported.
    Unsupported,
    /// Encoding or decoding failed.
    Serialization,
}

/// Error types for cubeql operations.
#[derive(Debug, Error)]
pub enum CubeError {
    // ==================== Contract Violations ====================
    /// Caller misuse: blank names, re-set alias, re-set source table, bad index.
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    // ==================== Invalid State ====================
    /// Operation attempted in the wrong lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Lookup of a catalog, keyword or dialect entry that does not exist.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    // ==================== Unsupported ====================
    /// Rendering path or API not available for this node/dialect pair.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Native value kind that cannot be wrapped as a literal.
    #[error("Unsupported literal type: {0}")]
    UnsupportedLiteral(String),

    // ==================== Serialization ====================
    /// Catalog or descriptor (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CubeError {
    /// Shorthand for a [`CubeError::NotFound`].
    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        CubeError::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            CubeError::ContractViolation(_) => ErrorCategory::Contract,
            CubeError::InvalidState(_) | CubeError::NotFound { .. } => ErrorCategory::InvalidState,
            CubeError::UnsupportedOperation(_) | CubeError::UnsupportedLiteral(_) => {
                ErrorCategory::Unsupported
            }
            CubeError::Serialization(_) => ErrorCategory::Serialization,
        }
    }
}

impl From<serde_json::Error> for CubeError {
    fn from(err: serde_json::Error) -> Self {
        CubeError::Serialization(err.to_string())
    }
}

/// Fails with a contract violation if `value` is empty or only whitespace.
pub(crate) fn check_not_blank<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(CubeError::ContractViolation(format!(
            "{what} cannot be blank"
        )));
    }
    Ok(value)
}
