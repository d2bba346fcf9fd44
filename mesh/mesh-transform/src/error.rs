//! Error types for transform configuration.

use thiserror::Error;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors that can occur when validating or building transforms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransformError {
    /// A component is NaN or infinite.
    #[error("{field} has a non-finite component")]
    NonFinite {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A scale component is zero, collapsing an axis.
    #[error("scale is zero on the {axis} axis")]
    DegenerateScale {
        /// The collapsed axis (`'x'`, `'y'` or `'z'`).
        axis: char,
    },

    /// Matrix is not invertible.
    #[error("matrix is not invertible")]
    NotInvertible,
}
