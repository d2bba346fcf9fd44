//! Error types for spatial index construction.

/// Errors that can occur while building a point index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SpatialError {
    /// The point set is empty.
    #[error("no points to index")]
    EmptyPointSet,

    /// A point has a NaN or infinite coordinate.
    #[error("point {index} has a non-finite coordinate")]
    NonFinitePoint {
        /// Index of the offending point in the input set.
        index: usize,
    },

    /// The point set is larger than the index can address.
    #[error("point set of {count} points exceeds the index capacity")]
    TooManyPoints {
        /// Number of points supplied.
        count: usize,
    },
}

/// Result type for spatial index operations.
pub type SpatialResult<T> = Result<T, SpatialError>;
