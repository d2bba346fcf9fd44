//! Error types for blendshape data and transfer.

use cf_spatial::SpatialError;
use mesh_transform::TransformError;
use thiserror::Error;

/// Errors raised when editing blendshape mesh data.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum MeshError {
    /// A per-vertex field does not have one entry per vertex.
    #[error("{field} has {actual} entries, mesh has {expected} vertices")]
    VertexCountMismatch {
        /// Which field was wrong.
        field: &'static str,
        /// Mesh vertex count.
        expected: usize,
        /// Length of the supplied field.
        actual: usize,
    },

    /// A frame weight does not exceed the previous frame of the same blendshape.
    #[error("frame weight {weight} for '{name}' must be greater than {previous}")]
    FrameWeightOrder {
        /// Blendshape name.
        name: String,
        /// Weight of the last existing frame.
        previous: f64,
        /// Rejected weight.
        weight: f64,
    },

    /// A frame weight is NaN or infinite.
    #[error("frame weight for '{name}' is not finite")]
    NonFiniteWeight {
        /// Blendshape name.
        name: String,
    },

    /// A blendshape name is empty.
    #[error("blendshape name must not be empty")]
    EmptyName,
}

/// Result type for mesh data operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that can occur during blendshape transfer.
///
/// Every error aborts the whole run before any output is produced.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum TransferError {
    /// No source mesh was supplied.
    #[error("source mesh is missing")]
    MissingSourceMesh,

    /// No target mesh was supplied.
    #[error("target mesh is missing")]
    MissingTargetMesh,

    /// Source mesh has no vertices.
    #[error("source mesh has no vertices")]
    EmptySourceMesh,

    /// Target mesh has no vertices.
    #[error("target mesh has no vertices")]
    EmptyTargetMesh,

    /// A selected channel does not exist on the source mesh.
    #[error("blendshape '{name}' not found on source mesh")]
    UnknownChannel {
        /// The requested name.
        name: String,
    },

    /// A blendshape reported by the source mesh has no name.
    #[error("source blendshape {index} has no name")]
    UnnamedChannel {
        /// Blendshape index on the source mesh.
        index: usize,
    },

    /// The source mesh reports more than one blendshape with this name.
    #[error("blendshape '{name}' appears more than once on source mesh")]
    DuplicateChannel {
        /// Repeated name.
        name: String,
    },

    /// A selected channel has no frames.
    #[error("blendshape '{name}' has no frames")]
    EmptyChannel {
        /// Blendshape name.
        name: String,
    },

    /// A frame's delta field does not match the source vertex count.
    #[error("blendshape '{name}' has {actual} vertex deltas, source mesh has {expected} vertices")]
    DeltaCountMismatch {
        /// Blendshape name.
        name: String,
        /// Source vertex count.
        expected: usize,
        /// Delta field length.
        actual: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Search transform or mesh placement is unusable.
    #[error("invalid transform: {0}")]
    Transform(#[from] TransformError),

    /// The source point index could not be built.
    #[error("cannot index source vertices: {0}")]
    Index(#[from] SpatialError),

    /// Writing the output mesh failed.
    #[error("cannot write output mesh: {0}")]
    Mesh(#[from] MeshError),

    /// The observer requested cancellation.
    #[error("transfer cancelled after {completed} of {total} target vertices")]
    Cancelled {
        /// Target vertices processed before cancellation.
        completed: usize,
        /// Total target vertices.
        total: usize,
    },
}

impl TransferError {
    /// Creates an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(reason: impl Into<String>) -> Self {
        Self::InvalidParameter(reason.into())
    }
}

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_channel() {
        let err = TransferError::DeltaCountMismatch {
            name: "smile".to_string(),
            expected: 10,
            actual: 9,
        };
        assert_eq!(
            err.to_string(),
            "blendshape 'smile' has 9 vertex deltas, source mesh has 10 vertices"
        );
    }

    #[test]
    fn wraps_lower_layer_errors() {
        let err: TransferError = SpatialError::EmptyPointSet.into();
        assert_eq!(err.to_string(), "cannot index source vertices: no points to index");

        let err: TransferError = TransformError::DegenerateScale { axis: 'x' }.into();
        assert!(matches!(err, TransferError::Transform(_)));
    }

    #[test]
    fn invalid_parameter_helper() {
        let err = TransferError::invalid_parameter("max distance must be positive");
        assert_eq!(
            err.to_string(),
            "invalid parameter: max distance must be positive"
        );
    }
}
