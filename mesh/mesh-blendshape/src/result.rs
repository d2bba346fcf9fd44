//! Transfer results and per-channel statistics.
//!
//! This module provides [`TransferOutput`], which holds every transferred
//! channel and can write them to a [`BlendShapeSink`] or onto a copy of
//! the target mesh.

use nalgebra::Vector3;

use crate::{BlendShapeMesh, BlendShapeSink, MeshResult};

/// Target-to-source vertex correspondences, one slot per target vertex.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CorrespondenceMap {
    matches: Vec<Option<usize>>,
}

impl CorrespondenceMap {
    /// Wraps a per-target-vertex list of source matches.
    #[must_use]
    pub const fn new(matches: Vec<Option<usize>>) -> Self {
        Self { matches }
    }

    /// Source vertex matched to `target_vertex`, if any.
    #[must_use]
    pub fn source_of(&self, target_vertex: usize) -> Option<usize> {
        self.matches.get(target_vertex).copied().flatten()
    }

    /// All slots in target vertex order.
    #[must_use]
    pub fn as_slice(&self) -> &[Option<usize>] {
        &self.matches
    }

    /// Number of target vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether the map covers no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Number of target vertices with a source match.
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_some()).count()
    }
}

/// Per-channel counts describing how target vertices were filled.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShapeStats {
    /// Vertices that received a non-zero delta.
    pub transferred: usize,
    /// Vertices matched to a source vertex whose delta was negligible.
    pub suppressed: usize,
    /// Vertices with no source vertex within the search radius.
    pub unmatched: usize,
    /// Largest output delta magnitude.
    pub max_delta: f64,
}

/// One transferred blendshape channel, ready to add to the target mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferredShape {
    /// Channel name, copied from the source.
    pub name: String,
    /// Weight of the source frame the deltas came from.
    pub weight: f64,
    /// One delta per target vertex.
    pub delta_vertices: Vec<Vector3<f64>>,
    /// Zero normal deltas, one per target vertex.
    pub delta_normals: Vec<Vector3<f64>>,
    /// Zero tangent deltas, one per target vertex.
    pub delta_tangents: Vec<Vector3<f64>>,
    /// Fill statistics.
    pub stats: ShapeStats,
}

/// Result of a blendshape transfer.
///
/// Nothing is written to any mesh until [`emit`](Self::emit) or
/// [`apply_to`](Self::apply_to) is called.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutput {
    /// Transferred channels, in source mesh order.
    pub shapes: Vec<TransferredShape>,
    /// Correspondences shared by every channel.
    pub correspondences: CorrespondenceMap,
}

impl TransferOutput {
    /// The transferred channel called `name`.
    #[must_use]
    pub fn shape(&self, name: &str) -> Option<&TransferredShape> {
        self.shapes.iter().find(|s| s.name == name)
    }

    /// Number of transferred channels.
    #[must_use]
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Writes every channel to `sink`, once per channel, in order.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the sink. Channels before it
    /// have already been written.
    pub fn emit<S: BlendShapeSink + ?Sized>(&self, sink: &mut S) -> Result<(), S::Error> {
        for shape in &self.shapes {
            sink.add_blend_shape_frame(
                &shape.name,
                shape.weight,
                &shape.delta_vertices,
                &shape.delta_normals,
                &shape.delta_tangents,
            )?;
        }
        Ok(())
    }

    /// Returns a copy of `target` with every transferred channel added.
    ///
    /// `target` itself is never modified, so a failure leaves no partial
    /// mesh behind.
    ///
    /// # Errors
    ///
    /// Returns a [`MeshError`](crate::MeshError) if `target` does not have
    /// one vertex per delta, or if a channel already exists on `target`
    /// with a frame weight at or above the transferred one.
    pub fn apply_to(&self, target: &BlendShapeMesh) -> MeshResult<BlendShapeMesh> {
        let mut mesh = target.clone();
        self.emit(&mut mesh)?;
        Ok(mesh)
    }
}
