//! Host boundary: read access to blendshape meshes and the output sink.

use nalgebra::{Point3, Vector3};

/// Borrowed view of one blendshape frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    /// Frame weight.
    pub weight: f64,
    /// One vertex displacement per mesh vertex.
    pub delta_vertices: &'a [Vector3<f64>],
    /// One normal delta per mesh vertex.
    pub delta_normals: &'a [Vector3<f64>],
    /// One tangent delta per mesh vertex.
    pub delta_tangents: &'a [Vector3<f64>],
}

/// Read-only access to a mesh's rest pose and blendshapes.
///
/// Implemented by [`BlendShapeMesh`](crate::BlendShapeMesh); hosts with
/// their own mesh storage can implement it directly to avoid a copy.
pub trait BlendShapeSource {
    /// Rest-pose vertex positions in mesh-local space.
    fn vertices(&self) -> &[Point3<f64>];

    /// Number of blendshapes.
    fn blend_shape_count(&self) -> usize;

    /// Name of the blendshape at `shape`, or `None` if out of range.
    fn blend_shape_name(&self, shape: usize) -> Option<&str>;

    /// Number of frames of the blendshape at `shape` (0 if out of range).
    fn frame_count(&self, shape: usize) -> usize;

    /// A frame of a blendshape, or `None` if either index is out of range.
    fn frame(&self, shape: usize, frame: usize) -> Option<FrameView<'_>>;

    /// Number of vertices.
    fn vertex_count(&self) -> usize {
        self.vertices().len()
    }

    /// Index of the blendshape called `name`.
    fn find_blend_shape(&self, name: &str) -> Option<usize> {
        (0..self.blend_shape_count()).find(|&i| self.blend_shape_name(i) == Some(name))
    }
}

/// Receives transferred blendshape frames for persistence.
///
/// Called once per emitted channel. The transfer core does not depend on
/// how the host stores the result.
///
/// Frames are delivered one at a time, and emission stops at the first
/// error, so earlier frames stay written. A sink that needs all-or-nothing
/// output must stage frames and commit them after emission returns `Ok`.
/// [`TransferOutput::apply_to`](crate::TransferOutput::apply_to) does this
/// for [`BlendShapeMesh`](crate::BlendShapeMesh) by writing to a copy.
pub trait BlendShapeSink {
    /// Error reported by the sink.
    type Error;

    /// Adds one frame to the blendshape called `name`, creating the
    /// blendshape if needed.
    ///
    /// # Errors
    ///
    /// Implementation defined; typically a field length mismatch or a
    /// frame weight ordering violation.
    fn add_blend_shape_frame(
        &mut self,
        name: &str,
        weight: f64,
        delta_vertices: &[Vector3<f64>],
        delta_normals: &[Vector3<f64>],
        delta_tangents: &[Vector3<f64>],
    ) -> Result<(), Self::Error>;
}
