//! Blendshape mesh data model.

use nalgebra::{Point3, Vector3};

use crate::traits::{BlendShapeSink, BlendShapeSource, FrameView};
use crate::{MeshError, MeshResult};

/// One weighted snapshot of a blendshape's per-vertex deltas.
///
/// # Example
///
/// ```
/// use mesh_blendshape::BlendShapeFrame;
/// use nalgebra::Vector3;
///
/// let frame = BlendShapeFrame::new(100.0, vec![Vector3::new(0.0, 0.0, 0.01); 4]);
/// assert_eq!(frame.vertex_count(), 4);
/// assert!(frame.delta_normals.iter().all(|n| *n == Vector3::zeros()));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendShapeFrame {
    /// Frame weight (the host's 0-100 slider value at which this frame is fully applied).
    pub weight: f64,
    /// Vertex displacements, one per mesh vertex.
    pub delta_vertices: Vec<Vector3<f64>>,
    /// Normal deltas, one per mesh vertex.
    pub delta_normals: Vec<Vector3<f64>>,
    /// Tangent deltas, one per mesh vertex.
    pub delta_tangents: Vec<Vector3<f64>>,
}

impl BlendShapeFrame {
    /// Creates a frame with the given vertex deltas and zero normal and tangent deltas.
    #[must_use]
    pub fn new(weight: f64, delta_vertices: Vec<Vector3<f64>>) -> Self {
        let n = delta_vertices.len();
        Self {
            weight,
            delta_vertices,
            delta_normals: vec![Vector3::zeros(); n],
            delta_tangents: vec![Vector3::zeros(); n],
        }
    }

    /// Sets the normal deltas.
    #[must_use]
    pub fn with_normals(mut self, delta_normals: Vec<Vector3<f64>>) -> Self {
        self.delta_normals = delta_normals;
        self
    }

    /// Sets the tangent deltas.
    #[must_use]
    pub fn with_tangents(mut self, delta_tangents: Vec<Vector3<f64>>) -> Self {
        self.delta_tangents = delta_tangents;
        self
    }

    /// Number of vertex deltas.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.delta_vertices.len()
    }

    /// Borrowed view of this frame.
    #[must_use]
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            weight: self.weight,
            delta_vertices: &self.delta_vertices,
            delta_normals: &self.delta_normals,
            delta_tangents: &self.delta_tangents,
        }
    }
}

/// A named deformation channel made of frames with increasing weights.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendShape {
    name: String,
    frames: Vec<BlendShapeFrame>,
}

impl BlendShape {
    /// Creates an empty blendshape.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frames: Vec::new(),
        }
    }

    /// The blendshape name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frames in increasing weight order.
    #[must_use]
    pub fn frames(&self) -> &[BlendShapeFrame] {
        &self.frames
    }

    /// The highest-weight frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<&BlendShapeFrame> {
        self.frames.last()
    }

    fn push_frame(&mut self, frame: BlendShapeFrame) -> MeshResult<()> {
        if !frame.weight.is_finite() {
            return Err(MeshError::NonFiniteWeight {
                name: self.name.clone(),
            });
        }
        if let Some(last) = self.frames.last() {
            if frame.weight <= last.weight {
                return Err(MeshError::FrameWeightOrder {
                    name: self.name.clone(),
                    previous: last.weight,
                    weight: frame.weight,
                });
            }
        }
        self.frames.push(frame);
        Ok(())
    }
}

/// A mesh rest pose with its blendshapes.
///
/// Faces, UVs and other attributes are the host's concern; transfer only
/// needs vertex positions and deltas.
///
/// # Example
///
/// ```
/// use mesh_blendshape::{BlendShapeFrame, BlendShapeMesh, BlendShapeSource};
/// use nalgebra::{Point3, Vector3};
///
/// let mut mesh = BlendShapeMesh::new(vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
/// ]);
/// mesh.add_frame("blink", BlendShapeFrame::new(100.0, vec![Vector3::zeros(); 2]))
///     .unwrap();
///
/// assert_eq!(mesh.blend_shape_count(), 1);
/// assert_eq!(mesh.find_blend_shape("blink"), Some(0));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendShapeMesh {
    vertices: Vec<Point3<f64>>,
    blend_shapes: Vec<BlendShape>,
}

impl BlendShapeMesh {
    /// Creates a mesh with the given rest pose and no blendshapes.
    #[must_use]
    pub const fn new(vertices: Vec<Point3<f64>>) -> Self {
        Self {
            vertices,
            blend_shapes: Vec::new(),
        }
    }

    /// Creates a mesh from flat `[x, y, z]` coordinates.
    #[must_use]
    pub fn from_coords(coords: &[[f64; 3]]) -> Self {
        Self::new(coords.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect())
    }

    /// All blendshapes in order.
    #[must_use]
    pub fn blend_shapes(&self) -> &[BlendShape] {
        &self.blend_shapes
    }

    /// The blendshape called `name`.
    #[must_use]
    pub fn blend_shape(&self, name: &str) -> Option<&BlendShape> {
        self.blend_shapes.iter().find(|s| s.name == name)
    }

    /// Adds a frame to the blendshape called `name`, creating it if needed.
    ///
    /// # Errors
    ///
    /// - [`MeshError::EmptyName`] if `name` is empty
    /// - [`MeshError::VertexCountMismatch`] if any delta field does not
    ///   have one entry per vertex
    /// - [`MeshError::NonFiniteWeight`] / [`MeshError::FrameWeightOrder`]
    ///   if the weight is not finite or does not exceed the previous frame
    pub fn add_frame(&mut self, name: &str, frame: BlendShapeFrame) -> MeshResult<()> {
        if name.is_empty() {
            return Err(MeshError::EmptyName);
        }
        let expected = self.vertices.len();
        for (field, actual) in [
            ("delta_vertices", frame.delta_vertices.len()),
            ("delta_normals", frame.delta_normals.len()),
            ("delta_tangents", frame.delta_tangents.len()),
        ] {
            if actual != expected {
                return Err(MeshError::VertexCountMismatch {
                    field,
                    expected,
                    actual,
                });
            }
        }

        if let Some(shape) = self.blend_shapes.iter_mut().find(|s| s.name == name) {
            return shape.push_frame(frame);
        }
        let mut shape = BlendShape::new(name);
        shape.push_frame(frame)?;
        self.blend_shapes.push(shape);
        Ok(())
    }

    /// Removes all blendshapes, keeping the rest pose.
    pub fn clear_blend_shapes(&mut self) {
        self.blend_shapes.clear();
    }
}

impl BlendShapeSource for BlendShapeMesh {
    fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    fn blend_shape_count(&self) -> usize {
        self.blend_shapes.len()
    }

    fn blend_shape_name(&self, shape: usize) -> Option<&str> {
        self.blend_shapes.get(shape).map(BlendShape::name)
    }

    fn frame_count(&self, shape: usize) -> usize {
        self.blend_shapes.get(shape).map_or(0, |s| s.frames.len())
    }

    fn frame(&self, shape: usize, frame: usize) -> Option<FrameView<'_>> {
        self.blend_shapes
            .get(shape)?
            .frames
            .get(frame)
            .map(BlendShapeFrame::view)
    }
}

impl BlendShapeSink for BlendShapeMesh {
    type Error = MeshError;

    fn add_blend_shape_frame(
        &mut self,
        name: &str,
        weight: f64,
        delta_vertices: &[Vector3<f64>],
        delta_normals: &[Vector3<f64>],
        delta_tangents: &[Vector3<f64>],
    ) -> MeshResult<()> {
        self.add_frame(
            name,
            BlendShapeFrame {
                weight,
                delta_vertices: delta_vertices.to_vec(),
                delta_normals: delta_normals.to_vec(),
                delta_tangents: delta_tangents.to_vec(),
            },
        )
    }
}
