//! Mesh placement in a scene: conversions between a mesh's local space
//! and world space.
//!
//! The host scene graph owns these conversions. [`LocalFrame`] is the
//! narrow interface the transfer core calls; [`Placement`] and
//! [`AffineFrame`] cover the usual host representations.

use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};

use crate::{TransformError, TransformResult, euler_degrees_to_rotation};

/// Converts points between a mesh's local space and world space.
///
/// Implementations must be pure: the same input always yields the same
/// output, and `world_to_local` inverts `local_to_world`.
pub trait LocalFrame {
    /// Maps a local-space point to world space.
    fn local_to_world(&self, local: &Point3<f64>) -> Point3<f64>;

    /// Maps a world-space point to local space.
    fn world_to_local(&self, world: &Point3<f64>) -> Point3<f64>;
}

/// A mesh placed at the world origin with no rotation or scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityFrame;

impl LocalFrame for IdentityFrame {
    fn local_to_world(&self, local: &Point3<f64>) -> Point3<f64> {
        *local
    }

    fn world_to_local(&self, world: &Point3<f64>) -> Point3<f64> {
        *world
    }
}

/// Translation, rotation and per-axis scale of a scene node.
///
/// `local_to_world(p) = position + rotation * (scale ⊙ p)`.
///
/// # Example
///
/// ```
/// use mesh_transform::{LocalFrame, Placement};
/// use nalgebra::{Point3, UnitQuaternion, Vector3};
///
/// let placement = Placement::new(
///     Vector3::new(0.0, 1.5, 0.0),
///     UnitQuaternion::identity(),
///     Vector3::new(0.01, 0.01, 0.01),
/// );
///
/// let world = placement.local_to_world(&Point3::new(100.0, 0.0, 0.0));
/// assert!((world.x - 1.0).abs() < 1e-12);
/// assert!((world.y - 1.5).abs() < 1e-12);
///
/// let back = placement.world_to_local(&world);
/// assert!((back.x - 100.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    /// World position of the local origin.
    pub position: Vector3<f64>,
    /// World rotation.
    pub rotation: UnitQuaternion<f64>,
    /// Per-axis scale, applied before rotation.
    pub scale: Vector3<f64>,
}

impl Default for Placement {
    fn default() -> Self {
        Self::identity()
    }
}

impl Placement {
    /// Creates a placement from its components.
    #[must_use]
    pub const fn new(
        position: Vector3<f64>,
        rotation: UnitQuaternion<f64>,
        scale: Vector3<f64>,
    ) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Creates a placement whose rotation is given as Euler degrees in the
    /// host convention (see [`euler_degrees_to_rotation`]).
    #[must_use]
    pub fn from_euler_degrees(
        position: Vector3<f64>,
        rotation_degrees: &Vector3<f64>,
        scale: Vector3<f64>,
    ) -> Self {
        Self::new(position, euler_degrees_to_rotation(rotation_degrees), scale)
    }

    /// The placement at the origin with unit scale.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(
            Vector3::zeros(),
            UnitQuaternion::identity(),
            Vector3::new(1.0, 1.0, 1.0),
        )
    }

    /// Creates a placement with only a translation.
    #[must_use]
    pub fn from_position(position: Vector3<f64>) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Checks that the placement can be inverted.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::NonFinite`] for NaN or infinite components
    /// and [`TransformError::DegenerateScale`] for a zero scale component.
    pub fn validate(&self) -> TransformResult<()> {
        if !self.position.iter().all(|c| c.is_finite()) {
            return Err(TransformError::NonFinite { field: "position" });
        }
        if !self.rotation.coords.iter().all(|c| c.is_finite()) {
            return Err(TransformError::NonFinite { field: "rotation" });
        }
        if !self.scale.iter().all(|c| c.is_finite()) {
            return Err(TransformError::NonFinite { field: "scale" });
        }
        for (axis, s) in ['x', 'y', 'z'].into_iter().zip(self.scale.iter()) {
            if *s == 0.0 {
                return Err(TransformError::DegenerateScale { axis });
            }
        }
        Ok(())
    }

    /// Converts to a 4x4 homogeneous matrix (`T * R * S`).
    #[must_use]
    pub fn to_matrix4(&self) -> Matrix4<f64> {
        Matrix4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

impl LocalFrame for Placement {
    fn local_to_world(&self, local: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * local.coords.component_mul(&self.scale) + self.position)
    }

    fn world_to_local(&self, world: &Point3<f64>) -> Point3<f64> {
        let unrotated = self.rotation.inverse() * (world.coords - self.position);
        Point3::from(unrotated.component_div(&self.scale))
    }
}

/// A placement given as a general affine matrix, with its inverse cached.
///
/// Use this when the host exposes a full local-to-world matrix (for
/// example one that already folds in parent nodes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineFrame {
    local_to_world: Matrix4<f64>,
    world_to_local: Matrix4<f64>,
}

impl AffineFrame {
    /// Creates a frame from a local-to-world matrix.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::NotInvertible`] if the matrix is singular,
    /// or [`TransformError::NonFinite`] if it holds NaN or infinite entries.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_transform::{AffineFrame, LocalFrame};
    /// use nalgebra::{Matrix4, Point3, Vector3};
    ///
    /// let frame = AffineFrame::new(Matrix4::new_translation(&Vector3::new(2.0, 0.0, 0.0))).unwrap();
    /// let local = frame.world_to_local(&Point3::new(3.0, 0.0, 0.0));
    /// assert!((local.x - 1.0).abs() < 1e-12);
    /// ```
    pub fn new(local_to_world: Matrix4<f64>) -> TransformResult<Self> {
        if !local_to_world.iter().all(|c| c.is_finite()) {
            return Err(TransformError::NonFinite { field: "matrix" });
        }
        let world_to_local = local_to_world
            .try_inverse()
            .ok_or(TransformError::NotInvertible)?;
        Ok(Self {
            local_to_world,
            world_to_local,
        })
    }

    /// The local-to-world matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix4<f64> {
        &self.local_to_world
    }
}

impl LocalFrame for AffineFrame {
    fn local_to_world(&self, local: &Point3<f64>) -> Point3<f64> {
        self.local_to_world.transform_point(local)
    }

    fn world_to_local(&self, world: &Point3<f64>) -> Point3<f64> {
        self.world_to_local.transform_point(world)
    }
}

impl TryFrom<Placement> for AffineFrame {
    type Error = TransformError;

    fn try_from(placement: Placement) -> TransformResult<Self> {
        placement.validate()?;
        Self::new(placement.to_matrix4())
    }
}
