//! Search-space correction applied to query positions.

use nalgebra::{Point3, UnitQuaternion, Vector3};

use crate::{TransformError, TransformResult};

/// Builds a rotation from Euler angles in degrees, host convention.
///
/// Y is up. The rotation is applied about Z first, then X, then Y, all
/// about fixed world axes, and returned as a single composed quaternion.
///
/// # Example
///
/// ```
/// use mesh_transform::euler_degrees_to_rotation;
/// use nalgebra::{Point3, Vector3};
///
/// let q = euler_degrees_to_rotation(&Vector3::new(0.0, 90.0, 0.0));
/// let p = q * Point3::new(1.0, 0.0, 0.0);
/// assert!((p.z + 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn euler_degrees_to_rotation(degrees: &Vector3<f64>) -> UnitQuaternion<f64> {
    let x = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), degrees.x.to_radians());
    let y = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), degrees.y.to_radians());
    let z = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), degrees.z.to_radians());
    y * x * z
}

/// User-tunable correction mapping a world position to the position used
/// as a nearest-neighbor query.
///
/// Compensates for systematic offsets between the rest poses of two
/// meshes. The order of operations is fixed:
///
/// 1. add `offset` (a world-space nudge, independent of the other two),
/// 2. rotate about the world origin by `rotation_degrees`
///    (see [`euler_degrees_to_rotation`]),
/// 3. scale component-wise about the world origin by `scale`.
///
/// The default is the identity.
///
/// # Example
///
/// ```
/// use mesh_transform::SearchTransform;
/// use nalgebra::{Point3, Vector3};
///
/// let search = SearchTransform::identity()
///     .with_offset(Vector3::new(0.0, 0.01, 0.0))
///     .with_scale(Vector3::new(1.02, 1.0, 1.0));
///
/// let p = search.apply(&Point3::new(1.0, 0.0, 0.0));
/// assert!((p.x - 1.02).abs() < 1e-12);
/// assert!((p.y - 0.01).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SearchTransform {
    /// Translation added first, in world units.
    pub offset: Vector3<f64>,
    /// Euler rotation in degrees, applied about the world origin.
    pub rotation_degrees: Vector3<f64>,
    /// Per-axis scale about the world origin.
    pub scale: Vector3<f64>,
}

impl Default for SearchTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl SearchTransform {
    /// Creates a search transform from its three components.
    #[must_use]
    pub const fn new(
        offset: Vector3<f64>,
        rotation_degrees: Vector3<f64>,
        scale: Vector3<f64>,
    ) -> Self {
        Self {
            offset,
            rotation_degrees,
            scale,
        }
    }

    /// The identity: zero offset, zero rotation, unit scale.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            offset: Vector3::zeros(),
            rotation_degrees: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Sets the offset.
    #[must_use]
    pub const fn with_offset(mut self, offset: Vector3<f64>) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the rotation in degrees.
    #[must_use]
    pub const fn with_rotation_degrees(mut self, rotation_degrees: Vector3<f64>) -> Self {
        self.rotation_degrees = rotation_degrees;
        self
    }

    /// Sets the per-axis scale.
    #[must_use]
    pub const fn with_scale(mut self, scale: Vector3<f64>) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the same scale on all three axes.
    #[must_use]
    pub fn with_uniform_scale(self, factor: f64) -> Self {
        self.with_scale(Vector3::new(factor, factor, factor))
    }

    /// Resets all three components to the identity.
    pub fn reset(&mut self) {
        *self = Self::identity();
    }

    /// The composed rotation.
    #[must_use]
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        euler_degrees_to_rotation(&self.rotation_degrees)
    }

    /// Maps a world position to its search position.
    #[must_use]
    pub fn apply(&self, world: &Point3<f64>) -> Point3<f64> {
        self.apply_with(&self.rotation(), world)
    }

    /// Same as [`apply`](Self::apply) with a precomputed [`rotation`](Self::rotation),
    /// for hot loops.
    #[must_use]
    pub fn apply_with(&self, rotation: &UnitQuaternion<f64>, world: &Point3<f64>) -> Point3<f64> {
        let shifted = world.coords + self.offset;
        let rotated = rotation * shifted;
        Point3::from(rotated.component_mul(&self.scale))
    }

    /// Returns true if this transform is exactly the identity.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Checks that the transform is usable.
    ///
    /// Values are never clamped; a bad configuration is reported instead.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::NonFinite`] if any component is NaN or
    /// infinite, or [`TransformError::DegenerateScale`] if a scale component
    /// is zero.
    pub fn validate(&self) -> TransformResult<()> {
        for (field, v) in [
            ("offset", &self.offset),
            ("rotation", &self.rotation_degrees),
            ("scale", &self.scale),
        ] {
            if !v.iter().all(|c| c.is_finite()) {
                return Err(TransformError::NonFinite { field });
            }
        }
        for (axis, s) in ['x', 'y', 'z'].into_iter().zip(self.scale.iter()) {
            if *s == 0.0 {
                return Err(TransformError::DegenerateScale { axis });
            }
        }
        Ok(())
    }
}
