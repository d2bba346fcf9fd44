//! Mapping of target-mesh vertices into the source mesh's local space.

use nalgebra::{Point3, UnitQuaternion};

use crate::{LocalFrame, SearchTransform};

/// Maps a target-local vertex position into source-local space, passing
/// through world space and the [`SearchTransform`] on the way.
///
/// `target_to_source(p) = source.world_to_local(search.apply(target.local_to_world(p)))`
///
/// A point index built over source-local vertices can then be queried
/// with the result directly.
///
/// # Example
///
/// ```
/// use mesh_transform::{CoordinateBridge, LocalFrame, Placement, SearchTransform};
/// use nalgebra::{Point3, Vector3};
///
/// let target = Placement::from_position(Vector3::new(0.0, 1.0, 0.0));
/// let source = Placement::from_position(Vector3::new(0.0, 2.0, 0.0));
/// let search = SearchTransform::identity().with_offset(Vector3::new(0.1, 0.0, 0.0));
///
/// let bridge = CoordinateBridge::new(&target, &source, search);
/// let p = bridge.target_to_source(&Point3::new(1.0, 0.0, 0.0));
///
/// assert!((p.x - 1.1).abs() < 1e-12);
/// assert!((p.y + 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CoordinateBridge<'a, T: ?Sized, S: ?Sized> {
    target: &'a T,
    source: &'a S,
    search: SearchTransform,
    rotation: UnitQuaternion<f64>,
}

impl<'a, T, S> CoordinateBridge<'a, T, S>
where
    T: LocalFrame + ?Sized,
    S: LocalFrame + ?Sized,
{
    /// Creates a bridge from the target frame into the source frame.
    #[must_use]
    pub fn new(target: &'a T, source: &'a S, search: SearchTransform) -> Self {
        Self {
            target,
            source,
            rotation: search.rotation(),
            search,
        }
    }

    /// The search transform applied in world space.
    #[must_use]
    pub const fn search(&self) -> &SearchTransform {
        &self.search
    }

    /// World position of a target-local vertex after the search transform.
    #[must_use]
    pub fn search_position(&self, target_local: &Point3<f64>) -> Point3<f64> {
        let world = self.target.local_to_world(target_local);
        self.search.apply_with(&self.rotation, &world)
    }

    /// Maps a target-local vertex position into source-local space.
    #[must_use]
    pub fn target_to_source(&self, target_local: &Point3<f64>) -> Point3<f64> {
        self.source.world_to_local(&self.search_position(target_local))
    }
}
