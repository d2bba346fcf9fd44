//! Point index abstraction and strategy selection.

use nalgebra::Point3;

use crate::{BruteForceIndex, KdTree, SpatialResult};

/// A static 3D point set that answers nearest-neighbor queries.
///
/// Implementations must be exact: for a given point set, query and
/// cutoff, every implementation returns the same index, with ties on
/// distance resolved to the lowest point index.
pub trait NearestPointIndex {
    /// Finds the point nearest to `query` whose distance is at most
    /// `max_distance` (inclusive).
    ///
    /// A zero or negative `max_distance` only matches points that coincide
    /// exactly with `query`. Returns `None` when no point is close enough.
    fn find_nearest(&self, query: &Point3<f64>, max_distance: f64) -> Option<usize>;

    /// The indexed points, in their original order.
    fn points(&self) -> &[Point3<f64>];

    /// Returns the point at `index`, or `None` if out of range.
    fn point(&self, index: usize) -> Option<Point3<f64>> {
        self.points().get(index).copied()
    }

    /// Number of indexed points.
    fn len(&self) -> usize {
        self.points().len()
    }

    /// Whether the index holds no points. Always `false` for the
    /// indexes in this crate, which refuse empty point sets.
    fn is_empty(&self) -> bool {
        self.points().is_empty()
    }
}

/// Which index implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexStrategy {
    /// Exhaustive linear scan.
    BruteForce,
    /// Balanced k-d tree.
    #[default]
    KdTree,
}

impl IndexStrategy {
    /// Builds an index of this kind over `points`.
    ///
    /// # Errors
    ///
    /// Returns an error if `points` is empty or contains non-finite coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_spatial::{IndexStrategy, NearestPointIndex};
    /// use nalgebra::Point3;
    ///
    /// let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)];
    /// let index = IndexStrategy::KdTree.build(points).unwrap();
    ///
    /// assert_eq!(index.strategy(), IndexStrategy::KdTree);
    /// assert_eq!(index.find_nearest(&Point3::new(0.9, 1.0, 1.0), 0.2), Some(1));
    /// ```
    pub fn build(self, points: Vec<Point3<f64>>) -> SpatialResult<PointIndex> {
        Ok(match self {
            Self::BruteForce => PointIndex::BruteForce(BruteForceIndex::new(points)?),
            Self::KdTree => PointIndex::KdTree(KdTree::new(points)?),
        })
    }
}

/// A built point index of either strategy.
#[derive(Debug, Clone)]
pub enum PointIndex {
    /// Linear-scan index.
    BruteForce(BruteForceIndex),
    /// k-d tree index.
    KdTree(KdTree),
}

impl PointIndex {
    /// The strategy this index was built with.
    #[must_use]
    pub const fn strategy(&self) -> IndexStrategy {
        match self {
            Self::BruteForce(_) => IndexStrategy::BruteForce,
            Self::KdTree(_) => IndexStrategy::KdTree,
        }
    }
}

impl NearestPointIndex for PointIndex {
    fn find_nearest(&self, query: &Point3<f64>, max_distance: f64) -> Option<usize> {
        match self {
            Self::BruteForce(index) => index.find_nearest(query, max_distance),
            Self::KdTree(index) => index.find_nearest(query, max_distance),
        }
    }

    fn points(&self) -> &[Point3<f64>] {
        match self {
            Self::BruteForce(index) => index.points(),
            Self::KdTree(index) => index.points(),
        }
    }
}
