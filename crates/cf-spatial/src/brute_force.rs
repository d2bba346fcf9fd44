//! Exhaustive linear-scan point index.

use nalgebra::Point3;

use crate::metric::{Nearest, distance_squared, squared_cutoff, validate_points};
use crate::{NearestPointIndex, SpatialResult};

/// Point index that answers every query by scanning all points.
///
/// O(N) per query. Useful as a reference for [`KdTree`](crate::KdTree)
/// and for small point sets where building a tree is not worth it.
///
/// # Example
///
/// ```
/// use cf_spatial::{BruteForceIndex, NearestPointIndex};
/// use nalgebra::Point3;
///
/// let index = BruteForceIndex::new(vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
/// ])
/// .unwrap();
///
/// assert_eq!(index.find_nearest(&Point3::new(0.9, 0.0, 0.0), 0.5), Some(1));
/// assert_eq!(index.find_nearest(&Point3::new(5.0, 0.0, 0.0), 0.5), None);
/// ```
#[derive(Debug, Clone)]
pub struct BruteForceIndex {
    points: Vec<Point3<f64>>,
}

impl BruteForceIndex {
    /// Creates a brute-force index over the given points.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::EmptyPointSet`](crate::SpatialError::EmptyPointSet)
    /// if `points` is empty, or
    /// [`SpatialError::NonFinitePoint`](crate::SpatialError::NonFinitePoint)
    /// if any coordinate is NaN or infinite.
    pub fn new(points: Vec<Point3<f64>>) -> SpatialResult<Self> {
        validate_points(&points)?;
        Ok(Self { points })
    }
}

impl NearestPointIndex for BruteForceIndex {
    fn find_nearest(&self, query: &Point3<f64>, max_distance: f64) -> Option<usize> {
        let mut best = Nearest::NONE;
        for (i, p) in self.points.iter().enumerate() {
            best.offer(i, distance_squared(p, query));
        }
        best.within(squared_cutoff(max_distance))
    }

    fn points(&self) -> &[Point3<f64>] {
        &self.points
    }
}
