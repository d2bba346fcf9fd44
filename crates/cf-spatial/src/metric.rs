//! Distance metric shared by every index strategy.
//!
//! Both strategies must agree bit-for-bit on distances, otherwise ties
//! and cutoff boundaries could resolve differently. Keep all distance
//! arithmetic in this module.

use nalgebra::Point3;

use crate::{SpatialError, SpatialResult};

/// Squared Euclidean distance between two points.
#[inline]
#[must_use]
pub fn distance_squared(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - b).norm_squared()
}

/// Converts a search radius into the squared cutoff used for comparisons.
///
/// Zero and negative radii collapse to `0.0`, so only exact coincidences
/// can match. NaN stays NaN and never matches.
///
/// # Example
///
/// ```
/// use cf_spatial::squared_cutoff;
///
/// assert_eq!(squared_cutoff(0.5), 0.25);
/// assert_eq!(squared_cutoff(-1.0), 0.0);
/// ```
#[inline]
#[must_use]
pub fn squared_cutoff(max_distance: f64) -> f64 {
    if max_distance > 0.0 {
        max_distance * max_distance
    } else if max_distance.is_nan() {
        f64::NAN
    } else {
        0.0
    }
}

/// Checks that a point set can be indexed.
pub(crate) fn validate_points(points: &[Point3<f64>]) -> SpatialResult<()> {
    if points.is_empty() {
        return Err(SpatialError::EmptyPointSet);
    }
    if u32::try_from(points.len()).is_err() {
        return Err(SpatialError::TooManyPoints {
            count: points.len(),
        });
    }
    if let Some(index) = points
        .iter()
        .position(|p| !p.coords.iter().all(|c| c.is_finite()))
    {
        return Err(SpatialError::NonFinitePoint { index });
    }
    Ok(())
}

/// Running best candidate during a nearest-neighbor search.
///
/// Ties on distance resolve to the lowest point index.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Nearest {
    pub index: usize,
    pub distance_sq: f64,
}

impl Nearest {
    pub(crate) const NONE: Self = Self {
        index: usize::MAX,
        distance_sq: f64::INFINITY,
    };

    #[inline]
    #[allow(clippy::float_cmp)]
    pub(crate) fn offer(&mut self, index: usize, distance_sq: f64) {
        if distance_sq < self.distance_sq
            || (distance_sq == self.distance_sq && index < self.index)
        {
            self.index = index;
            self.distance_sq = distance_sq;
        }
    }

    /// Returns the candidate if it lies within the squared cutoff.
    #[inline]
    pub(crate) fn within(self, cutoff_sq: f64) -> Option<usize> {
        (self.index != usize::MAX && self.distance_sq <= cutoff_sq).then_some(self.index)
    }
}
