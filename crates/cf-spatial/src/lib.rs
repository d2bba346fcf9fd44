//! Nearest-neighbor point indexes for CortenForge.
//!
//! This crate provides static 3D point indexes answering exact
//! nearest-neighbor queries with a distance cutoff:
//!
//! - [`KdTree`] - Balanced k-d tree, O(log N) average query
//! - [`BruteForceIndex`] - Linear scan, O(N) query, reference behavior
//! - [`PointIndex`] / [`IndexStrategy`] - Runtime choice between the two
//! - [`NearestPointIndex`] - The query interface both implement
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - CLI tools
//! - Web applications (WASM)
//! - Servers
//! - Other game engines
//! - Python bindings
//!
//! # Query Semantics
//!
//! Distances are compared squared. The cutoff is inclusive: a point at
//! exactly `max_distance` from the query is a match. A zero or negative
//! cutoff only matches exact coincidences. When several points are equally
//! near, the one with the lowest index wins, so the two strategies always
//! agree.
//!
//! Indexes are immutable once built and are `Send + Sync`, so a single
//! index can serve parallel queries by shared reference.
//!
//! # Example
//!
//! ```
//! use cf_spatial::{IndexStrategy, NearestPointIndex};
//! use nalgebra::Point3;
//!
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(2.0, 0.0, 0.0),
//! ];
//!
//! let tree = IndexStrategy::KdTree.build(points.clone()).unwrap();
//! let brute = IndexStrategy::BruteForce.build(points).unwrap();
//!
//! let query = Point3::new(1.05, 0.0, 0.0);
//! assert_eq!(tree.find_nearest(&query, 0.2), Some(1));
//! assert_eq!(brute.find_nearest(&query, 0.2), Some(1));
//!
//! // Nothing within 1cm.
//! assert_eq!(tree.find_nearest(&query, 0.01), None);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod brute_force;
mod error;
mod index;
mod kdtree;
mod metric;

pub use brute_force::BruteForceIndex;
pub use error::{SpatialError, SpatialResult};
pub use index::{IndexStrategy, NearestPointIndex, PointIndex};
pub use kdtree::KdTree;
pub use metric::{distance_squared, squared_cutoff};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
