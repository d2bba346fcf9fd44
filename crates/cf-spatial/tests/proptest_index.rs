//! Property-based tests for the point indexes.
//!
//! The k-d tree must agree exactly with the linear scan for every point
//! set, query and cutoff. Distances are additionally checked against
//! kiddo as an independent implementation.
//!
//! Run with: cargo test -p cf-spatial -- proptest

#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use cf_spatial::{BruteForceIndex, KdTree, NearestPointIndex, distance_squared};
use kiddo::{KdTree as KiddoTree, SquaredEuclidean};
use nalgebra::Point3;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Continuous coordinates in a bounded box.
fn arb_point() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-10.0..10.0f64).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

/// Coordinates snapped to a coarse lattice so that duplicates and exact
/// distance ties are common.
fn arb_lattice_point() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-3i32..=3).prop_map(|[x, y, z]| {
        Point3::new(f64::from(x) * 0.5, f64::from(y) * 0.5, f64::from(z) * 0.5)
    })
}

fn arb_radius() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(-1.0), 0.0..5.0f64, Just(f64::INFINITY)]
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_kdtree_matches_brute_force(
        points in prop::collection::vec(arb_point(), 1..200),
        queries in prop::collection::vec(arb_point(), 1..20),
        radius in arb_radius(),
    ) {
        let tree = KdTree::new(points.clone()).unwrap();
        let brute = BruteForceIndex::new(points).unwrap();

        for q in &queries {
            prop_assert_eq!(tree.find_nearest(q, radius), brute.find_nearest(q, radius));
        }
    }

    #[test]
    fn proptest_kdtree_matches_brute_force_with_ties(
        points in prop::collection::vec(arb_lattice_point(), 1..150),
        queries in prop::collection::vec(arb_lattice_point(), 1..20),
        radius in arb_radius(),
    ) {
        let tree = KdTree::new(points.clone()).unwrap();
        let brute = BruteForceIndex::new(points).unwrap();

        for q in &queries {
            prop_assert_eq!(tree.find_nearest(q, radius), brute.find_nearest(q, radius));
        }
    }

    #[test]
    fn proptest_match_respects_cutoff(
        points in prop::collection::vec(arb_point(), 1..100),
        query in arb_point(),
        radius in 0.0..5.0f64,
    ) {
        let tree = KdTree::new(points.clone()).unwrap();
        if let Some(i) = tree.find_nearest(&query, radius) {
            prop_assert!(distance_squared(&points[i], &query) <= radius * radius);
        } else {
            prop_assert!(points.iter().all(|p| distance_squared(p, &query) > radius * radius));
        }
    }

    #[test]
    fn proptest_indexed_point_is_its_own_nearest(
        points in prop::collection::vec(arb_point(), 1..100),
        pick in any::<prop::sample::Index>(),
    ) {
        let tree = KdTree::new(points.clone()).unwrap();
        let i = pick.index(points.len());
        let found = tree.find_nearest(&points[i], 0.0).unwrap();
        // Duplicates resolve to the first copy.
        prop_assert_eq!(points[found], points[i]);
        prop_assert!(found <= i);
    }
}

// =============================================================================
// Cross-check against kiddo
// =============================================================================

proptest! {
    #[test]
    fn proptest_nearest_distance_matches_kiddo(
        points in prop::collection::vec(arb_point(), 1..200),
        queries in prop::collection::vec(arb_point(), 1..20),
    ) {
        let tree = KdTree::new(points.clone()).unwrap();
        let mut reference: KiddoTree<f64, 3> = KiddoTree::new();
        for (i, p) in points.iter().enumerate() {
            reference.add(&[p.x, p.y, p.z], i as u64);
        }

        for q in &queries {
            let ours = tree.find_nearest(q, f64::INFINITY).unwrap();
            let theirs = reference.nearest_one::<SquaredEuclidean>(&[q.x, q.y, q.z]);
            assert_relative_eq!(
                distance_squared(&points[ours], q),
                theirs.distance,
                epsilon = 1e-9
            );
        }
    }
}
