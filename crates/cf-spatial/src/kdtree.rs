//! Static 3-d tree for exact nearest-neighbor queries.
//!
//! The tree is built once by recursive median partitioning on
//! `depth % 3` and is never mutated afterwards. Nodes live in a flat
//! arena and address their children by slot, so the tree has no
//! ownership graph and can be shared across threads by reference.

use nalgebra::Point3;

use crate::metric::{Nearest, distance_squared, squared_cutoff, validate_points};
use crate::{NearestPointIndex, SpatialResult};

/// One tree node: a point and the two half-spaces split at its coordinate.
///
/// Every node reachable through `left` has a coordinate on `axis` that is
/// ≤ this node's; every node reachable through `right` has one that is ≥.
#[derive(Debug, Clone, Copy)]
struct KdNode {
    /// Index of the point in the source point set.
    index: u32,
    point: Point3<f64>,
    axis: u8,
    left: Option<u32>,
    right: Option<u32>,
}

/// Balanced k-d tree (k = 3) over a static point set.
///
/// Queries are exact: the result always equals the one produced by
/// [`BruteForceIndex`](crate::BruteForceIndex), including tie resolution
/// to the lowest point index. Average query cost is O(log N); degenerate
/// inputs (for example many collinear or duplicate points) can degrade a
/// query to O(N).
///
/// # Example
///
/// ```
/// use cf_spatial::{KdTree, NearestPointIndex};
/// use nalgebra::Point3;
///
/// let tree = KdTree::new(vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(2.0, 0.0, 0.0),
/// ])
/// .unwrap();
///
/// assert_eq!(tree.find_nearest(&Point3::new(1.05, 0.0, 0.0), 0.2), Some(1));
/// assert_eq!(tree.find_nearest(&Point3::new(1.5, 1.0, 0.0), 0.2), None);
/// ```
#[derive(Debug, Clone)]
pub struct KdTree {
    points: Vec<Point3<f64>>,
    nodes: Vec<KdNode>,
    root: Option<u32>,
}

impl KdTree {
    /// Builds a k-d tree over the given points.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::EmptyPointSet`](crate::SpatialError::EmptyPointSet)
    /// if `points` is empty, or
    /// [`SpatialError::NonFinitePoint`](crate::SpatialError::NonFinitePoint)
    /// if any coordinate is NaN or infinite.
    pub fn new(points: Vec<Point3<f64>>) -> SpatialResult<Self> {
        validate_points(&points)?;

        // validate_points guarantees the count fits in u32.
        #[allow(clippy::cast_possible_truncation)]
        let mut order: Vec<u32> = (0..points.len() as u32).collect();
        let mut nodes = Vec::with_capacity(points.len());
        let root = build(&points, &mut nodes, &mut order, 0);

        Ok(Self {
            points,
            nodes,
            root,
        })
    }

    /// Height of the tree (number of nodes on the longest root-to-leaf path).
    #[must_use]
    pub fn depth(&self) -> usize {
        fn height(nodes: &[KdNode], slot: Option<u32>) -> usize {
            slot.map_or(0, |s| {
                let node = &nodes[s as usize];
                1 + height(nodes, node.left).max(height(nodes, node.right))
            })
        }
        height(&self.nodes, self.root)
    }

    fn search(&self, slot: u32, query: &Point3<f64>, best: &mut Nearest) {
        let node = &self.nodes[slot as usize];
        best.offer(node.index as usize, distance_squared(&node.point, query));

        let axis = usize::from(node.axis);
        let diff = query[axis] - node.point[axis];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            self.search(near, query, best);
        }
        // `<=` so that an equidistant point with a lower index on the far
        // side is still found.
        if let Some(far) = far {
            if diff * diff <= best.distance_sq {
                self.search(far, query, best);
            }
        }
    }
}

/// Recursively partitions `order` around its median on `depth % 3` and
/// appends the resulting nodes to `nodes`. Returns the slot of the subtree root.
fn build(
    points: &[Point3<f64>],
    nodes: &mut Vec<KdNode>,
    order: &mut [u32],
    depth: usize,
) -> Option<u32> {
    if order.is_empty() {
        return None;
    }

    let axis = depth % 3;
    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |&a, &b| {
        points[a as usize][axis].total_cmp(&points[b as usize][axis])
    });

    let (left, rest) = order.split_at_mut(mid);
    let (&mut median, right) = rest.split_first_mut()?;

    // Node count never exceeds the point count, which fits in u32.
    #[allow(clippy::cast_possible_truncation)]
    let slot = nodes.len() as u32;
    #[allow(clippy::cast_possible_truncation)]
    nodes.push(KdNode {
        index: median,
        point: points[median as usize],
        axis: axis as u8,
        left: None,
        right: None,
    });

    let left = build(points, nodes, left, depth + 1);
    let right = build(points, nodes, right, depth + 1);
    let node = &mut nodes[slot as usize];
    node.left = left;
    node.right = right;

    Some(slot)
}

impl NearestPointIndex for KdTree {
    fn find_nearest(&self, query: &Point3<f64>, max_distance: f64) -> Option<usize> {
        let mut best = Nearest::NONE;
        if let Some(root) = self.root {
            self.search(root, query, &mut best);
        }
        best.within(squared_cutoff(max_distance))
    }

    fn points(&self) -> &[Point3<f64>] {
        &self.points
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_precision_loss)]
mod tests {
    use super::*;
    use crate::{BruteForceIndex, SpatialError};
    use rand::{Rng, SeedableRng};

    fn random_points(count: usize, seed: u64) -> Vec<Point3<f64>> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                Point3::new(
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-5.0..5.0),
                )
            })
            .collect()
    }

    /// Walks the arena and checks the partition invariant for every node.
    fn assert_partitioned(tree: &KdTree) {
        fn collect(tree: &KdTree, slot: Option<u32>, out: &mut Vec<Point3<f64>>) {
            if let Some(s) = slot {
                let node = &tree.nodes[s as usize];
                out.push(node.point);
                collect(tree, node.left, out);
                collect(tree, node.right, out);
            }
        }

        for node in &tree.nodes {
            let axis = usize::from(node.axis);
            let mut left = Vec::new();
            let mut right = Vec::new();
            collect(tree, node.left, &mut left);
            collect(tree, node.right, &mut right);
            assert!(left.iter().all(|p| p[axis] <= node.point[axis]));
            assert!(right.iter().all(|p| p[axis] >= node.point[axis]));
        }
    }

    #[test]
    fn every_point_becomes_one_node() {
        let tree = KdTree::new(random_points(257, 7)).unwrap();
        assert_eq!(tree.nodes.len(), 257);

        let mut seen: Vec<u32> = tree.nodes.iter().map(|n| n.index).collect();
        seen.sort_unstable();
        assert!(seen.iter().enumerate().all(|(i, &idx)| idx as usize == i));
    }

    #[test]
    fn partition_invariant_holds() {
        assert_partitioned(&KdTree::new(random_points(300, 11)).unwrap());

        // Many shared coordinates.
        let grid: Vec<_> = (0..64)
            .map(|i| Point3::new(f64::from(i % 4), f64::from((i / 4) % 4), f64::from(i / 16)))
            .collect();
        assert_partitioned(&KdTree::new(grid).unwrap());
    }

    #[test]
    fn median_split_keeps_tree_balanced() {
        let tree = KdTree::new(random_points(1023, 3)).unwrap();
        assert_eq!(tree.depth(), 10);

        let single = KdTree::new(vec![Point3::origin()]).unwrap();
        assert_eq!(single.depth(), 1);
    }

    #[test]
    fn end_to_end_line_query() {
        let tree = KdTree::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(tree.find_nearest(&Point3::new(1.05, 0.0, 0.0), 0.2), Some(1));
    }

    #[test]
    fn matches_brute_force_on_random_queries() {
        let points = random_points(500, 42);
        let tree = KdTree::new(points.clone()).unwrap();
        let brute = BruteForceIndex::new(points).unwrap();

        for query in random_points(300, 99) {
            for radius in [0.05, 0.3, 1.0, 20.0] {
                assert_eq!(
                    tree.find_nearest(&query, radius),
                    brute.find_nearest(&query, radius),
                    "query {query:?} radius {radius}"
                );
            }
        }
    }

    #[test]
    fn ties_match_brute_force() {
        // Integer lattice with duplicates: many equidistant candidates.
        let mut points: Vec<_> = (0..27)
            .map(|i| Point3::new(f64::from(i % 3), f64::from((i / 3) % 3), f64::from(i / 9)))
            .collect();
        points.extend(points.clone());
        let tree = KdTree::new(points.clone()).unwrap();
        let brute = BruteForceIndex::new(points).unwrap();

        for i in 0..64 {
            let q = Point3::new(
                f64::from(i % 4) * 0.5,
                f64::from((i / 4) % 4) * 0.5,
                f64::from(i / 16) * 0.5,
            );
            assert_eq!(tree.find_nearest(&q, 2.0), brute.find_nearest(&q, 2.0));
        }
    }

    #[test]
    fn cutoff_is_inclusive() {
        let tree = KdTree::new(vec![Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0)]).unwrap();
        // 0.5 is exact in binary so the squared distance equals the squared cutoff.
        assert_eq!(tree.find_nearest(&Point3::new(0.5, 0.0, 0.0), 0.5), Some(0));
        assert_eq!(tree.find_nearest(&Point3::new(0.5, 0.0, 0.0), 0.499_999), None);
    }

    #[test]
    fn collinear_input_still_exact() {
        let points: Vec<_> = (0..200).map(|i| Point3::new(f64::from(i) * 0.1, 0.0, 0.0)).collect();
        let tree = KdTree::new(points.clone()).unwrap();
        let brute = BruteForceIndex::new(points).unwrap();
        for i in 0..50 {
            let q = Point3::new(f64::from(i) * 0.37, 0.01, 0.0);
            assert_eq!(tree.find_nearest(&q, 0.5), brute.find_nearest(&q, 0.5));
        }
    }

    #[test]
    fn nan_query_finds_nothing() {
        let tree = KdTree::new(random_points(10, 1)).unwrap();
        assert_eq!(tree.find_nearest(&Point3::new(f64::NAN, 0.0, 0.0), 100.0), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(KdTree::new(Vec::new()).unwrap_err(), SpatialError::EmptyPointSet);
        assert_eq!(
            KdTree::new(vec![Point3::origin(), Point3::new(0.0, f64::INFINITY, 0.0)]).unwrap_err(),
            SpatialError::NonFinitePoint { index: 1 }
        );
    }
}
