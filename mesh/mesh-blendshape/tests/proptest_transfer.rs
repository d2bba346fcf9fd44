//! Property-based tests for blendshape transfer.
//!
//! Run with: cargo test -p mesh-blendshape -- proptest

#![allow(clippy::unwrap_used)]

use cf_spatial::IndexStrategy;
use mesh_blendshape::{
    BlendShapeFrame, BlendShapeMesh, BlendShapeSource, DELTA_EPSILON, TransferParams,
    transfer_blendshapes,
};
use mesh_transform::IdentityFrame;
use nalgebra::{Point3, Vector3};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Lattice coordinates so that duplicate vertices and distance ties occur.
fn arb_point() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-4i32..=4).prop_map(|[x, y, z]| {
        Point3::new(f64::from(x) * 0.25, f64::from(y) * 0.25, f64::from(z) * 0.25)
    })
}

/// Deltas that are sometimes exactly zero.
fn arb_delta() -> impl Strategy<Value = Vector3<f64>> {
    prop_oneof![
        Just(Vector3::zeros()),
        prop::array::uniform3(-1.0..1.0f64).prop_map(Vector3::from),
    ]
}

/// A source mesh with one channel, and a set of target points.
fn arb_case() -> impl Strategy<Value = (BlendShapeMesh, Vec<Point3<f64>>)> {
    prop::collection::vec((arb_point(), arb_delta()), 1..120).prop_flat_map(|pairs| {
        let (vertices, deltas): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        let mut source = BlendShapeMesh::new(vertices);
        source
            .add_frame("shape", BlendShapeFrame::new(100.0, deltas))
            .unwrap();
        (Just(source), prop::collection::vec(arb_point(), 1..600))
    })
}

fn arb_radius() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.25), 0.01..1.5f64]
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_strategies_and_scheduling_agree(
        (source, targets) in arb_case(),
        radius in arb_radius(),
    ) {
        let target = BlendShapeMesh::new(targets);
        let base = TransferParams::new().with_max_distance(radius);

        let reference = transfer_blendshapes(
            &source,
            &target,
            &IdentityFrame,
            &IdentityFrame,
            &base.clone().with_index_strategy(IndexStrategy::BruteForce).with_parallel(false),
        )
        .unwrap();

        for (strategy, parallel) in [
            (IndexStrategy::KdTree, false),
            (IndexStrategy::KdTree, true),
            (IndexStrategy::BruteForce, true),
        ] {
            let params = base
                .clone()
                .with_index_strategy(strategy)
                .with_parallel(parallel);
            let out = transfer_blendshapes(&source, &target, &IdentityFrame, &IdentityFrame, &params)
                .unwrap();
            prop_assert_eq!(&out, &reference);
        }
    }

    #[test]
    fn proptest_output_follows_correspondence(
        (source, targets) in arb_case(),
        radius in arb_radius(),
        offset in prop::array::uniform3(-1.0..1.0f64),
    ) {
        let target = BlendShapeMesh::new(targets);
        let offset = Vector3::from(offset);
        let params = TransferParams::new()
            .with_max_distance(radius)
            .with_channel_offset("shape", offset);

        let out = transfer_blendshapes(&source, &target, &IdentityFrame, &IdentityFrame, &params)
            .unwrap();
        let shape = out.shape("shape").unwrap();
        let deltas = &source.blend_shape("shape").unwrap().last_frame().unwrap().delta_vertices;

        prop_assert_eq!(shape.delta_vertices.len(), target.vertex_count());
        for (t, out_delta) in shape.delta_vertices.iter().enumerate() {
            match out.correspondences.source_of(t) {
                Some(m) if deltas[m].norm() > DELTA_EPSILON => {
                    let expected = deltas[m] + offset.component_mul(&deltas[m]);
                    prop_assert_eq!(*out_delta, expected);
                }
                _ => prop_assert_eq!(*out_delta, Vector3::zeros()),
            }
        }
        let stats = shape.stats;
        prop_assert_eq!(
            stats.transferred + stats.suppressed + stats.unmatched,
            shape.delta_vertices.len()
        );
    }
}
