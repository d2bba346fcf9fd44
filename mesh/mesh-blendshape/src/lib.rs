//! Blendshape transfer between meshes of different topology.
//!
//! This crate copies blendshape (morph target) deltas from a source mesh
//! onto a target mesh. Each target vertex takes the delta of its nearest
//! source vertex, found within a search radius after an optional
//! world-space search transform.
//!
//! - [`BlendShapeMesh`] - Rest pose plus named, weighted blendshape frames
//! - [`BlendShapeSource`] / [`BlendShapeSink`] - Host mesh access
//! - [`TransferParams`] - Radius, index strategy, search transform, channel
//!   selection and per-channel offsets
//! - [`transfer_blendshapes`] / [`TransferRequest`] - Run a transfer
//! - [`TransferOutput`] - Transferred channels and the correspondence map
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Quick Start
//!
//! ```
//! use mesh_blendshape::{
//!     BlendShapeFrame, BlendShapeMesh, BlendShapeSource, TransferParams, TransferRequest,
//! };
//! use mesh_transform::Placement;
//! use nalgebra::Vector3;
//!
//! // A source head with a "jaw_open" shape.
//! let mut head = BlendShapeMesh::from_coords(&[[0.0, 1.6, 0.0], [0.0, 1.5, 0.05]]);
//! head.add_frame(
//!     "jaw_open",
//!     BlendShapeFrame::new(100.0, vec![Vector3::zeros(), Vector3::new(0.0, -0.02, 0.0)]),
//! )
//! .unwrap();
//!
//! // A beard mesh authored at the origin and placed on the head in the scene.
//! let beard = BlendShapeMesh::from_coords(&[[0.0, 0.0, 0.052]]);
//! let beard_placement = Placement::from_position(Vector3::new(0.0, 1.5, 0.0));
//!
//! let params = TransferParams::new().with_max_distance(0.01);
//! let output = TransferRequest::new(&params)
//!     .source(&head)
//!     .target(&beard)
//!     .target_frame(&beard_placement)
//!     .run()
//!     .unwrap();
//!
//! let beard = output.apply_to(&beard).unwrap();
//! assert_eq!(beard.blend_shape_count(), 1);
//! let jaw = beard.blend_shape("jaw_open").unwrap().last_frame().unwrap();
//! assert!((jaw.delta_vertices[0].y + 0.02).abs() < 1e-12);
//! ```
//!
//! # Output Rule
//!
//! For each selected channel the last (highest-weight) source frame is
//! used. A target vertex matched to source vertex `m` receives
//! `delta[m] + offset ⊙ delta[m]` when `|delta[m]| > 1e-6`, and zero
//! otherwise. Unmatched target vertices receive zero. Normal and tangent
//! deltas are always zero.
//!
//! # Progress and Cancellation
//!
//! A [`TransferObserver`] (any `FnMut(TransferProgress) -> ControlFlow<()>`)
//! is called every [`PROGRESS_INTERVAL`] target vertices and can cancel
//! the run. A cancelled run produces no output.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod mesh;
mod params;
mod progress;
mod result;
mod traits;
mod transfer;

pub use error::{MeshError, MeshResult, TransferError, TransferResult};
pub use mesh::{BlendShape, BlendShapeFrame, BlendShapeMesh};
pub use params::{ChannelSelection, DEFAULT_MAX_DISTANCE, TransferParams};
pub use progress::{NoProgress, TransferObserver, TransferProgress};
pub use result::{CorrespondenceMap, ShapeStats, TransferOutput, TransferredShape};
pub use traits::{BlendShapeSink, BlendShapeSource, FrameView};
pub use transfer::{
    DELTA_EPSILON, PROGRESS_INTERVAL, TransferRequest, find_correspondences, transfer_blendshapes,
};
