//! Search-space transforms and coordinate conversion for blendshape transfer.
//!
//! This crate provides:
//! - [`SearchTransform`] - Offset, Euler rotation and scale applied to query positions
//! - [`LocalFrame`] - The host boundary for local ↔ world conversions
//! - [`Placement`], [`AffineFrame`], [`IdentityFrame`] - Common frame implementations
//! - [`CoordinateBridge`] - Target-local → world → search → source-local mapping
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Conventions
//!
//! Euler angles follow the host editor convention: Y is up and the
//! rotation is applied about Z, then X, then Y. Angles are in degrees.
//!
//! # Example
//!
//! ```
//! use mesh_transform::{CoordinateBridge, IdentityFrame, SearchTransform};
//! use nalgebra::{Point3, Vector3};
//!
//! let search = SearchTransform::identity()
//!     .with_offset(Vector3::new(1.0, 0.0, 0.0))
//!     .with_rotation_degrees(Vector3::new(0.0, 90.0, 0.0));
//!
//! let bridge = CoordinateBridge::new(&IdentityFrame, &IdentityFrame, search);
//! let p = bridge.target_to_source(&Point3::origin());
//!
//! // Offset first, then rotation about the origin.
//! assert!((p.z + 1.0).abs() < 1e-12);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bridge;
mod error;
mod frame;
mod search;

pub use bridge::CoordinateBridge;
pub use error::{TransformError, TransformResult};
pub use frame::{AffineFrame, IdentityFrame, LocalFrame, Placement};
pub use search::{SearchTransform, euler_degrees_to_rotation};
