//! Main transfer function.
//!
//! This module provides [`transfer_blendshapes`] and the [`TransferRequest`]
//! builder, which copy blendshape deltas from a source mesh onto a target
//! mesh through nearest-vertex correspondences.

use cf_spatial::NearestPointIndex;
use hashbrown::HashSet;
use mesh_transform::{CoordinateBridge, IdentityFrame, LocalFrame};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    BlendShapeSource, ChannelSelection, CorrespondenceMap, FrameView, NoProgress, ShapeStats,
    TransferError, TransferObserver, TransferOutput, TransferParams, TransferProgress,
    TransferResult, TransferredShape,
};

/// Source deltas with a magnitude at or below this are treated as zero.
pub const DELTA_EPSILON: f64 = 1e-6;

/// Target vertices processed between progress reports.
pub const PROGRESS_INTERVAL: usize = 256;

/// Finds the nearest source vertex for every target vertex.
///
/// Each target vertex is mapped into source-local space through `bridge`
/// and looked up in `index` with `max_distance` as an inclusive cutoff.
/// Work proceeds in chunks of [`PROGRESS_INTERVAL`] vertices; `observer` is
/// called before the first chunk, between chunks and after the last one.
/// With `parallel` set, each chunk is evaluated with rayon. The result is
/// the same either way.
///
/// # Errors
///
/// Returns [`TransferError::Cancelled`] if the observer breaks.
///
/// # Example
///
/// ```
/// use cf_spatial::IndexStrategy;
/// use mesh_blendshape::{NoProgress, find_correspondences};
/// use mesh_transform::{CoordinateBridge, IdentityFrame, SearchTransform};
/// use nalgebra::Point3;
///
/// let index = IndexStrategy::KdTree
///     .build(vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)])
///     .unwrap();
/// let bridge = CoordinateBridge::new(&IdentityFrame, &IdentityFrame, SearchTransform::identity());
/// let targets = [Point3::new(0.98, 0.0, 0.0), Point3::new(5.0, 0.0, 0.0)];
///
/// let map = find_correspondences(&index, &targets, &bridge, 0.1, false, &mut NoProgress).unwrap();
/// assert_eq!(map.as_slice(), &[Some(1), None]);
/// ```
pub fn find_correspondences<I, T, S, O>(
    index: &I,
    target_vertices: &[Point3<f64>],
    bridge: &CoordinateBridge<'_, T, S>,
    max_distance: f64,
    parallel: bool,
    observer: &mut O,
) -> TransferResult<CorrespondenceMap>
where
    I: NearestPointIndex + Sync + ?Sized,
    T: LocalFrame + Sync + ?Sized,
    S: LocalFrame + Sync + ?Sized,
    O: TransferObserver + ?Sized,
{
    let total = target_vertices.len();
    let query = |p: &Point3<f64>| index.find_nearest(&bridge.target_to_source(p), max_distance);

    let mut matches = Vec::with_capacity(total);
    let mut completed = 0;
    loop {
        if observer
            .on_progress(TransferProgress { completed, total })
            .is_break()
        {
            debug!(completed, total, "Transfer cancelled by observer");
            return Err(TransferError::Cancelled { completed, total });
        }
        if completed == total {
            break;
        }

        let end = (completed + PROGRESS_INTERVAL).min(total);
        let chunk = &target_vertices[completed..end];
        if parallel {
            matches.par_extend(chunk.par_iter().map(&query));
        } else {
            matches.extend(chunk.iter().map(&query));
        }
        completed = end;
    }

    Ok(CorrespondenceMap::new(matches))
}

/// Transfers blendshapes from `source` to `target`.
///
/// Shorthand for a [`TransferRequest`] without a progress observer.
///
/// # Errors
///
/// See [`TransferRequest::run`].
///
/// # Example
///
/// ```
/// use mesh_blendshape::{BlendShapeFrame, BlendShapeMesh, TransferParams, transfer_blendshapes};
/// use mesh_transform::IdentityFrame;
/// use nalgebra::{Point3, Vector3};
///
/// let mut source = BlendShapeMesh::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
/// source
///     .add_frame(
///         "raise",
///         BlendShapeFrame::new(
///             100.0,
///             vec![Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, 2.0), Vector3::zeros()],
///         ),
///     )
///     .unwrap();
/// let target = BlendShapeMesh::from_coords(&[[1.05, 0.0, 0.0]]);
///
/// let params = TransferParams::new().with_max_distance(0.2);
/// let output = transfer_blendshapes(&source, &target, &IdentityFrame, &IdentityFrame, &params).unwrap();
///
/// let raise = output.shape("raise").unwrap();
/// assert_eq!(raise.delta_vertices, vec![Vector3::new(0.0, 0.0, 2.0)]);
/// assert_eq!(output.correspondences.source_of(0), Some(1));
/// ```
pub fn transfer_blendshapes(
    source: &dyn BlendShapeSource,
    target: &dyn BlendShapeSource,
    source_frame: &(dyn LocalFrame + Sync),
    target_frame: &(dyn LocalFrame + Sync),
    params: &TransferParams,
) -> TransferResult<TransferOutput> {
    TransferRequest::new(params)
        .source(source)
        .target(target)
        .source_frame(source_frame)
        .target_frame(target_frame)
        .run()
}

/// A configured transfer run.
///
/// Source and target are optional so a host can build the request from
/// whatever the user has picked and get a typed error for what is missing.
/// Frames default to [`IdentityFrame`].
///
/// # Example
///
/// ```
/// use mesh_blendshape::{BlendShapeMesh, TransferError, TransferParams, TransferRequest};
///
/// let target = BlendShapeMesh::from_coords(&[[0.0, 0.0, 0.0]]);
/// let params = TransferParams::default();
///
/// let err = TransferRequest::new(&params).target(&target).run().unwrap_err();
/// assert_eq!(err, TransferError::MissingSourceMesh);
/// ```
pub struct TransferRequest<'a> {
    params: &'a TransferParams,
    source: Option<&'a dyn BlendShapeSource>,
    target: Option<&'a dyn BlendShapeSource>,
    source_frame: &'a (dyn LocalFrame + Sync),
    target_frame: &'a (dyn LocalFrame + Sync),
    observer: Option<&'a mut dyn TransferObserver>,
}

impl<'a> TransferRequest<'a> {
    /// Creates a request with no meshes, identity frames and no observer.
    #[must_use]
    pub fn new(params: &'a TransferParams) -> Self {
        Self {
            params,
            source: None,
            target: None,
            source_frame: &IdentityFrame,
            target_frame: &IdentityFrame,
            observer: None,
        }
    }

    /// Sets the mesh deltas are read from.
    #[must_use]
    pub fn source(mut self, source: &'a dyn BlendShapeSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the mesh deltas are written for.
    #[must_use]
    pub fn target(mut self, target: &'a dyn BlendShapeSource) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the source mesh placement.
    #[must_use]
    pub fn source_frame(mut self, frame: &'a (dyn LocalFrame + Sync)) -> Self {
        self.source_frame = frame;
        self
    }

    /// Sets the target mesh placement.
    #[must_use]
    pub fn target_frame(mut self, frame: &'a (dyn LocalFrame + Sync)) -> Self {
        self.target_frame = frame;
        self
    }

    /// Sets the progress observer.
    #[must_use]
    pub fn observer(mut self, observer: &'a mut dyn TransferObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Runs the transfer.
    ///
    /// Builds one point index over the source rest pose, finds one
    /// correspondence per target vertex, then fills every selected channel
    /// from the last frame of the matching source channel. Output deltas
    /// are `delta + offset ⊙ delta` where the source delta is non-negligible,
    /// zero elsewhere.
    ///
    /// # Errors
    ///
    /// Nothing is produced if any check fails:
    /// - [`TransferError::MissingSourceMesh`] / [`TransferError::MissingTargetMesh`]
    /// - [`TransferError::InvalidParameter`] / [`TransferError::Transform`]
    ///   for unusable parameters
    /// - [`TransferError::EmptySourceMesh`] / [`TransferError::EmptyTargetMesh`]
    /// - [`TransferError::UnknownChannel`] for a selected name the source lacks
    /// - [`TransferError::UnnamedChannel`], [`TransferError::DuplicateChannel`],
    ///   [`TransferError::EmptyChannel`] or [`TransferError::DeltaCountMismatch`]
    ///   for malformed source channels
    /// - [`TransferError::Index`] if the source vertices cannot be indexed
    /// - [`TransferError::Cancelled`] if the observer breaks
    pub fn run(self) -> TransferResult<TransferOutput> {
        let source = self.source.ok_or(TransferError::MissingSourceMesh)?;
        let target = self.target.ok_or(TransferError::MissingTargetMesh)?;
        let params = self.params;
        params.validate()?;

        let source_vertices = source.vertices();
        let target_vertices = target.vertices();
        if source_vertices.is_empty() {
            return Err(TransferError::EmptySourceMesh);
        }
        if target_vertices.is_empty() {
            return Err(TransferError::EmptyTargetMesh);
        }

        let channels = select_channels(source, &params.selection)?;
        for name in params.channel_offsets.keys() {
            if !channels.iter().any(|c| c.name == name.as_str()) {
                warn!(channel = %name, "Offset given for a blendshape that is not transferred");
            }
        }

        info!(
            source_vertices = source_vertices.len(),
            target_vertices = target_vertices.len(),
            channels = channels.len(),
            max_distance = params.max_distance,
            strategy = ?params.index_strategy,
            "Starting blendshape transfer"
        );

        let index = params.index_strategy.build(source_vertices.to_vec())?;
        debug!(points = index.len(), strategy = ?index.strategy(), "Built source point index");

        let bridge = CoordinateBridge::new(self.target_frame, self.source_frame, params.search);
        let correspondences = match self.observer {
            Some(observer) => find_correspondences(
                &index,
                target_vertices,
                &bridge,
                params.max_distance,
                params.parallel,
                observer,
            ),
            None => find_correspondences(
                &index,
                target_vertices,
                &bridge,
                params.max_distance,
                params.parallel,
                &mut NoProgress,
            ),
        }?;

        let shapes: Vec<TransferredShape> = channels
            .iter()
            .map(|channel| {
                transfer_channel(channel, &correspondences, params.channel_offset(channel.name))
            })
            .collect();

        info!(
            matched = correspondences.matched_count(),
            unmatched = correspondences.len() - correspondences.matched_count(),
            shapes = shapes.len(),
            "Blendshape transfer complete"
        );

        Ok(TransferOutput {
            shapes,
            correspondences,
        })
    }
}

/// A selected source channel and the frame its deltas come from.
struct Channel<'a> {
    name: &'a str,
    frame: FrameView<'a>,
}

/// Resolves the selection against `source`, in source order.
fn select_channels<'a>(
    source: &'a dyn BlendShapeSource,
    selection: &ChannelSelection,
) -> TransferResult<Vec<Channel<'a>>> {
    if let ChannelSelection::Only(names) = selection {
        if let Some(missing) = names.iter().find(|n| source.find_blend_shape(n).is_none()) {
            return Err(TransferError::UnknownChannel {
                name: missing.clone(),
            });
        }
    }

    let expected = source.vertex_count();
    let mut channels = Vec::new();
    let mut seen = HashSet::new();
    for shape in 0..source.blend_shape_count() {
        let Some(name) = source.blend_shape_name(shape).filter(|n| !n.is_empty()) else {
            // An unnamed channel can only be reached through `All`.
            if matches!(selection, ChannelSelection::All) {
                return Err(TransferError::UnnamedChannel { index: shape });
            }
            continue;
        };
        if !selection.contains(name) {
            continue;
        }
        if !seen.insert(name) {
            return Err(TransferError::DuplicateChannel {
                name: name.to_string(),
            });
        }

        // Only the last (highest-weight) frame is transferred.
        let frame = source
            .frame_count(shape)
            .checked_sub(1)
            .and_then(|last| source.frame(shape, last))
            .ok_or_else(|| TransferError::EmptyChannel {
                name: name.to_string(),
            })?;
        if frame.delta_vertices.len() != expected {
            return Err(TransferError::DeltaCountMismatch {
                name: name.to_string(),
                expected,
                actual: frame.delta_vertices.len(),
            });
        }
        channels.push(Channel { name, frame });
    }
    Ok(channels)
}

fn transfer_channel(
    channel: &Channel<'_>,
    correspondences: &CorrespondenceMap,
    offset: Vector3<f64>,
) -> TransferredShape {
    let deltas = channel.frame.delta_vertices;
    let mut stats = ShapeStats::default();

    let delta_vertices: Vec<Vector3<f64>> = correspondences
        .as_slice()
        .iter()
        .map(|m| {
            let Some(delta) = m.and_then(|i| deltas.get(i)) else {
                stats.unmatched += 1;
                return Vector3::zeros();
            };
            if delta.norm() > DELTA_EPSILON {
                let out = delta + offset.component_mul(delta);
                stats.transferred += 1;
                stats.max_delta = stats.max_delta.max(out.norm());
                out
            } else {
                stats.suppressed += 1;
                Vector3::zeros()
            }
        })
        .collect();

    debug!(
        channel = channel.name,
        weight = channel.frame.weight,
        transferred = stats.transferred,
        suppressed = stats.suppressed,
        unmatched = stats.unmatched,
        "Transferred blendshape"
    );

    let n = delta_vertices.len();
    TransferredShape {
        name: channel.name.to_string(),
        weight: channel.frame.weight,
        delta_vertices,
        delta_normals: vec![Vector3::zeros(); n],
        delta_tangents: vec![Vector3::zeros(); n],
        stats,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{BlendShapeFrame, BlendShapeMesh};
    use cf_spatial::IndexStrategy;
    use mesh_transform::SearchTransform;
    use std::ops::ControlFlow;

    fn line_source() -> BlendShapeMesh {
        let mut source =
            BlendShapeMesh::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        source
            .add_frame(
                "raise",
                BlendShapeFrame::new(
                    100.0,
                    vec![
                        Vector3::new(0.0, 0.0, 1.0),
                        Vector3::new(0.0, 0.0, 2.0),
                        Vector3::zeros(),
                    ],
                ),
            )
            .unwrap();
        source
    }

    #[test]
    fn correspondences_report_progress_per_chunk() {
        let index = IndexStrategy::KdTree.build(vec![Point3::origin()]).unwrap();
        let bridge =
            CoordinateBridge::new(&IdentityFrame, &IdentityFrame, SearchTransform::identity());
        let targets = vec![Point3::origin(); 600];

        let mut reports = Vec::new();
        let mut observer = |p: TransferProgress| {
            reports.push(p.completed);
            ControlFlow::Continue(())
        };
        let map = find_correspondences(&index, &targets, &bridge, 0.1, false, &mut observer)
            .unwrap();

        assert_eq!(reports, vec![0, 256, 512, 600]);
        assert_eq!(map.matched_count(), 600);
    }

    #[test]
    fn cancel_between_chunks() {
        let index = IndexStrategy::BruteForce.build(vec![Point3::origin()]).unwrap();
        let bridge =
            CoordinateBridge::new(&IdentityFrame, &IdentityFrame, SearchTransform::identity());
        let targets = vec![Point3::origin(); 1000];

        let mut observer = |p: TransferProgress| {
            if p.completed >= 512 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        let err = find_correspondences(&index, &targets, &bridge, 0.1, true, &mut observer)
            .unwrap_err();
        assert_eq!(
            err,
            TransferError::Cancelled {
                completed: 512,
                total: 1000
            }
        );
    }

    #[test]
    fn last_frame_is_used() {
        let mut source = BlendShapeMesh::from_coords(&[[0.0, 0.0, 0.0]]);
        source
            .add_frame("a", BlendShapeFrame::new(50.0, vec![Vector3::new(1.0, 0.0, 0.0)]))
            .unwrap();
        source
            .add_frame("a", BlendShapeFrame::new(100.0, vec![Vector3::new(3.0, 0.0, 0.0)]))
            .unwrap();
        let target = BlendShapeMesh::from_coords(&[[0.0, 0.0, 0.0]]);

        let params = TransferParams::default();
        let out = transfer_blendshapes(&source, &target, &IdentityFrame, &IdentityFrame, &params)
            .unwrap();
        let shape = out.shape("a").unwrap();
        assert_eq!(shape.weight, 100.0);
        assert_eq!(shape.delta_vertices[0], Vector3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn stats_count_each_outcome() {
        let source = line_source();
        // Matches vertex 1 (non-zero), vertex 2 (zero delta), nothing.
        let target =
            BlendShapeMesh::from_coords(&[[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [9.0, 0.0, 0.0]]);
        let params = TransferParams::default();
        let out = transfer_blendshapes(&source, &target, &IdentityFrame, &IdentityFrame, &params)
            .unwrap();

        let stats = out.shape("raise").unwrap().stats;
        assert_eq!(stats.transferred, 1);
        assert_eq!(stats.suppressed, 1);
        assert_eq!(stats.unmatched, 1);
        assert!((stats.max_delta - 2.0).abs() < 1e-12);
    }

    #[test]
    fn normals_and_tangents_are_zero() {
        let source = line_source();
        let target = BlendShapeMesh::from_coords(&[[0.0, 0.0, 0.0]]);
        let params = TransferParams::default();
        let out = transfer_blendshapes(&source, &target, &IdentityFrame, &IdentityFrame, &params)
            .unwrap();
        let shape = out.shape("raise").unwrap();
        assert_eq!(shape.delta_normals, vec![Vector3::zeros()]);
        assert_eq!(shape.delta_tangents, vec![Vector3::zeros()]);
    }

    #[test]
    fn delta_at_epsilon_is_suppressed() {
        let mut source = BlendShapeMesh::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        source
            .add_frame(
                "tiny",
                BlendShapeFrame::new(
                    1.0,
                    vec![
                        Vector3::new(DELTA_EPSILON, 0.0, 0.0),
                        Vector3::new(2.0 * DELTA_EPSILON, 0.0, 0.0),
                    ],
                ),
            )
            .unwrap();
        let target = BlendShapeMesh::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let params = TransferParams::default();
        let out = transfer_blendshapes(&source, &target, &IdentityFrame, &IdentityFrame, &params)
            .unwrap();
        let deltas = &out.shape("tiny").unwrap().delta_vertices;
        assert_eq!(deltas[0], Vector3::zeros());
        assert_eq!(deltas[1], Vector3::new(2.0 * DELTA_EPSILON, 0.0, 0.0));
    }
}
