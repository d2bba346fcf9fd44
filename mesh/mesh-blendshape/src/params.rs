//! Transfer parameters and configuration.
//!
//! This module provides the [`TransferParams`] struct for configuring a
//! blendshape transfer run.

use std::collections::BTreeSet;

use cf_spatial::IndexStrategy;
use hashbrown::HashMap;
use mesh_transform::SearchTransform;
use nalgebra::Vector3;

use crate::{TransferError, TransferResult};

/// Default correspondence search radius, in source-local units (meters in
/// the usual host convention).
pub const DEFAULT_MAX_DISTANCE: f64 = 0.1;

/// Which source blendshapes to transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelSelection {
    /// Every blendshape on the source mesh.
    #[default]
    All,
    /// Only the named blendshapes. Names must exist on the source mesh.
    Only(BTreeSet<String>),
}

impl ChannelSelection {
    /// Selects the given names.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(names.into_iter().map(Into::into).collect())
    }

    /// Whether `name` is selected.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(name),
        }
    }
}

/// Parameters for blendshape transfer.
///
/// Use the builder methods to configure a run. Defaults: 0.1 search
/// radius, k-d tree index, identity search transform, all channels, no
/// offsets, parallel evaluation.
///
/// # Examples
///
/// ```
/// use mesh_blendshape::{ChannelSelection, TransferParams};
/// use mesh_transform::SearchTransform;
/// use nalgebra::Vector3;
///
/// let params = TransferParams::new()
///     .with_max_distance(0.05)
///     .with_search(SearchTransform::identity().with_offset(Vector3::new(0.0, -0.02, 0.0)))
///     .with_selection(ChannelSelection::only(["jaw_open", "smile"]))
///     .with_channel_offset("smile", Vector3::new(0.0, 0.5, 0.0));
///
/// assert!(params.validate().is_ok());
/// assert_eq!(params.channel_offset("smile"), Vector3::new(0.0, 0.5, 0.0));
/// assert_eq!(params.channel_offset("jaw_open"), Vector3::zeros());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransferParams {
    /// Maximum distance between a mapped target vertex and its source match.
    pub max_distance: f64,

    /// Point index used for the correspondence search.
    pub index_strategy: IndexStrategy,

    /// World-space adjustment applied to target positions before searching.
    pub search: SearchTransform,

    /// Channels to transfer.
    pub selection: ChannelSelection,

    /// Per-channel delta offsets. Output is `delta + offset ⊙ delta`.
    pub channel_offsets: HashMap<String, Vector3<f64>>,

    /// Whether to evaluate correspondences with rayon.
    pub parallel: bool,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferParams {
    /// Creates parameters with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            index_strategy: IndexStrategy::default(),
            search: SearchTransform::default(),
            selection: ChannelSelection::default(),
            channel_offsets: HashMap::new(),
            parallel: true,
        }
    }

    /// Sets the search radius.
    #[must_use]
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Sets the point index strategy.
    #[must_use]
    pub fn with_index_strategy(mut self, index_strategy: IndexStrategy) -> Self {
        self.index_strategy = index_strategy;
        self
    }

    /// Sets the search transform.
    #[must_use]
    pub fn with_search(mut self, search: SearchTransform) -> Self {
        self.search = search;
        self
    }

    /// Sets the channel selection.
    #[must_use]
    pub fn with_selection(mut self, selection: ChannelSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Adds `name` to the selection, switching from [`ChannelSelection::All`]
    /// to an explicit list if needed.
    #[must_use]
    pub fn select(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        match &mut self.selection {
            all @ ChannelSelection::All => *all = ChannelSelection::Only(BTreeSet::from([name])),
            ChannelSelection::Only(names) => {
                names.insert(name);
            }
        }
        self
    }

    /// Sets the delta offset for one channel.
    #[must_use]
    pub fn with_channel_offset(mut self, name: impl Into<String>, offset: Vector3<f64>) -> Self {
        self.channel_offsets.insert(name.into(), offset);
        self
    }

    /// Enables or disables parallel evaluation.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The delta offset for `name`, zero if none was set.
    #[must_use]
    pub fn channel_offset(&self, name: &str) -> Vector3<f64> {
        self.channel_offsets
            .get(name)
            .copied()
            .unwrap_or_else(Vector3::zeros)
    }

    /// Restores the search transform to identity, leaving everything else.
    pub fn reset_search(&mut self) {
        self.search.reset();
    }

    /// Checks the parameters independently of any mesh.
    ///
    /// # Errors
    ///
    /// - [`TransferError::InvalidParameter`] if `max_distance` is not a
    ///   finite positive number, or a channel offset is not finite
    /// - [`TransferError::Transform`] if the search transform is unusable
    pub fn validate(&self) -> TransferResult<()> {
        if !self.max_distance.is_finite() || self.max_distance <= 0.0 {
            return Err(TransferError::invalid_parameter(format!(
                "max distance must be finite and positive, got {}",
                self.max_distance
            )));
        }
        self.search.validate()?;
        for (name, offset) in &self.channel_offsets {
            if !offset.iter().all(|c| c.is_finite()) {
                return Err(TransferError::invalid_parameter(format!(
                    "offset for '{name}' is not finite"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use mesh_transform::TransformError;

    #[test]
    fn defaults() {
        let params = TransferParams::default();
        assert_eq!(params.max_distance, DEFAULT_MAX_DISTANCE);
        assert_eq!(params.index_strategy, IndexStrategy::KdTree);
        assert!(params.search.is_identity());
        assert_eq!(params.selection, ChannelSelection::All);
        assert!(params.channel_offsets.is_empty());
        assert!(params.parallel);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn select_builds_explicit_list() {
        let params = TransferParams::new().select("a").select("b").select("a");
        assert_eq!(params.selection, ChannelSelection::only(["a", "b"]));
        assert!(params.selection.contains("b"));
        assert!(!params.selection.contains("c"));
        assert!(ChannelSelection::All.contains("anything"));
    }

    #[test]
    fn max_distance_must_be_positive_and_finite() {
        for bad in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let err = TransferParams::new().with_max_distance(bad).validate();
            assert!(
                matches!(err, Err(TransferError::InvalidParameter(_))),
                "{bad} accepted"
            );
        }
    }

    #[test]
    fn non_finite_offset_rejected() {
        let params =
            TransferParams::new().with_channel_offset("smile", Vector3::new(0.0, f64::NAN, 0.0));
        assert!(matches!(
            params.validate(),
            Err(TransferError::InvalidParameter(msg)) if msg.contains("smile")
        ));
    }

    #[test]
    fn degenerate_search_transform_rejected() {
        let params = TransferParams::new()
            .with_search(SearchTransform::identity().with_scale(Vector3::new(1.0, 0.0, 1.0)));
        assert_eq!(
            params.validate(),
            Err(TransferError::Transform(TransformError::DegenerateScale {
                axis: 'y'
            }))
        );
    }

    #[test]
    fn reset_search_keeps_other_settings() {
        let mut params = TransferParams::new()
            .with_max_distance(0.3)
            .with_search(SearchTransform::identity().with_uniform_scale(2.0));
        params.reset_search();
        assert!(params.search.is_identity());
        assert_eq!(params.max_distance, 0.3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let params = TransferParams::new()
            .with_max_distance(0.25)
            .with_index_strategy(IndexStrategy::BruteForce)
            .select("blink")
            .with_channel_offset("blink", Vector3::new(0.1, 0.0, 0.0));
        let json = serde_json::to_string(&params).unwrap();
        let back: TransferParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);

        // Missing fields fall back to defaults.
        let partial: TransferParams = serde_json::from_str(r#"{"max_distance":0.5}"#).unwrap();
        assert_eq!(partial.max_distance, 0.5);
        assert!(partial.parallel);
    }
}
