//! Channel transforms
//!
//! Converts model-normalized feature vectors into wire-ready values:
//! denormalize with per-feature mean/std, then apply each channel's
//! linear transform and optional clamp.

use std::collections::HashMap;

use tracing::warn;

use crate::config::NormalizationParams;

/// One source-feature-to-wire-address mapping with its transform.
///
/// Addresses may repeat across channels (intentional fan-out, e.g. the
/// pelvis driving several bones); within one frame each channel is sent
/// exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub source_column: String,
    pub address: String,
    pub scale: f32,
    pub offset: f32,
    pub clamp: Option<(f32, f32)>,
}

impl Channel {
    /// Apply the linear transform and optional clamp to a raw value
    pub fn apply(&self, raw: f32) -> f32 {
        let value = self.scale * raw + self.offset;
        match self.clamp {
            Some((lo, hi)) => value.clamp(lo, hi),
            None => value,
        }
    }
}

/// Converts model-normalized features back to real units
#[derive(Debug, Clone)]
pub struct Denormalizer {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl Denormalizer {
    pub fn from_params(params: &NormalizationParams) -> Self {
        Self {
            mean: params.mean.clone(),
            std: params.std.clone(),
        }
    }

    /// Identity denormalizer for providers that emit real units directly
    pub fn identity(features: usize) -> Self {
        Self {
            mean: vec![0.0; features],
            std: vec![1.0; features],
        }
    }

    /// x = x_norm * std + mean
    pub fn denormalize(&self, feature_index: usize, normalized: f32) -> f32 {
        normalized * self.std[feature_index] + self.mean[feature_index]
    }

    pub fn features(&self) -> usize {
        self.mean.len()
    }
}

/// Outcome of resolving one channel against a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved {
    Value(f32),
    /// The channel's source column has no feature index; caller sends 0.0
    Miss,
}

/// Per-channel wire-address + transform table
///
/// Configuration only - pure lookups, no state mutated after construction.
#[derive(Debug, Clone)]
pub struct TransformTable {
    channels: Vec<Channel>,
    feature_index: HashMap<String, usize>,
}

impl TransformTable {
    /// Build the table, mapping each channel's source column to its
    /// feature index. Unmapped columns are logged once here and resolve
    /// to [`Resolved::Miss`] per frame.
    pub fn new(channels: Vec<Channel>, feature_columns: &[String]) -> Self {
        let feature_index: HashMap<String, usize> = feature_columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        for channel in &channels {
            if !feature_index.contains_key(&channel.source_column) {
                warn!(
                    "channel {} has no feature for source column '{}', will send 0.0",
                    channel.address, channel.source_column
                );
            }
        }

        Self {
            channels,
            feature_index,
        }
    }

    /// Denormalize the channel's feature and push it through the transform.
    ///
    /// `frame` is model-normalized; a frame shorter than the feature index
    /// also counts as a miss rather than an error.
    pub fn resolve(&self, channel: &Channel, frame: &[f32], denorm: &Denormalizer) -> Resolved {
        let idx = match self.feature_index.get(&channel.source_column) {
            Some(&idx) if idx < frame.len() && idx < denorm.features() => idx,
            _ => return Resolved::Miss,
        };
        let raw = denorm.denormalize(idx, frame[idx]);
        Resolved::Value(channel.apply(raw))
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// How many channels currently resolve to a feature index
    pub fn mapped_count(&self) -> usize {
        self.channels
            .iter()
            .filter(|c| self.feature_index.contains_key(&c.source_column))
            .count()
    }
}
