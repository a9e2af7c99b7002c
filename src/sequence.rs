//! Motion frame sources
//!
//! A [`SequenceProvider`] supplies ordered, finite, restartable sequences
//! of model-normalized motion frames for a named movement. The real
//! provider wraps a trained movement model; this module ships the
//! interface plus the neutral, mock and recorded implementations.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::StreamError;
use crate::modes::StreamMode;

/// Supplies one motion-frame vector per scheduler tick.
///
/// `restart` is called whenever the scheduler enters a mode, so a finite
/// sequence replays from its first frame on every new animation.
pub trait SequenceProvider: Send {
    /// Width of the frames this provider emits
    fn features(&self) -> usize;

    /// Reset the cursor for a freshly entered mode
    fn restart(&mut self, mode: StreamMode);

    /// Next model-normalized frame for the given mode
    fn next_frame(&mut self, mode: StreamMode) -> Vec<f32>;
}

/// Provider that always emits the neutral (zero) vector
#[derive(Debug, Clone)]
pub struct NeutralProvider {
    features: usize,
}

impl NeutralProvider {
    pub fn new(features: usize) -> Self {
        Self { features }
    }
}

impl SequenceProvider for NeutralProvider {
    fn features(&self) -> usize {
        self.features
    }

    fn restart(&mut self, _mode: StreamMode) {}

    fn next_frame(&mut self, _mode: StreamMode) -> Vec<f32> {
        vec![0.0; self.features]
    }
}

/// Deterministic sine-sweep provider for demos and wiring checks.
///
/// Emits real units (pair with an identity denormalizer): a slow sweep
/// around 30 degrees while turning, a small wobble around zero otherwise.
#[derive(Debug, Clone)]
pub struct MockProvider {
    features: usize,
    tick: u64,
}

impl MockProvider {
    pub fn new(features: usize) -> Self {
        Self { features, tick: 0 }
    }
}

impl SequenceProvider for MockProvider {
    fn features(&self) -> usize {
        self.features
    }

    fn restart(&mut self, _mode: StreamMode) {
        self.tick = 0;
    }

    fn next_frame(&mut self, mode: StreamMode) -> Vec<f32> {
        let t = self.tick as f32 * 0.1;
        self.tick += 1;
        let value = match mode {
            StreamMode::TurningLeft => 30.0 + 20.0 * t.sin(),
            StreamMode::TurningRight => -(30.0 + 20.0 * t.sin()),
            _ => 5.0 * (t * 0.5).sin(),
        };
        vec![value; self.features]
    }
}

#[derive(Debug, Deserialize)]
struct RawSequenceFile {
    baseline: Vec<Vec<f32>>,
    left: Vec<Vec<f32>>,
    right: Vec<Vec<f32>>,
}

/// Named movement sequences recorded ahead of time.
///
/// Each mode owns a finite frame list; the cursor wraps so a short
/// sequence keeps looping for as long as the mode is active.
#[derive(Debug, Clone)]
pub struct RecordedProvider {
    baseline: Vec<Vec<f32>>,
    left: Vec<Vec<f32>>,
    right: Vec<Vec<f32>>,
    features: usize,
    cursor: usize,
}

impl RecordedProvider {
    /// Load named sequences from a JSON file
    pub fn load(path: &Path) -> Result<Self, StreamError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StreamError::Config(format!("cannot read sequence file {}: {}", path.display(), e))
        })?;
        let provider = Self::parse(&text)?;
        info!(
            "loaded movement sequences from {} ({} features, {}/{}/{} frames)",
            path.display(),
            provider.features,
            provider.baseline.len(),
            provider.left.len(),
            provider.right.len()
        );
        Ok(provider)
    }

    /// Parse named sequences from JSON text
    pub fn parse(text: &str) -> Result<Self, StreamError> {
        let raw: RawSequenceFile = serde_json::from_str(text)
            .map_err(|e| StreamError::Config(format!("sequence file: {}", e)))?;

        let features = raw
            .baseline
            .first()
            .map(|f| f.len())
            .ok_or_else(|| StreamError::Config("sequence file: 'baseline' is empty".to_string()))?;

        for (name, seq) in [
            ("baseline", &raw.baseline),
            ("left", &raw.left),
            ("right", &raw.right),
        ] {
            if seq.is_empty() {
                return Err(StreamError::Config(format!(
                    "sequence file: '{}' is empty",
                    name
                )));
            }
            if let Some(bad) = seq.iter().position(|f| f.len() != features) {
                return Err(StreamError::Config(format!(
                    "sequence file: '{}' frame {} has {} features, expected {}",
                    name,
                    bad,
                    seq[bad].len(),
                    features
                )));
            }
        }

        Ok(Self {
            baseline: raw.baseline,
            left: raw.left,
            right: raw.right,
            features,
            cursor: 0,
        })
    }

    fn sequence(&self, mode: StreamMode) -> &[Vec<f32>] {
        match mode {
            StreamMode::TurningLeft => &self.left,
            StreamMode::TurningRight => &self.right,
            _ => &self.baseline,
        }
    }
}

impl SequenceProvider for RecordedProvider {
    fn features(&self) -> usize {
        self.features
    }

    fn restart(&mut self, _mode: StreamMode) {
        self.cursor = 0;
    }

    fn next_frame(&mut self, mode: StreamMode) -> Vec<f32> {
        let seq = self.sequence(mode);
        let frame = seq[self.cursor % seq.len()].clone();
        self.cursor += 1;
        frame
    }
}
