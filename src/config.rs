//! Configuration loading
//!
//! Channel tables, normalization parameters and session settings are
//! loaded once at startup and immutable afterwards. Anything missing or
//! malformed fails the load with a descriptive error - the core does not
//! guess.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::StreamError;
use crate::transform::Channel;

/// Floor applied to near-zero std entries at load time
pub const STD_EPSILON: f32 = 1e-6;

#[derive(Debug, Deserialize)]
struct RawChannelFile {
    channels: Vec<RawChannel>,
    meta: RawMeta,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    source_column: String,
    osc_address: String,
    transform: RawTransform,
}

#[derive(Debug, Deserialize)]
struct RawTransform {
    scale: f32,
    offset: f32,
    clamp: Option<[f32; 2]>,
}

#[derive(Debug, Deserialize)]
struct RawMeta {
    host: String,
    port: u16,
    rate: u32,
    units: String,
}

/// Target host/rate metadata from the channel configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    pub host: String,
    pub port: u16,
    pub rate: u32,
    pub units: String,
}

/// Parsed and validated channel configuration
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub channels: Vec<Channel>,
    pub meta: Meta,
}

impl ChannelConfig {
    /// Load and validate a channel configuration JSON file
    pub fn load(path: &Path) -> Result<Self, StreamError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StreamError::Config(format!("cannot read channel config {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&text)?;
        info!(
            "loaded {} channels from {} (target {}:{} @ {} fps)",
            config.channels.len(),
            path.display(),
            config.meta.host,
            config.meta.port,
            config.meta.rate
        );
        Ok(config)
    }

    /// Parse a channel configuration from JSON text
    pub fn parse(text: &str) -> Result<Self, StreamError> {
        let raw: RawChannelFile = serde_json::from_str(text)
            .map_err(|e| StreamError::Config(format!("channel config: {}", e)))?;

        if raw.channels.is_empty() {
            return Err(StreamError::Config(
                "channel config: 'channels' array is empty".to_string(),
            ));
        }
        if raw.meta.rate == 0 {
            return Err(StreamError::Config(
                "channel config: meta.rate must be >= 1".to_string(),
            ));
        }

        let mut channels = Vec::with_capacity(raw.channels.len());
        for (i, ch) in raw.channels.into_iter().enumerate() {
            if !ch.transform.scale.is_finite() || !ch.transform.offset.is_finite() {
                return Err(StreamError::Config(format!(
                    "channel {} ('{}'): scale/offset must be finite",
                    i, ch.osc_address
                )));
            }
            let clamp = match ch.transform.clamp {
                Some([lo, hi]) => {
                    if !lo.is_finite() || !hi.is_finite() || lo > hi {
                        return Err(StreamError::Config(format!(
                            "channel {} ('{}'): clamp [{}, {}] is not a valid range",
                            i, ch.osc_address, lo, hi
                        )));
                    }
                    Some((lo, hi))
                }
                None => None,
            };
            if ch.osc_address.is_empty() || !ch.osc_address.starts_with('/') {
                return Err(StreamError::Config(format!(
                    "channel {}: OSC address '{}' must start with '/'",
                    i, ch.osc_address
                )));
            }
            channels.push(Channel {
                source_column: ch.source_column,
                address: ch.osc_address,
                scale: ch.transform.scale,
                offset: ch.transform.offset,
                clamp,
            });
        }

        Ok(Self {
            channels,
            meta: Meta {
                host: raw.meta.host,
                port: raw.meta.port,
                rate: raw.meta.rate,
                units: raw.meta.units,
            },
        })
    }
}

/// Per-feature normalization parameters for the motion model's output
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizationParams {
    pub feature_columns: Vec<String>,
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl NormalizationParams {
    /// Load from JSON, enforcing equal lengths and flooring near-zero std
    pub fn load(path: &Path) -> Result<Self, StreamError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StreamError::Config(format!(
                "cannot read normalization params {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&text)
    }

    /// Parse from JSON text
    pub fn parse(text: &str) -> Result<Self, StreamError> {
        let mut params: NormalizationParams = serde_json::from_str(text)
            .map_err(|e| StreamError::Config(format!("normalization params: {}", e)))?;

        let n = params.feature_columns.len();
        if params.mean.len() != n || params.std.len() != n {
            return Err(StreamError::Config(format!(
                "normalization params: {} feature columns but {} mean / {} std entries",
                n,
                params.mean.len(),
                params.std.len()
            )));
        }
        for (i, v) in params.mean.iter().chain(params.std.iter()).enumerate() {
            if !v.is_finite() {
                return Err(StreamError::Config(format!(
                    "normalization params: non-finite entry at position {}",
                    i
                )));
            }
        }
        // Floor tiny std values so denormalization cannot blow up
        for std in &mut params.std {
            if std.abs() < STD_EPSILON {
                *std = STD_EPSILON;
            }
        }

        Ok(params)
    }

    /// Identity parameters for sources that already emit real units
    pub fn identity(feature_columns: Vec<String>) -> Self {
        let n = feature_columns.len();
        Self {
            feature_columns,
            mean: vec![0.0; n],
            std: vec![1.0; n],
        }
    }
}

/// Validated parameters for one streaming session
#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub host: String,
    pub port: u16,
    pub fps: u32,
    pub turn_duration_s: f32,
    pub hold_s: f32,
    pub connection_timeout_s: f32,
}

impl StreamSettings {
    /// Seed settings from the config file's meta block
    pub fn from_meta(meta: &Meta) -> Self {
        Self {
            host: meta.host.clone(),
            port: meta.port,
            fps: meta.rate,
            turn_duration_s: 1.5,
            hold_s: 0.0,
            connection_timeout_s: 2.0,
        }
    }

    /// Reject malformed numeric settings before streaming starts
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.port == 0 {
            return Err(StreamError::InvalidParameter(
                "port must be non-zero".to_string(),
            ));
        }
        if self.fps == 0 || self.fps > 1000 {
            return Err(StreamError::InvalidParameter(format!(
                "fps must be in 1..=1000, got {}",
                self.fps
            )));
        }
        if !self.turn_duration_s.is_finite() || self.turn_duration_s <= 0.0 {
            return Err(StreamError::InvalidParameter(format!(
                "turn duration must be > 0 s, got {}",
                self.turn_duration_s
            )));
        }
        if !self.hold_s.is_finite() || self.hold_s < 0.0 {
            return Err(StreamError::InvalidParameter(format!(
                "hold must be >= 0 s, got {}",
                self.hold_s
            )));
        }
        if !self.connection_timeout_s.is_finite() || self.connection_timeout_s <= 0.0 {
            return Err(StreamError::InvalidParameter(format!(
                "connection timeout must be > 0 s, got {}",
                self.connection_timeout_s
            )));
        }
        Ok(())
    }
}
