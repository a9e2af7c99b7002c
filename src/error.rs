//! Error types for the streaming engine
//!
//! Configuration loading and transport construction are the only places
//! allowed to fail hard; per-frame failures are counted and logged instead.

use thiserror::Error;

/// Errors surfaced by configuration loading, validation and the transport
#[derive(Error, Debug)]
pub enum StreamError {
    /// Channel/normalization configuration is missing, malformed or inconsistent
    #[error("config error: {0}")]
    Config(String),

    /// A numeric setting (fps, port, duration, ...) is out of range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A single OSC send failed
    #[error("send error: {0}")]
    Send(String),

    /// Underlying socket/file IO failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
