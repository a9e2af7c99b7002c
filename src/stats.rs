//! Streaming statistics
//!
//! Counters are written only by the scheduler worker and read from the
//! session thread as a copyable snapshot, so plain atomics are enough.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Shared counters for one streaming session
#[derive(Debug)]
pub struct StreamStats {
    sent: AtomicU64,
    errors: AtomicU64,
    mapping_misses: AtomicU64,
    frames: AtomicU64,
    // Micros since `epoch`; 0 means nothing has been sent yet
    last_send_micros: AtomicU64,
    epoch: Instant,
}

impl StreamStats {
    pub fn new() -> Self {
        Self {
            sent: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            mapping_misses: AtomicU64::new(0),
            frames: AtomicU64::new(0),
            last_send_micros: AtomicU64::new(0),
            epoch: Instant::now(),
        }
    }

    /// Record `count` successfully sent messages and refresh the send timestamp
    pub fn record_sent(&self, count: u64) {
        self.sent.fetch_add(count, Ordering::Relaxed);
        let micros = self.epoch.elapsed().as_micros() as u64;
        // +1 keeps a send at epoch distinguishable from "never"
        self.last_send_micros.store(micros + 1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mapping_miss(&self) {
        self.mapping_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Age of the last successful send, or None if nothing was sent yet
    pub fn last_send_age(&self) -> Option<Duration> {
        let stamp = self.last_send_micros.load(Ordering::Relaxed);
        if stamp == 0 {
            return None;
        }
        let now = self.epoch.elapsed().as_micros() as u64;
        Some(Duration::from_micros(now.saturating_sub(stamp - 1)))
    }

    /// Copyable view for display threads
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sent_count: self.sent.load(Ordering::Relaxed),
            error_count: self.errors.load(Ordering::Relaxed),
            mapping_miss_count: self.mapping_misses.load(Ordering::Relaxed),
            frame_count: self.frames.load(Ordering::Relaxed),
            last_send_age: self.last_send_age(),
        }
    }
}

impl Default for StreamStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the streaming counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    pub sent_count: u64,
    pub error_count: u64,
    pub mapping_miss_count: u64,
    pub frame_count: u64,
    pub last_send_age: Option<Duration>,
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "messages: {} | errors: {} | misses: {} | frames: {}",
            self.sent_count, self.error_count, self.mapping_miss_count, self.frame_count
        )
    }
}
