//! Ramp envelopes for mode transitions
//!
//! Turns and baseline returns fade in over a cubic ease-in-out envelope,
//! optionally hold at full amplitude, then hand control back to the
//! heartbeat stream.

/// Build a cubic ease-in-out envelope: e(t) = 3t^2 - 2t^3
///
/// Values are in [0, 1] and non-decreasing. A single-frame envelope is
/// `[1.0]`; zero frames yields an empty envelope.
pub fn build_envelope(n_frames: usize) -> Vec<f32> {
    match n_frames {
        0 => Vec::new(),
        1 => vec![1.0],
        n => (0..n)
            .map(|i| {
                let t = i as f32 / (n - 1) as f32;
                3.0 * t * t - 2.0 * t * t * t
            })
            .collect(),
    }
}

/// What the scheduler should do for the current ramp frame
#[derive(Debug, Clone, PartialEq)]
pub enum RampPhase {
    /// Scale this frame's channel values by the given envelope gain
    Ramp(f32),
    /// Repeat the recorded per-channel targets
    Hold,
    /// Ramp and hold are exhausted; revert to heartbeat
    Finished,
}

/// Progress of one ramp+hold animation
///
/// Created when a mode-changing command arrives, consumed frame-by-frame
/// by the scheduler worker, discarded once finished.
#[derive(Debug, Clone)]
pub struct RampState {
    envelope: Vec<f32>,
    frame_index: usize,
    hold_frames: usize,
    hold_index: usize,
    // Final wire values of the ramp, replayed verbatim during hold
    targets: Option<Vec<f32>>,
}

impl RampState {
    pub fn new(envelope: Vec<f32>, hold_frames: usize) -> Self {
        Self {
            envelope,
            frame_index: 0,
            hold_frames,
            hold_index: 0,
            targets: None,
        }
    }

    /// Phase for the frame about to be emitted
    pub fn phase(&self) -> RampPhase {
        if self.frame_index < self.envelope.len() {
            RampPhase::Ramp(self.envelope[self.frame_index])
        } else if self.hold_index < self.hold_frames {
            RampPhase::Hold
        } else {
            RampPhase::Finished
        }
    }

    /// True when the frame about to be emitted is the last ramp frame
    pub fn at_final_ramp_frame(&self) -> bool {
        !self.envelope.is_empty() && self.frame_index == self.envelope.len() - 1
    }

    /// Record the per-channel amplitude targets reached at the end of the ramp
    pub fn record_targets(&mut self, values: Vec<f32>) {
        self.targets = Some(values);
    }

    pub fn targets(&self) -> Option<&[f32]> {
        self.targets.as_deref()
    }

    /// Advance past the frame that was just emitted
    pub fn advance(&mut self) {
        if self.frame_index < self.envelope.len() {
            self.frame_index += 1;
        } else if self.hold_index < self.hold_frames {
            self.hold_index += 1;
        }
    }
}
