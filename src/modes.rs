//! Streaming modes and the mode state machine
//!
//! Exactly one mode is active at a time, and only the scheduler worker
//! mutates it. Turn and baseline modes carry a ramp+hold animation and
//! auto-revert to heartbeat when it is exhausted.

use crate::ramp::RampState;

/// Behavioral state of the streaming engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Idle,
    Heartbeat,
    Baseline,
    TurningLeft,
    TurningRight,
    Stopped,
}

impl StreamMode {
    /// Name sent on `/mh/mode`
    pub fn wire_name(&self) -> &'static str {
        match self {
            StreamMode::Idle => "IDLE",
            StreamMode::Heartbeat => "HEARTBEAT",
            StreamMode::Baseline => "BASELINE",
            StreamMode::TurningLeft => "TURNING_LEFT",
            StreamMode::TurningRight => "TURNING_RIGHT",
            StreamMode::Stopped => "STOPPED",
        }
    }

    /// Idle and Stopped are the only modes that emit nothing
    pub fn emits_frames(&self) -> bool {
        !matches!(self, StreamMode::Idle | StreamMode::Stopped)
    }

    /// Modes driven by a ramp+hold animation
    pub fn is_ramped(&self) -> bool {
        matches!(
            self,
            StreamMode::Baseline | StreamMode::TurningLeft | StreamMode::TurningRight
        )
    }
}

impl std::fmt::Display for StreamMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Owns the current mode and the ramp progress of the active animation
#[derive(Debug)]
pub struct ModeStateMachine {
    mode: StreamMode,
    ramp: Option<RampState>,
}

impl ModeStateMachine {
    pub fn new() -> Self {
        Self {
            mode: StreamMode::Idle,
            ramp: None,
        }
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    pub fn ramp_mut(&mut self) -> Option<&mut RampState> {
        self.ramp.as_mut()
    }

    /// True while heartbeat or a ramped animation is running
    pub fn is_streaming(&self) -> bool {
        self.mode.emits_frames()
    }

    /// Enter heartbeat streaming. Valid from any state; an in-flight ramp
    /// is discarded.
    pub fn start(&mut self) -> bool {
        let changed = self.mode != StreamMode::Heartbeat;
        self.mode = StreamMode::Heartbeat;
        self.ramp = None;
        changed
    }

    /// Begin a ramped animation toward `target`.
    ///
    /// Refused (returns false) when the engine is not streaming - turns
    /// require an active heartbeat to return to.
    pub fn begin(&mut self, target: StreamMode, ramp: RampState) -> bool {
        debug_assert!(target.is_ramped());
        if !self.is_streaming() {
            return false;
        }
        self.mode = target;
        self.ramp = Some(ramp);
        true
    }

    /// Terminal stop; only `start` re-enters heartbeat
    pub fn stop(&mut self) -> bool {
        let changed = self.mode != StreamMode::Stopped;
        self.mode = StreamMode::Stopped;
        self.ramp = None;
        changed
    }

    /// Ramp+hold exhausted: hand control back to heartbeat
    pub fn revert_to_heartbeat(&mut self) {
        self.mode = StreamMode::Heartbeat;
        self.ramp = None;
    }
}

impl Default for ModeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
