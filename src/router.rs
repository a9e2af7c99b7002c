//! Intent routing
//!
//! Maps a resolved intent to a protocol address plus argument tuple and
//! hands it to the transport. All failure is reported through the
//! `(success, message)` return contract - nothing escapes this boundary.

use std::collections::HashMap;

use crate::intents::{Intent, Scope};
use crate::osc_transport::Transport;

pub const BODY_TURN_ADDRESS: &str = "/cmd/turn";
pub const HEAD_TURN_ADDRESS: &str = "/cmd/head_turn";
pub const POSE_ADDRESS: &str = "/cmd/pose";

/// Routes intents to OSC command addresses
pub struct IntentRouter<T: Transport> {
    transport: T,
    address_map: HashMap<Scope, String>,
    dry_run: bool,
}

impl<T: Transport> IntentRouter<T> {
    pub fn new(transport: T) -> Self {
        let mut address_map = HashMap::new();
        address_map.insert(Scope::Body, BODY_TURN_ADDRESS.to_string());
        address_map.insert(Scope::Head, HEAD_TURN_ADDRESS.to_string());
        Self::with_addresses(transport, address_map)
    }

    /// Construct with a custom scope->address table
    pub fn with_addresses(transport: T, address_map: HashMap<Scope, String>) -> Self {
        Self {
            transport,
            address_map,
            dry_run: false,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Dispatch one intent. Never panics, never returns `Err` - the bool
    /// says whether the command took effect.
    pub fn route(&mut self, intent: &Intent) -> (bool, String) {
        match intent {
            Intent::Turn {
                scope,
                direction,
                angle_deg,
                speed_deg_s,
                duration_s,
            } => {
                let address = match self.address_map.get(scope) {
                    Some(address) => address.clone(),
                    None => {
                        return (false, format!("No OSC address for scope '{}'", scope));
                    }
                };
                let duration_part = match duration_s {
                    Some(d) => format!(" for {:.1}s", d),
                    None => String::new(),
                };
                let summary = format!(
                    "{} {} {:.1}° at {:.1}°/s{}",
                    scope, direction, angle_deg, speed_deg_s, duration_part
                );
                self.dispatch(&address, intent, summary)
            }
            Intent::Pose { name, blend_s } => {
                let summary = format!("pose '{}' with {:.2}s blend", name, blend_s);
                self.dispatch(POSE_ADDRESS, intent, summary)
            }
            Intent::Unknown {
                original_text,
                reason,
            } => (
                false,
                format!(
                    "Unknown command: '{}' ({}). Type 'help' for examples.",
                    original_text, reason
                ),
            ),
            Intent::Help => (
                true,
                "Available commands: turn left | turn right 30 degrees | \
                 look left a little | sit down | dry run | help | quit"
                    .to_string(),
            ),
            Intent::Quit => (true, "Goodbye!".to_string()),
            Intent::DryRun => {
                self.dry_run = !self.dry_run;
                let state = if self.dry_run { "on" } else { "off" };
                (true, format!("Dry run mode toggled {}", state))
            }
        }
    }

    fn dispatch(&self, address: &str, intent: &Intent, summary: String) -> (bool, String) {
        if self.dry_run {
            return (true, format!("[dry run] {}: {}", address, summary));
        }
        match self.transport.send(address, intent.to_wire_args()) {
            Ok(()) => (true, format!("Sent {}: {}", address, summary)),
            Err(e) => (false, format!("Failed to send {}: {}", address, e)),
        }
    }

    /// Static documentation of the command addresses and argument shapes
    pub fn get_osc_schema(&self) -> String {
        format!(
            "OSC command schema:\n\
             \x20 {}       Arguments: direction:str angle:float speed:float duration:float (NaN = no duration)\n\
             \x20 {}  Arguments: direction:str angle:float speed:float duration:float (NaN = no duration)\n\
             \x20 {}       Arguments: name:str blend:float\n\
             Streaming addresses:\n\
             \x20 /bone/{{bone}}/{{axis}}  per-channel motion value in degrees (axis: pitch|roll|yaw)\n\
             \x20 /mh/frame            current frame index (int)\n\
             \x20 /mh/mode             current mode name (string)",
            BODY_TURN_ADDRESS, HEAD_TURN_ADDRESS, POSE_ADDRESS
        )
    }
}
