//! # Marionette - NL-steerable OSC motion streaming
//!
//! Marionette streams real-time motion-control values to a remote
//! character rig over OSC/UDP and lets an operator steer the motion with
//! discrete commands or free-text natural language.
//!
//! ## Core Features
//!
//! - **Fixed-rate frame streaming**: a background scheduler emits one
//!   motion frame per tick, self-throttled to the configured FPS
//! - **Mode state machine**: heartbeat, turn and baseline modes with
//!   eased ramp+hold animations that auto-revert to heartbeat
//! - **Channel transform pipeline**: per-feature denormalization plus
//!   per-channel scale/offset/clamp into wire-ready degrees
//! - **Natural-language commands**: regex/synonym parsing of phrases
//!   like `turn left`, `look right a little`, `rotate body 90 degrees
//!   left at 120 deg/s for 0.5s`
//! - **Intent routing**: typed intents dispatched as fixed-arity OSC
//!   command messages, with a dry-run mode for rehearsal
//! - **Connection monitoring**: staleness flag over the fire-and-forget
//!   UDP stream
//!
//! ## Quick Start
//!
//! ### Parsing operator text
//!
//! ```rust
//! use marionette::command_parser::NlpParser;
//! use marionette::intents::{Direction, Intent, Scope};
//!
//! let parser = NlpParser::new();
//! match parser.parse("turn right 30 degrees") {
//!     Intent::Turn { scope, direction, angle_deg, .. } => {
//!         assert_eq!(scope, Scope::Body);
//!         assert_eq!(direction, Direction::Right);
//!         assert_eq!(angle_deg, 30.0);
//!     }
//!     other => panic!("unexpected intent: {:?}", other),
//! }
//! ```
//!
//! ### Streaming to a rig
//!
//! ```rust,no_run
//! use marionette::config::{ChannelConfig, StreamSettings};
//! use marionette::osc_transport::OscTransport;
//! use marionette::scheduler::{FrameScheduler, SchedulerConfig, StreamCommand};
//! use marionette::sequence::NeutralProvider;
//! use marionette::transform::{Denormalizer, TransformTable};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ChannelConfig::load(Path::new("channels.json"))?;
//! let settings = StreamSettings::from_meta(&config.meta);
//! settings.validate()?;
//!
//! let columns: Vec<String> = config
//!     .channels
//!     .iter()
//!     .map(|c| c.source_column.clone())
//!     .collect();
//! let table = TransformTable::new(config.channels, &columns);
//! let transport = OscTransport::new(&settings.host, settings.port)?;
//!
//! let scheduler = FrameScheduler::spawn(
//!     table,
//!     Denormalizer::identity(columns.len()),
//!     Box::new(NeutralProvider::new(columns.len())),
//!     Box::new(transport),
//!     SchedulerConfig::from_settings(&settings),
//! )?;
//!
//! scheduler.send_command(StreamCommand::Start)?;
//! scheduler.send_command(StreamCommand::TurnLeft)?;
//! // ... later
//! scheduler.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Text or button command -> [`command_parser`] -> [`intents`] ->
//! [`router`] (direct protocol commands) or the scheduler's command
//! queue (streaming mode changes) -> [`scheduler`] loop ->
//! [`transform`] -> [`osc_transport`] -> rig. The scheduler worker is
//! the sole writer of mode, ramp and stats state; everything else
//! enqueues immutable commands and reads published snapshots.
//!
//! ### Main Modules
//!
//! - [`scheduler`] - fixed-rate frame loop and command queue (start here!)
//! - [`modes`] - streaming mode state machine
//! - [`ramp`] - cubic ease-in-out envelopes and ramp/hold progress
//! - [`transform`] - channel table and denormalizer
//! - [`command_parser`] - free text to typed intents
//! - [`router`] - intents to OSC command messages
//! - [`sequence`] - motion frame providers (neutral, mock, recorded)

pub mod command_parser;
pub mod config;
pub mod error;
pub mod intents;
pub mod modes;
pub mod monitor;
pub mod osc_transport;
pub mod ramp;
pub mod repl;
pub mod router;
pub mod scheduler;
pub mod sequence;
pub mod stats;
pub mod transform;
