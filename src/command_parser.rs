//! Natural-language command parsing
//!
//! Free text goes in, a typed [`Intent`] comes out. Matching walks a
//! fixed priority list of pattern categories - exact tokens, then pose
//! phrases, then the turn family, then the catch-all - so behavior does
//! not depend on incidental table ordering. Parsing never fails: input
//! that matches nothing becomes [`Intent::Unknown`].

use lazy_static::lazy_static;
use regex::Regex;

use crate::intents::{Direction, Intent, Scope};

pub const DEFAULT_ANGLE_DEG: f32 = 15.0;
pub const DEFAULT_SPEED_DEG_S: f32 = 90.0;

pub const ANGLE_LIMITS_DEG: (f32, f32) = (0.0, 180.0);
pub const SPEED_LIMITS_DEG_S: (f32, f32) = (1.0, 360.0);
pub const DURATION_LIMITS_S: (f32, f32) = (0.0, 10.0);

/// Pattern categories in match priority order; earlier wins
pub const CATEGORY_ORDER: [&str; 4] = ["exact", "pose", "turn", "unknown"];

lazy_static! {
    static ref POSE_RE: Regex = Regex::new(
        r"\b(sit\s+down|sitting\s+position|assume\s+seated|go\s+to\s+sitting|sit)\b"
    )
    .unwrap();
    // Left is checked before right; 'counterclockwise' cannot leak into the
    // right table because \b rejects the embedded 'clockwise'
    static ref LEFT_RE: Regex = Regex::new(r"\b(counterclockwise|ccw|left)\b").unwrap();
    static ref RIGHT_RE: Regex = Regex::new(r"\b(clockwise|cw|right)\b").unwrap();
    static ref HEAD_RE: Regex = Regex::new(r"\b(head|look)\b").unwrap();
    static ref SPEED_RE: Regex =
        Regex::new(r"\bat\s+(-?\d+(?:\.\d+)?)\s*deg(?:rees)?\s*/\s*s(?:ec)?\b").unwrap();
    static ref ANGLE_RE: Regex = Regex::new(r"(-?\d+(?:\.\d+)?)\s*(?:degrees?\b|deg\b)").unwrap();
    static ref DURATION_RE: Regex =
        Regex::new(r"\bfor\s+(-?\d+(?:\.\d+)?)\s*s(?:ec(?:ond)?s?)?\b").unwrap();
    static ref A_LITTLE_RE: Regex = Regex::new(r"\ba\s+little\b").unwrap();
    static ref A_LOT_RE: Regex = Regex::new(r"\ba\s+lot\b").unwrap();
    static ref SLOWLY_RE: Regex = Regex::new(r"\bslowly\b").unwrap();
    static ref QUICKLY_RE: Regex = Regex::new(r"\bquickly\b").unwrap();
}

fn clamp(value: f32, limits: (f32, f32)) -> f32 {
    value.clamp(limits.0, limits.1)
}

/// Regex/synonym-table parser for steering commands
#[derive(Debug, Default)]
pub struct NlpParser;

impl NlpParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse one line of operator input into an intent
    pub fn parse(&self, text: &str) -> Intent {
        let folded = text.trim().to_lowercase();
        if folded.is_empty() {
            return Intent::Unknown {
                original_text: text.to_string(),
                reason: "Empty input".to_string(),
            };
        }

        // Category 1: exact tokens
        match folded.as_str() {
            "help" | ":help" => return Intent::Help,
            "quit" | ":quit" | "exit" => return Intent::Quit,
            "dry run" | ":dry-run" | "dryrun" => return Intent::DryRun,
            _ => {}
        }

        // Category 2: pose phrases
        if POSE_RE.is_match(&folded) {
            return Intent::Pose {
                name: "sitting".to_string(),
                blend_s: 0.35,
            };
        }

        // Category 3: turn family, keyed on a resolvable direction token
        let direction = if LEFT_RE.is_match(&folded) {
            Direction::Left
        } else if RIGHT_RE.is_match(&folded) {
            Direction::Right
        } else {
            return Intent::Unknown {
                original_text: text.to_string(),
                reason: "No matching pattern".to_string(),
            };
        };

        let scope = if HEAD_RE.is_match(&folded) {
            Scope::Head
        } else {
            Scope::Body
        };

        // Extract the speed first and blank its span, so the angle regex
        // cannot mistake '120 deg/s' for '120 degrees'
        let mut working = folded.clone();
        let mut speed: Option<f32> = None;
        if let Some(caps) = SPEED_RE.captures(&working) {
            let span = caps.get(0).unwrap().range();
            speed = caps[1].parse().ok();
            let blank = " ".repeat(span.len());
            working.replace_range(span, &blank);
        }

        let mut angle: Option<f32> = ANGLE_RE
            .captures(&working)
            .and_then(|c| c[1].parse().ok());
        let duration: Option<f32> = DURATION_RE
            .captures(&working)
            .and_then(|c| c[1].parse().ok());

        // Qualitative modifiers only seed values no explicit number set
        if angle.is_none() {
            if A_LITTLE_RE.is_match(&working) {
                angle = Some(5.0);
            } else if A_LOT_RE.is_match(&working) {
                angle = Some(60.0);
            }
        }
        if speed.is_none() {
            if SLOWLY_RE.is_match(&working) {
                speed = Some(30.0);
            } else if QUICKLY_RE.is_match(&working) {
                speed = Some(270.0);
            }
        }

        Intent::Turn {
            scope,
            direction,
            angle_deg: clamp(angle.unwrap_or(DEFAULT_ANGLE_DEG), ANGLE_LIMITS_DEG),
            speed_deg_s: clamp(speed.unwrap_or(DEFAULT_SPEED_DEG_S), SPEED_LIMITS_DEG_S),
            duration_s: duration.map(|d| clamp(d, DURATION_LIMITS_S)),
        }
    }

    /// Example phrases shown by help output
    pub fn get_help_examples(&self) -> Vec<&'static str> {
        vec![
            "turn left",
            "turn right 30 degrees",
            "turn counterclockwise",
            "look left a little",
            "turn head right for 0.5s",
            "rotate body 90 degrees left at 120 deg/s for 0.5s",
            "turn right slowly",
            "sit down",
            "help",
            "quit",
        ]
    }
}
