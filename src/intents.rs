//! Typed command intents
//!
//! The parser turns free text into one of these closed variants; the
//! router matches on them exhaustively. Duration is optional at this
//! level - only the wire encoding picks a NaN placeholder, because the
//! protocol's argument arity is fixed.

use rosc::OscType;

/// Body region a turn targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Body,
    Head,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Body => f.write_str("body"),
            Scope::Head => f.write_str("head"),
        }
    }
}

/// Turn direction after synonym resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Left => f.write_str("left"),
            Direction::Right => f.write_str("right"),
        }
    }
}

/// A parsed, validated operator command
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Turn the body or head by an angle at a speed, optionally time-boxed
    Turn {
        scope: Scope,
        direction: Direction,
        angle_deg: f32,
        speed_deg_s: f32,
        duration_s: Option<f32>,
    },
    /// Blend into a named pose
    Pose { name: String, blend_s: f32 },
    /// Input that matched no pattern; reported, never thrown
    Unknown { original_text: String, reason: String },
    Help,
    Quit,
    /// Toggle suppression of actual transport sends
    DryRun,
}

impl Intent {
    /// Positional OSC arguments for this intent.
    ///
    /// Turn arity is fixed at four: a missing duration is encoded as NaN
    /// so receivers can rely on the argument count.
    pub fn to_wire_args(&self) -> Vec<OscType> {
        match self {
            Intent::Turn {
                direction,
                angle_deg,
                speed_deg_s,
                duration_s,
                ..
            } => vec![
                OscType::String(direction.to_string()),
                OscType::Float(*angle_deg),
                OscType::Float(*speed_deg_s),
                OscType::Float(duration_s.unwrap_or(f32::NAN)),
            ],
            Intent::Pose { name, blend_s } => vec![
                OscType::String(name.clone()),
                OscType::Float(*blend_s),
            ],
            Intent::Unknown { .. } | Intent::Help | Intent::Quit | Intent::DryRun => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_wire_args_with_duration() {
        let intent = Intent::Turn {
            scope: Scope::Body,
            direction: Direction::Left,
            angle_deg: 30.0,
            speed_deg_s: 90.0,
            duration_s: Some(1.5),
        };
        let args = intent.to_wire_args();
        assert_eq!(args.len(), 4);
        assert_eq!(args[0], OscType::String("left".to_string()));
        assert_eq!(args[1], OscType::Float(30.0));
        assert_eq!(args[2], OscType::Float(90.0));
        assert_eq!(args[3], OscType::Float(1.5));
    }

    #[test]
    fn test_turn_wire_args_nan_placeholder() {
        let intent = Intent::Turn {
            scope: Scope::Head,
            direction: Direction::Right,
            angle_deg: 15.0,
            speed_deg_s: 60.0,
            duration_s: None,
        };
        let args = intent.to_wire_args();
        assert_eq!(args.len(), 4, "arity is fixed even without a duration");
        match args[3] {
            OscType::Float(v) => assert!(v.is_nan()),
            _ => panic!("expected float placeholder"),
        }
    }

    #[test]
    fn test_pose_wire_args() {
        let intent = Intent::Pose {
            name: "sitting".to_string(),
            blend_s: 0.35,
        };
        let args = intent.to_wire_args();
        assert_eq!(args[0], OscType::String("sitting".to_string()));
        assert_eq!(args[1], OscType::Float(0.35));
    }

    #[test]
    fn test_control_intents_have_no_args() {
        assert!(Intent::Help.to_wire_args().is_empty());
        assert!(Intent::Quit.to_wire_args().is_empty());
        assert!(Intent::DryRun.to_wire_args().is_empty());
        assert!(Intent::Unknown {
            original_text: "x".to_string(),
            reason: "y".to_string()
        }
        .to_wire_args()
        .is_empty());
    }
}
