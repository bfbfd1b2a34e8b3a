//! Recorded maneuver programs.
//!
//! A sequence program is a tree of steps: timed actions, sensor
//! conditionals, counted loops, sensor-gated while loops and calls to
//! other named programs. Programs are parsed once ([`parser`]) and
//! executed cooperatively by the tick-driven [`interpreter`].

pub mod interpreter;
pub mod parser;

use std::collections::HashMap;
use std::path::Path;

use ratha_sim::vehicle::DriveCommand;
use tracing::{info, warn};

pub use interpreter::{InterpreterConfig, SequenceInterpreter};
pub use parser::{parse_program, SequenceFormat};

/// Drive action named by a program step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceAction {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
    Straight,
}

impl SequenceAction {
    /// Parse an action name; `up`/`down` are accepted aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "forward" | "up" => Some(Self::Forward),
            "backward" | "down" => Some(Self::Backward),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "stop" => Some(Self::Stop),
            "straight" => Some(Self::Straight),
            _ => None,
        }
    }

    /// Is this a discrete turn whose value is a steering angle?
    pub fn is_turn(&self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// Build the drive command for this action. For turns, `value` is
    /// the steering angle in degrees; zero means a plain ramped turn.
    pub fn to_command(self, value: f32) -> DriveCommand {
        let angle = (value != 0.0).then_some(value);
        match self {
            Self::Forward => DriveCommand::Forward,
            Self::Backward => DriveCommand::Backward,
            Self::Left => DriveCommand::Left(angle),
            Self::Right => DriveCommand::Right(angle),
            Self::Stop => DriveCommand::Stop,
            Self::Straight => DriveCommand::Straight,
        }
    }
}

/// Comparison operator in conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            _ => None,
        }
    }

    pub fn evaluate(self, value: f32, threshold: f32) -> bool {
        match self {
            Self::Lt => value < threshold,
            Self::Le => value <= threshold,
            Self::Gt => value > threshold,
            Self::Ge => value >= threshold,
            Self::Eq => value == threshold,
            Self::Ne => value != threshold,
        }
    }
}

/// One node of a sequence program tree. The tree is immutable once
/// loaded; the interpreter only keeps a cursor over it.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceStep {
    /// Send a command; for turns the value is an angle in degrees,
    /// otherwise a duration in seconds followed by a stop.
    Action {
        action: SequenceAction,
        value: f32,
        repeat: u32,
    },
    /// Branch on a live sensor reading.
    Conditional {
        sensor: String,
        op: CompareOp,
        threshold: f32,
        then_branch: Vec<SequenceStep>,
        else_branch: Vec<SequenceStep>,
    },
    /// Execute the body a fixed number of times.
    Loop { count: u32, body: Vec<SequenceStep> },
    /// Re-evaluate the condition before every iteration.
    While {
        sensor: String,
        op: CompareOp,
        threshold: f32,
        body: Vec<SequenceStep>,
    },
    /// Execute another named program.
    Call { name: String },
}

/// Named program store backing `Call` steps and external run requests.
#[derive(Debug, Default)]
pub struct SequenceLibrary {
    programs: HashMap<String, Vec<SequenceStep>>,
}

impl SequenceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parsed program under a name.
    pub fn insert(&mut self, name: impl Into<String>, steps: Vec<SequenceStep>) {
        self.programs.insert(name.into(), steps);
    }

    /// Look up a program by name.
    pub fn get(&self, name: &str) -> Option<&Vec<SequenceStep>> {
        self.programs.get(name)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Load every program file in a directory. Files that fail to read
    /// or parse are skipped with a warning; programs are keyed by file
    /// name.
    pub fn load_dir(&mut self, dir: &Path) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let format = SequenceFormat::from_file_name(name);
            match std::fs::read_to_string(&path) {
                Ok(text) => match parse_program(&text, format) {
                    Ok(steps) if !steps.is_empty() => {
                        info!("loaded sequence {:?} ({} steps)", name, steps.len());
                        self.insert(name.to_string(), steps);
                    }
                    Ok(_) => warn!("sequence {:?} contained no usable steps", name),
                    Err(e) => warn!("skipping sequence {:?}: {}", name, e),
                },
                Err(e) => warn!("skipping sequence {:?}: {}", name, e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_aliases() {
        assert_eq!(SequenceAction::parse("up"), Some(SequenceAction::Forward));
        assert_eq!(SequenceAction::parse("FORWARD"), Some(SequenceAction::Forward));
        assert_eq!(SequenceAction::parse("wiggle"), None);
    }

    #[test]
    fn test_turn_command_carries_angle() {
        assert_eq!(
            SequenceAction::Left.to_command(30.0),
            DriveCommand::Left(Some(30.0))
        );
        assert_eq!(SequenceAction::Left.to_command(0.0), DriveCommand::Left(None));
    }

    #[test]
    fn test_compare_ops() {
        assert!(CompareOp::Lt.evaluate(10.0, 30.0));
        assert!(!CompareOp::Lt.evaluate(50.0, 30.0));
        assert!(CompareOp::Ge.evaluate(30.0, 30.0));
        assert!(CompareOp::Ne.evaluate(1.0, 2.0));
    }

    #[test]
    fn test_library_lookup() {
        let mut lib = SequenceLibrary::new();
        lib.insert(
            "spin",
            vec![SequenceStep::Action {
                action: SequenceAction::Left,
                value: 30.0,
                repeat: 2,
            }],
        );
        assert!(lib.get("spin").is_some());
        assert!(lib.get("missing").is_none());
    }
}
