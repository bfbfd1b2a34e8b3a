//! Sequence program parsing.
//!
//! Three on-disk representations are supported: comma-separated lines
//! (`.csv`), whitespace-separated lines (`.ros`), and the JSON tree
//! the sequence editor saves (`.json`). Text formats additionally
//! accept inline `if .. then .. else ..` and `for N ..` lines.
//! Malformed lines are skipped, not fatal; a program parses as long
//! as the file itself is readable.

use serde::Deserialize;
use tracing::warn;

use super::{CompareOp, SequenceAction, SequenceStep};
use crate::error::{RathaError, Result};

/// On-disk program representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFormat {
    Csv,
    Ros,
    Json,
}

impl SequenceFormat {
    /// Derive the format from a file name; CSV is the fallback.
    pub fn from_file_name(name: &str) -> Self {
        if name.ends_with(".json") {
            Self::Json
        } else if name.ends_with(".ros") {
            Self::Ros
        } else {
            Self::Csv
        }
    }
}

/// Parse a program in the given format.
///
/// Text formats never fail; unusable lines are dropped with a warning.
/// JSON must at least be well-formed, but unusable steps inside it are
/// likewise dropped.
pub fn parse_program(text: &str, format: SequenceFormat) -> Result<Vec<SequenceStep>> {
    match format {
        SequenceFormat::Json => parse_json(text),
        SequenceFormat::Csv => Ok(parse_text(text, ',')),
        SequenceFormat::Ros => Ok(parse_text(text, ' ')),
    }
}

fn parse_text(text: &str, separator: char) -> Vec<SequenceStep> {
    let mut steps = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line, separator) {
            Some(step) => steps.push(step),
            None => warn!("skipping malformed sequence line: {:?}", line),
        }
    }
    steps
}

fn parse_line(line: &str, separator: char) -> Option<SequenceStep> {
    let lower = line.to_ascii_lowercase();

    // `if SENSOR OP VALUE then ACTION VALUE else ACTION VALUE`
    if lower.starts_with("if ") {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 10
            || !tokens[4].eq_ignore_ascii_case("then")
            || !tokens[7].eq_ignore_ascii_case("else")
        {
            return None;
        }
        let op = CompareOp::parse(tokens[2])?;
        let threshold = tokens[3].parse().ok()?;
        let then_step = action_step(tokens[5], tokens[6].parse().ok()?, 1)?;
        let else_step = action_step(tokens[8], tokens[9].parse().ok()?, 1)?;
        return Some(SequenceStep::Conditional {
            sensor: tokens[1].to_string(),
            op,
            threshold,
            then_branch: vec![then_step],
            else_branch: vec![else_step],
        });
    }

    // `for COUNT ACTION VALUE`
    if lower.starts_with("for ") {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 4 {
            return None;
        }
        let repeat: u32 = tokens[1].parse().ok()?;
        return action_step(tokens[2], tokens[3].parse().ok()?, repeat);
    }

    // Plain `ACTION,VALUE` / `ACTION VALUE`; a bare `stop` needs none.
    if separator == ' ' {
        plain_step(line.split_whitespace())
    } else {
        // Trim around the separator so "left, 30" also parses.
        plain_step(line.split(separator).map(str::trim))
    }
}

fn plain_step<'a>(mut parts: impl Iterator<Item = &'a str>) -> Option<SequenceStep> {
    let action = parts.next()?;
    let value = parts.next().map_or(Some(0.0), |v| v.parse().ok())?;
    action_step(action, value, 1)
}

fn action_step(name: &str, value: f32, repeat: u32) -> Option<SequenceStep> {
    Some(SequenceStep::Action {
        action: SequenceAction::parse(name)?,
        value,
        repeat: repeat.max(1),
    })
}

// --- JSON representation (the shape the sequence editor saves) ------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStep {
    If {
        #[serde(rename = "if")]
        cond: RawCond,
    },
    Loop {
        #[serde(rename = "loop")]
        body: RawLoop,
    },
    While {
        #[serde(rename = "while")]
        gate: RawWhile,
    },
    Call {
        call: String,
    },
    Action {
        action: String,
        #[serde(default)]
        duration: f32,
        #[serde(default)]
        repeat: Option<u32>,
    },
}

#[derive(Debug, Deserialize)]
struct RawCond {
    sensor: String,
    op: String,
    value: f32,
    #[serde(default)]
    then: Vec<RawStep>,
    #[serde(default, rename = "else")]
    otherwise: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawLoop {
    repeat: u32,
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawWhile {
    sensor: String,
    op: String,
    value: f32,
    steps: Vec<RawStep>,
}

fn parse_json(text: &str) -> Result<Vec<SequenceStep>> {
    let raw: Vec<RawStep> = serde_json::from_str(text)
        .map_err(|e| RathaError::Sequence(format!("invalid JSON program: {}", e)))?;
    Ok(convert_raw(raw))
}

fn convert_raw(raw: Vec<RawStep>) -> Vec<SequenceStep> {
    let mut steps = Vec::new();
    for step in raw {
        match step {
            RawStep::Action {
                action,
                duration,
                repeat,
            } => match SequenceAction::parse(&action) {
                Some(parsed) => steps.push(SequenceStep::Action {
                    action: parsed,
                    value: duration,
                    repeat: repeat.unwrap_or(1).max(1),
                }),
                None => warn!("skipping unknown action {:?}", action),
            },
            RawStep::If { cond } => match CompareOp::parse(&cond.op) {
                Some(op) => steps.push(SequenceStep::Conditional {
                    sensor: cond.sensor,
                    op,
                    threshold: cond.value,
                    then_branch: convert_raw(cond.then),
                    else_branch: convert_raw(cond.otherwise),
                }),
                None => warn!("skipping conditional with unknown op {:?}", cond.op),
            },
            RawStep::Loop { body } => steps.push(SequenceStep::Loop {
                count: body.repeat,
                body: convert_raw(body.steps),
            }),
            RawStep::While { gate } => match CompareOp::parse(&gate.op) {
                Some(op) => steps.push(SequenceStep::While {
                    sensor: gate.sensor,
                    op,
                    threshold: gate.value,
                    body: convert_raw(gate.steps),
                }),
                None => warn!("skipping while with unknown op {:?}", gate.op),
            },
            RawStep::Call { call } => steps.push(SequenceStep::Call { name: call }),
        }
    }
    steps
}
