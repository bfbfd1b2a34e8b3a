//! Tick-driven execution of sequence programs.
//!
//! The interpreter walks the step tree depth-first with an explicit
//! frame stack, yielding back to the scheduler at every timed wait so
//! simulation ticks and sensor refresh continue during a running
//! program. Timed actions emit their command, hold for the scaled
//! duration, then emit `Stop`; discrete turns emit the command itself
//! once per repetition without modeling time.
//!
//! `while` iterations and `call` nesting are bounded; a program that
//! exceeds either aborts with an error instead of hanging.

use ratha_sim::sensors::SensorArray;
use ratha_sim::vehicle::DriveCommand;
use tracing::{debug, info, warn};

use super::{CompareOp, SequenceAction, SequenceLibrary, SequenceStep};
use crate::error::{RathaError, Result};

/// Interpreter tuning.
#[derive(Clone, Debug)]
pub struct InterpreterConfig {
    /// Iteration bound per `while` step.
    pub max_while_iterations: u32,
    /// Nesting bound for `call` steps.
    pub max_call_depth: u32,
    /// Ticks per second of program time, for duration scaling.
    pub tick_hz: u32,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_while_iterations: 10_000,
            max_call_depth: 8,
            tick_hz: 60,
        }
    }
}

/// Why a frame was pushed; drives the behavior when its cursor runs
/// off the end of the step list.
#[derive(Debug)]
enum FrameKind {
    /// Plain block: pop when done.
    Block,
    /// Counted loop: rewind `remaining` more times.
    Loop { remaining: u32 },
    /// Sensor-gated loop: re-evaluate before every iteration.
    While {
        sensor: String,
        op: CompareOp,
        threshold: f32,
        iterations: u32,
    },
    /// Called program: pop releases one level of call depth.
    Call,
}

#[derive(Debug)]
struct Frame {
    steps: Vec<SequenceStep>,
    index: usize,
    kind: FrameKind,
}

/// In-flight timed action.
#[derive(Debug)]
struct PendingAction {
    action: SequenceAction,
    value: f32,
    remaining: u32,
    stage: Stage,
}

#[derive(Debug)]
enum Stage {
    /// Emit the command this tick.
    Issue,
    /// Hold for the remaining ticks, then emit `Stop`.
    Hold(u32),
}

/// Executes one sequence program cooperatively, one tick at a time.
pub struct SequenceInterpreter {
    config: InterpreterConfig,
    frames: Vec<Frame>,
    pending: Option<PendingAction>,
    call_depth: u32,
    program: Option<String>,
    running: bool,
}

impl SequenceInterpreter {
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            config,
            frames: Vec::new(),
            pending: None,
            call_depth: 0,
            program: None,
            running: false,
        }
    }

    /// Begin executing a named program. A request while a program is
    /// running is rejected; an unknown name is a warned no-op.
    pub fn start(&mut self, name: &str, library: &SequenceLibrary) {
        if self.running {
            warn!("run_sequence: {:?} requested while a program is active", name);
            return;
        }
        let Some(steps) = library.get(name) else {
            warn!("run_sequence: no program named {:?}", name);
            return;
        };
        info!("running sequence {:?} ({} steps)", name, steps.len());
        self.frames = vec![Frame {
            steps: steps.clone(),
            index: 0,
            kind: FrameKind::Block,
        }];
        self.pending = None;
        self.call_depth = 0;
        self.program = Some(name.to_string());
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Abandon the current program.
    pub fn abort(&mut self) {
        self.frames.clear();
        self.pending = None;
        self.running = false;
    }

    /// Advance one tick; returns the command to issue, if any.
    ///
    /// An exceeded safety bound aborts the program and returns the
    /// error; the caller decides how loudly to report it.
    pub fn tick(
        &mut self,
        sensors: &SensorArray,
        library: &SequenceLibrary,
    ) -> Result<Option<DriveCommand>> {
        if !self.running {
            return Ok(None);
        }

        if self.pending.is_some() {
            return Ok(self.service_pending());
        }

        loop {
            let Some(frame) = self.frames.last_mut() else {
                let name = self.program.take();
                debug!("sequence {:?} complete", name);
                self.running = false;
                return Ok(None);
            };

            if frame.index >= frame.steps.len() {
                match &mut frame.kind {
                    FrameKind::Block => {
                        self.frames.pop();
                    }
                    FrameKind::Loop { remaining } => {
                        if *remaining > 0 {
                            *remaining -= 1;
                            frame.index = 0;
                        } else {
                            self.frames.pop();
                        }
                    }
                    FrameKind::While {
                        sensor,
                        op,
                        threshold,
                        iterations,
                    } => {
                        if *iterations >= self.config.max_while_iterations {
                            let err = RathaError::Sequence(format!(
                                "while loop exceeded {} iterations in {:?}",
                                self.config.max_while_iterations,
                                self.program.as_deref().unwrap_or("?")
                            ));
                            self.abort();
                            return Err(err);
                        }
                        if op.evaluate(sensor_value(sensors, sensor), *threshold) {
                            *iterations += 1;
                            frame.index = 0;
                        } else {
                            self.frames.pop();
                        }
                    }
                    FrameKind::Call => {
                        self.call_depth = self.call_depth.saturating_sub(1);
                        self.frames.pop();
                    }
                }
                continue;
            }

            let step = frame.steps[frame.index].clone();
            frame.index += 1;

            match step {
                SequenceStep::Action {
                    action,
                    value,
                    repeat,
                } => {
                    self.pending = Some(PendingAction {
                        action,
                        value,
                        remaining: repeat,
                        stage: Stage::Issue,
                    });
                    return Ok(self.service_pending());
                }
                SequenceStep::Conditional {
                    sensor,
                    op,
                    threshold,
                    then_branch,
                    else_branch,
                } => {
                    let reading = sensor_value(sensors, &sensor);
                    let taken = op.evaluate(reading, threshold);
                    debug!(
                        "condition {} ({:.1}) {:?} {} -> {}",
                        sensor, reading, op, threshold, taken
                    );
                    let branch = if taken { then_branch } else { else_branch };
                    self.frames.push(Frame {
                        steps: branch,
                        index: 0,
                        kind: FrameKind::Block,
                    });
                }
                SequenceStep::Loop { count, body } => {
                    if count > 0 && !body.is_empty() {
                        self.frames.push(Frame {
                            steps: body,
                            index: 0,
                            kind: FrameKind::Loop {
                                remaining: count - 1,
                            },
                        });
                    }
                }
                SequenceStep::While {
                    sensor,
                    op,
                    threshold,
                    body,
                } => {
                    if op.evaluate(sensor_value(sensors, &sensor), threshold) {
                        self.frames.push(Frame {
                            steps: body,
                            index: 0,
                            kind: FrameKind::While {
                                sensor,
                                op,
                                threshold,
                                iterations: 1,
                            },
                        });
                    }
                }
                SequenceStep::Call { name } => {
                    if self.call_depth >= self.config.max_call_depth {
                        let err = RathaError::Sequence(format!(
                            "call depth exceeded {} at {:?}",
                            self.config.max_call_depth, name
                        ));
                        self.abort();
                        return Err(err);
                    }
                    match library.get(&name) {
                        Some(steps) => {
                            self.call_depth += 1;
                            self.frames.push(Frame {
                                steps: steps.clone(),
                                index: 0,
                                kind: FrameKind::Call,
                            });
                        }
                        None => warn!("call: no program named {:?}, skipping", name),
                    }
                }
            }
        }
    }

    /// Drive the in-flight action one tick forward.
    fn service_pending(&mut self) -> Option<DriveCommand> {
        let pending = self.pending.as_mut()?;

        match pending.stage {
            Stage::Issue => {
                let command = pending.action.to_command(pending.value);
                if pending.action.is_turn() {
                    // Turns repeat the bare command, one per tick.
                    pending.remaining = pending.remaining.saturating_sub(1);
                    if pending.remaining == 0 {
                        self.pending = None;
                    }
                } else {
                    let hold =
                        (pending.value * self.config.tick_hz as f32).round().max(0.0) as u32;
                    pending.stage = Stage::Hold(hold);
                }
                Some(command)
            }
            Stage::Hold(ref mut ticks) => {
                if *ticks > 0 {
                    *ticks -= 1;
                    return None;
                }
                // Duration elapsed: brake, then the next repetition.
                pending.remaining = pending.remaining.saturating_sub(1);
                if pending.remaining == 0 {
                    self.pending = None;
                } else {
                    pending.stage = Stage::Issue;
                }
                Some(DriveCommand::Stop)
            }
        }
    }
}

/// Resolve a sensor name to its live reading; aliases follow the
/// recorded programs (`red` is the front cone, `back` the rear one).
/// Unknown names read as unobstructed.
fn sensor_value(sensors: &SensorArray, name: &str) -> f32 {
    let lower = name.to_ascii_lowercase();
    let resolved = match lower.as_str() {
        "red" => "front",
        "back" => "rear",
        other => other,
    };
    sensors.distance(resolved)
}
