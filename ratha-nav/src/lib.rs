//! RathaNav - Autonomous driving controller for the Ratha simulator.
//!
//! Wraps the [`ratha_sim`] core in a cooperative, single-threaded
//! session: one periodic tick drives vehicle dynamics, sensor
//! recomputation, and the controllers (path follower and sequence
//! interpreter), in that order. Controllers therefore always act on
//! the previous tick's fully-resolved sensor state.

pub mod config;
pub mod error;
pub mod follower;
pub mod sequences;
pub mod session;

pub use config::RathaConfig;
pub use error::{RathaError, Result};
pub use follower::{FollowerConfig, PathFollower};
pub use session::{Session, TelemetrySink};
