//! Full-cycle kinematic simulation of single-degree-of-freedom linkages.
//!
//! Provides:
//! - `Simulator`: configure, bootstrap the time-zero state, then sweep the
//!   input forward and backward in parallel until a full cycle is covered
//! - `SimOptions` / `StepMode`: fixed angle or time steps, or steps sized
//!   adaptively to bound the geometric error
//! - time-ordered joint and link results with a human-readable status log

pub mod error;
pub mod options;
pub mod simulator;

mod bootstrap;
mod sweep;

pub use error::{SimError, SimResult};
pub use options::{Directions, SimOptions, StepMode};
pub use simulator::{Phase, Simulator};
