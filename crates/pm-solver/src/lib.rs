//! Kinematic solvers for planar mechanisms.
//!
//! Given a [`pm_graph::MechanismGraph`] and a current [`pm_graph::MechanismState`]:
//! - [`PositionFinder`] advances the input and closes every loop
//! - [`VelocitySolver`] / [`AccelerationSolver`] solve the linear kinematic
//!   systems for the new configuration
//! - [`numerical`] estimates derivatives by finite differences when the
//!   analytic systems are singular

pub mod acceleration;
pub mod error;
pub mod kinematics;
pub mod link_length;
pub mod numerical;
pub mod optimize;
pub mod position;
pub mod velocity;

pub use acceleration::AccelerationSolver;
pub use error::{SolverError, SolverResult};
pub use kinematics::{KinematicSystem, Level, Limits, instant_center};
pub use link_length::{LinkLengthFunction, LinkLengthObjective, PairEnd};
pub use numerical::{DifferenceScheme, Fill};
pub use optimize::{MinimizeResult, Minimizer, NewtonConfig, NewtonMinimizer, ObjectiveFunction};
pub use position::PositionFinder;
pub use velocity::VelocitySolver;
