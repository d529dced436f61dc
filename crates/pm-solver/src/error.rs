//! Error types for solver operations.

use pm_core::JointId;
use pm_graph::GraphError;
use thiserror::Error;

/// Reasons a configuration, velocity or acceleration could not be found.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("No position satisfies the constraints on joint {joint}")]
    NoIntersection { joint: JointId },

    #[error("Slot cannot reach joint {joint} (offset {offset:.6} exceeds reach {reach:.6})")]
    SlotOutOfReach {
        joint: JointId,
        offset: f64,
        reach: f64,
    },

    #[error("Rigid length violated at joint {joint} by {error:.3e}")]
    LengthViolated { joint: JointId, error: f64 },

    #[error("Non-dyadic loop did not close: residual {residual:.3e} after {iterations} iterations")]
    NonDyadic { residual: f64, iterations: usize },

    #[error("Joint {joint} moved {distance:.6} in one step (limit {limit:.6}); the assembly branch was lost")]
    BranchJump {
        joint: JointId,
        distance: f64,
        limit: f64,
    },

    #[error("Configuration left unresolved: {what}")]
    Unresolved { what: String },

    #[error("Kinematic system is singular: {what}")]
    Singular { what: &'static str },

    #[error("Non-finite value in {what}")]
    NonFinite { what: &'static str },

    #[error("{what} exceeds the plausible limit ({value:.3e} > {limit:.3e})")]
    LimitExceeded {
        what: &'static str,
        value: f64,
        limit: f64,
    },
}

pub type SolverResult<T> = Result<T, SolverError>;
