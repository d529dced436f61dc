//! Error types for simulation setup.
//!
//! Numerical trouble during a sweep is never an error here: it ends that
//! sweep and is reported through the simulator's status lines.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("No stepping mode: set a delta angle, a fixed time step or a maximum smoothing error")]
    NoStepMode,

    #[error(transparent)]
    Core(#[from] pm_core::PmError),

    #[error("Mechanism cannot be simulated: {0}")]
    Graph(#[from] pm_graph::GraphError),

    #[error("Initial configuration cannot be solved: {0}")]
    Solver(#[from] pm_solver::SolverError),

    #[error("Sweep threads could not be started: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Result storage failed: {0}")]
    Results(#[from] pm_results::ResultsError),
}

pub type SimResult<T> = Result<T, SimError>;
