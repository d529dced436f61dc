//! One integration sweep away from time zero.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use pm_core::constants::{
    CONSERVATIVE_ERROR_ESTIMATION, EPSILON, ERROR_SIZE_INCREASE, MAX_ITERS_IN_POSITION_ERROR,
    SMALL_PERTURBATION_FRACTION,
};
use pm_graph::{MechanismGraph, MechanismState};
use pm_results::{InputRange, JointParameters, LinkParameters, ResultsResult};
use pm_solver::{
    AccelerationSolver, Fill, Minimizer, PositionFinder, SolverError, SolverResult, VelocitySolver,
    numerical,
};
use tracing::{debug, info, warn};

use crate::options::{StepPlan, Stepping};

/// State shared by the two sweeps. Locked once per accepted sample.
#[derive(Debug)]
pub(crate) struct SharedRun {
    pub joints: JointParameters,
    pub links: LinkParameters,
    pub range: InputRange,
    pub status: Vec<String>,
}

impl SharedRun {
    pub fn new(range: InputRange) -> Self {
        Self {
            joints: JointParameters::new(),
            links: LinkParameters::new(),
            range,
            status: Vec::new(),
        }
    }

    pub fn note(&mut self, line: String) {
        warn!("{line}");
        self.status.push(line);
    }

    fn record(
        &mut self,
        direction: Direction,
        graph: &MechanismGraph,
        state: &MechanismState,
    ) -> ResultsResult<()> {
        let joints = state.joint_rows(graph.joints_in_input_order());
        let links = state.link_rows(graph.links_in_input_order());
        match direction {
            Direction::Forward => {
                self.joints.add_snapshot_near_end(state.time, joints)?;
                self.links.add_snapshot_near_end(state.time, links)
            }
            Direction::Backward => {
                self.joints.add_snapshot_near_begin(state.time, joints)?;
                self.links.add_snapshot_near_begin(state.time, links)
            }
        }
    }
}

pub(crate) fn lock(shared: &Mutex<SharedRun>) -> MutexGuard<'_, SharedRun> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// Why a sweep stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SweepEnd {
    CycleComplete,
    PositionFailed,
    StepCap,
}

pub(crate) struct Sweep<'a> {
    direction: Direction,
    graph: &'a MechanismGraph,
    finder: PositionFinder<'a>,
    velocity: VelocitySolver<'a>,
    acceleration: AccelerationSolver<'a>,
    plan: StepPlan,
    /// Current adaptive step size (input units).
    size: f64,
    shared: &'a Mutex<SharedRun>,
}

impl<'a> Sweep<'a> {
    pub fn new(
        direction: Direction,
        graph: &'a MechanismGraph,
        minimizer: &'a dyn Minimizer,
        plan: StepPlan,
        shared: &'a Mutex<SharedRun>,
    ) -> Self {
        let size = plan.nominal_delta();
        Self {
            direction,
            graph,
            finder: PositionFinder::new(graph, minimizer),
            velocity: VelocitySolver::new(graph),
            acceleration: AccelerationSolver::new(graph),
            plan,
            size,
            shared,
        }
    }

    /// Step until the shared input range covers the cycle, the position
    /// solve fails, or the step cap is hit.
    pub fn run(mut self, mut state: MechanismState) -> SweepEnd {
        info!(direction = %self.direction, "sweep started");
        let mut steps = 0usize;
        let travel = self.plan.travel * (1.0 - EPSILON);
        let end = loop {
            if steps >= self.plan.max_steps {
                lock(self.shared).note(format!(
                    "{} sweep stopped after {steps} steps before completing the cycle",
                    self.direction
                ));
                break SweepEnd::StepCap;
            }
            let delta = match self.advance(&mut state, steps) {
                Ok(delta) => delta,
                Err(e) => {
                    lock(self.shared).note(format!(
                        "{} sweep stopped at t = {:.6}: {e}",
                        self.direction, state.time
                    ));
                    break SweepEnd::PositionFailed;
                }
            };
            let notes = self.derivatives(&mut state, delta);
            steps += 1;

            let mut shared = lock(self.shared);
            for line in notes {
                shared.note(line);
            }
            if let Err(e) = shared.record(self.direction, self.graph, &state) {
                shared.note(format!("{} sweep could not record t = {:.6}: {e}", self.direction, state.time));
                break SweepEnd::PositionFailed;
            }
            shared.range.include(self.plan.base + state.input);
            if shared.range.covers(travel) {
                break SweepEnd::CycleComplete;
            }
        };
        info!(direction = %self.direction, steps, t = state.time, ?end, "sweep finished");
        end
    }

    /// Move the input one step; returns the size of the input change.
    fn advance(&mut self, state: &mut MechanismState, steps: usize) -> SolverResult<f64> {
        let sign = self.direction.sign();
        let speed = self.plan.speed;
        match self.plan.stepping {
            Stepping::Fixed { dt } => {
                let dt = sign * dt;
                self.finder.solve(state, speed * dt, dt)?;
                state.time = dt * (steps + 1) as f64;
                Ok((speed * dt).abs())
            }
            Stepping::Adaptive {
                bound,
                initial,
                minimum,
            } => self.adaptive_step(state, bound, initial, minimum),
        }
    }

    /// Grow the step after a success, shrink it geometrically after a
    /// rejection, within a bounded number of attempts.
    fn adaptive_step(
        &mut self,
        state: &mut MechanismState,
        bound: f64,
        initial: f64,
        minimum: f64,
    ) -> SolverResult<f64> {
        let sign = self.direction.sign();
        let speed = self.plan.speed;
        let mut size = self.size;
        let mut failure = None;
        for attempt in 0..MAX_ITERS_IN_POSITION_ERROR {
            let dt = sign * size / speed.abs();
            let mut trial = state.clone();
            match self.finder.solve(&mut trial, speed * dt, dt) {
                Ok(()) => {
                    let error = self.finder.position_error();
                    if error <= bound || size <= minimum {
                        trial.time = state.time + dt;
                        *state = trial;
                        self.size = (size * ERROR_SIZE_INCREASE).min(initial);
                        debug!(attempt, size, error, "step accepted");
                        return Ok(size);
                    }
                    debug!(attempt, size, error, bound, "step rejected");
                    failure = Some(SolverError::LimitExceeded {
                        what: "position error",
                        value: error,
                        limit: bound,
                    });
                }
                Err(e) => {
                    debug!(attempt, size, error = %e, "step failed");
                    failure = Some(e);
                }
            }
            if size <= minimum {
                break;
            }
            size = (size * CONSERVATIVE_ERROR_ESTIMATION * 0.5).max(minimum);
        }
        self.size = size;
        Err(failure.unwrap_or(SolverError::Unresolved {
            what: "no step size closed the mechanism".to_string(),
        }))
    }

    /// Velocities then accelerations, each falling back to finite
    /// differences. Returns status lines for anything that needed help.
    fn derivatives(&mut self, state: &mut MechanismState, delta: f64) -> Vec<String> {
        let mut notes = Vec::new();
        let speed = self.plan.speed;
        let t = state.time;
        let epsilon = SMALL_PERTURBATION_FRACTION * delta;

        if let Err(e) = self.velocity.solve(state, speed) {
            notes.push(format!("instant centres could not be found at t = {t:.6} ({e})"));
            if numerical::estimate(&mut self.finder, state, speed, epsilon, Fill::VELOCITY).is_none() {
                notes.push(format!("velocity is undefined at t = {t:.6}"));
            }
        }
        if let Err(e) = self.acceleration.solve(state, speed) {
            notes.push(format!("analytic acceleration could not be found at t = {t:.6} ({e})"));
            if numerical::estimate(&mut self.finder, state, speed, epsilon, Fill::ACCELERATION).is_none() {
                notes.push(format!("acceleration is undefined at t = {t:.6}"));
            }
        }
        notes
    }
}
