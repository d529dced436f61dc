//! Time-zero state: positions as given, derivatives solved or estimated.

use pm_core::constants::SMALL_PERTURBATION_FRACTION;
use pm_graph::{MechanismGraph, MechanismState};
use pm_solver::{AccelerationSolver, Fill, PositionFinder, VelocitySolver, numerical};
use tracing::debug;

use crate::options::StepPlan;

/// Velocities and accelerations for the initial configuration.
///
/// Analytic first. A singular velocity system falls back to central (or
/// one-sided) differences around time zero; a singular acceleration system
/// alone is bridged by solving velocities a small step ahead and
/// differencing them. Anything that cannot be recovered is left as NaN and
/// described in `notes`.
pub(crate) fn bootstrap(
    graph: &MechanismGraph,
    finder: &mut PositionFinder<'_>,
    plan: &StepPlan,
    notes: &mut Vec<String>,
) -> MechanismState {
    let mut state = MechanismState::initial(graph);
    let speed = plan.speed;
    let velocity = VelocitySolver::new(graph);
    let acceleration = AccelerationSolver::new(graph);
    let epsilon = SMALL_PERTURBATION_FRACTION * plan.nominal_delta();

    if let Err(e) = velocity.solve(&mut state, speed) {
        notes.push(format!(
            "instant centres could not be found at t = 0 ({e}); using finite differences"
        ));
        if numerical::estimate(finder, &mut state, speed, epsilon, Fill::BOTH).is_none() {
            notes.push("velocity and acceleration are undefined at t = 0".to_string());
        }
        return state;
    }

    if let Err(e) = acceleration.solve(&mut state, speed) {
        notes.push(format!(
            "analytic acceleration could not be found at t = 0 ({e}); differencing velocities"
        ));
        let h = (epsilon / speed).abs();
        let ahead = numerical::perturbed(finder, &state, speed, h)
            .and_then(|mut a| velocity.solve(&mut a, speed).ok().map(|()| a));
        match ahead {
            Some(ahead) => {
                debug!(h, "forward-differenced initial acceleration");
                numerical::difference_velocities(&mut state, &ahead, h);
            }
            None => {
                if numerical::estimate(finder, &mut state, speed, epsilon, Fill::ACCELERATION).is_none() {
                    notes.push("acceleration is undefined at t = 0".to_string());
                }
            }
        }
    }
    state
}
