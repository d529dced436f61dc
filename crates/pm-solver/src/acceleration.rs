//! Analytic acceleration analysis.

use pm_graph::{MechanismGraph, MechanismState};

use crate::error::SolverResult;
use crate::kinematics::{KinematicSystem, Level, Limits, check_limits};

/// Solves accelerations from positions and already-solved velocities.
pub struct AccelerationSolver<'a> {
    system: KinematicSystem<'a>,
    graph: &'a MechanismGraph,
}

impl<'a> AccelerationSolver<'a> {
    pub fn new(graph: &'a MechanismGraph) -> Self {
        Self {
            system: KinematicSystem::new(graph),
            graph,
        }
    }

    /// Fill the acceleration fields of `state`. The input itself does not
    /// accelerate.
    pub fn solve(&self, state: &mut MechanismState, speed: f64) -> SolverResult<()> {
        let sol = self.system.solve(state, Level::Acceleration, speed)?;
        let limits = Limits::new(self.graph, speed);
        check_limits(
            &sol,
            limits.joint_acceleration,
            limits.link_acceleration,
            ("joint acceleration", "angular acceleration"),
        )?;
        for (j, a) in state.joints.iter_mut().zip(&sol.joints) {
            j.acceleration = *a;
        }
        for (j, s) in state.joints.iter_mut().zip(&sol.slide_rates) {
            j.slide_acceleration = *s;
        }
        for ((l, o), w) in state
            .links
            .iter_mut()
            .zip(&sol.link_origins)
            .zip(&sol.link_rates)
        {
            l.origin_acceleration = *o;
            l.acceleration = *w;
        }
        Ok(())
    }
}
