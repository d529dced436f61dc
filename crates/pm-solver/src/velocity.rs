//! Analytic velocity analysis.

use pm_graph::{MechanismGraph, MechanismState};

use crate::error::SolverResult;
use crate::kinematics::{KinematicSystem, Level, Limits, check_limits};

/// Solves joint velocities, link angular velocities and slide rates for the
/// current positions.
pub struct VelocitySolver<'a> {
    system: KinematicSystem<'a>,
    graph: &'a MechanismGraph,
}

impl<'a> VelocitySolver<'a> {
    pub fn new(graph: &'a MechanismGraph) -> Self {
        Self {
            system: KinematicSystem::new(graph),
            graph,
        }
    }

    /// Fill the velocity fields of `state` for input rate `speed`.
    ///
    /// Fails without touching `state` when the system is singular or the
    /// result is implausibly large (near a dead centre).
    pub fn solve(&self, state: &mut MechanismState, speed: f64) -> SolverResult<()> {
        let sol = self.system.solve(state, Level::Velocity, speed)?;
        let limits = Limits::new(self.graph, speed);
        check_limits(
            &sol,
            limits.joint_velocity,
            limits.link_velocity,
            ("joint velocity", "angular velocity"),
        )?;
        for (j, v) in state.joints.iter_mut().zip(&sol.joints) {
            j.velocity = *v;
        }
        for (j, s) in state.joints.iter_mut().zip(&sol.slide_rates) {
            j.slide_rate = *s;
        }
        for ((l, o), w) in state
            .links
            .iter_mut()
            .zip(&sol.link_origins)
            .zip(&sol.link_rates)
        {
            l.origin_velocity = *o;
            l.velocity = *w;
        }
        Ok(())
    }
}
