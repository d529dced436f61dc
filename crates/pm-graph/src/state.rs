//! Time-varying kinematic state.
//!
//! Topology lives in [`MechanismGraph`] and is shared read-only. Everything
//! that changes from step to step is collected here in flat arenas indexed by
//! internal joint/link index, so a sweep can take its own copy with a plain
//! `clone()` and never alias another sweep's data.

use pm_core::geometry::{rotate, unit};
use pm_core::{JointId, LinkId, Vec2};

use crate::graph::MechanismGraph;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointState {
    pub position: Vec2,
    /// Position before the most recent position solve.
    pub last: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Travel along the slot since the initial configuration (sliding joints).
    pub slide: f64,
    pub slide_rate: f64,
    pub slide_acceleration: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkState {
    /// Absolute angle, tracked continuously.
    pub angle: f64,
    pub velocity: f64,
    pub acceleration: f64,
    /// Current position of the link's reference point.
    pub origin: Vec2,
    pub origin_velocity: Vec2,
    pub origin_acceleration: Vec2,
}

/// Complete kinematic state at one value of the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MechanismState {
    pub joints: Vec<JointState>,
    pub links: Vec<LinkState>,
    /// Input coordinate relative to the initial configuration: the input link
    /// rotation (rotary) or the slide travel (prismatic).
    pub input: f64,
    pub time: f64,
}

impl MechanismState {
    /// State of the mechanism as drawn, at rest.
    pub fn initial(graph: &MechanismGraph) -> Self {
        let joints = graph
            .joints()
            .iter()
            .map(|j| JointState {
                position: j.initial,
                last: j.initial,
                ..JointState::default()
            })
            .collect();
        let links = graph
            .links()
            .iter()
            .map(|l| LinkState {
                angle: l.angle_initial,
                origin: l.origin_initial,
                ..LinkState::default()
            })
            .collect();
        Self {
            joints,
            links,
            input: 0.0,
            time: 0.0,
        }
    }

    pub fn joint(&self, id: JointId) -> &JointState {
        &self.joints[id.ix()]
    }

    pub fn link(&self, id: LinkId) -> &LinkState {
        &self.links[id.ix()]
    }

    /// Rotation of `link` since the initial configuration.
    pub fn rotation(&self, graph: &MechanismGraph, link: LinkId) -> f64 {
        self.links[link.ix()].angle - graph.links()[link.ix()].angle_initial
    }

    /// Current position of a point given in the initial configuration,
    /// carried along rigidly with `link`.
    pub fn body_point(&self, graph: &MechanismGraph, link: LinkId, initial: &Vec2) -> Vec2 {
        let l = &graph.links()[link.ix()];
        let s = &self.links[link.ix()];
        s.origin + rotate(&(initial - l.origin_initial), s.angle - l.angle_initial)
    }

    /// Current slot line of a sliding joint: a point on it and its absolute
    /// direction angle.
    pub fn slot_line(&self, graph: &MechanismGraph, joint: JointId) -> Option<(Vec2, f64)> {
        let j = &graph.joints()[joint.ix()];
        let slot = j.slot_link()?;
        let point = self.body_point(graph, slot, &j.initial);
        Some((point, self.links[slot.ix()].angle + j.slide_offset))
    }

    /// Update slide travel of every sliding joint from current positions.
    pub fn update_slides(&mut self, graph: &MechanismGraph) {
        for j in graph.joints() {
            if let Some((point, dir)) = self.slot_line(graph, j.id) {
                let s = &mut self.joints[j.id.ix()];
                s.slide = (s.position - point).dot(&unit(dir));
            }
        }
    }

    /// Flattened joint rows `[x, y, vx, vy, ax, ay]`, in the given order.
    pub fn joint_rows(&self, order: &[JointId]) -> Vec<[f64; 6]> {
        order
            .iter()
            .map(|id| {
                let j = &self.joints[id.ix()];
                [
                    j.position.x,
                    j.position.y,
                    j.velocity.x,
                    j.velocity.y,
                    j.acceleration.x,
                    j.acceleration.y,
                ]
            })
            .collect()
    }

    /// Flattened link rows `[angle, angular velocity, angular acceleration]`.
    pub fn link_rows(&self, order: &[LinkId]) -> Vec<[f64; 3]> {
        order
            .iter()
            .map(|id| {
                let l = &self.links[id.ix()];
                [l.angle, l.velocity, l.acceleration]
            })
            .collect()
    }
}
