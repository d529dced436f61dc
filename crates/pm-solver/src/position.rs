//! Position analysis.
//!
//! A new configuration is found by propagating knowledge outward from ground
//! and the input link. A link is *posed* once its rotation and translation
//! since the initial configuration are known; every joint fixed to it then
//! follows rigidly. The closed-form rules are, in order of preference:
//!
//! - angle transfer across `P` joints (no relative rotation) and gear pairs
//! - pose from one known fixed joint and a known angle
//! - pose from two known fixed joints
//! - slot tangency: one known pivot and a known pin riding in the link's slot
//! - locus intersection for a joint constrained by two partially known links
//!   (circle/circle, circle/line, line/line), taking the root nearest the
//!   Taylor-predicted position so the mechanism never jumps branches
//!
//! Whatever remains (non-dyadic loops) is closed by minimizing the sum of
//! rigid-length deviations through the [`Minimizer`] seam.

use nalgebra::DVector;
use tracing::debug;

use pm_core::constants::{EPSILON, EPSILON_SAME};
use pm_core::geometry::{Locus, angle, distance, nearest, rotate, unit, unwrap_near, wrap_angle};
use pm_core::{JointId, LinkId, Vec2};
use pm_graph::{InputKind, JointType, MechanismGraph, MechanismState};

use crate::error::{SolverError, SolverResult};
use crate::link_length::{LinkLengthFunction, LinkLengthObjective, PairEnd};
use crate::optimize::Minimizer;

/// Optimizer rounds allowed per solve before giving up.
const MAX_NON_DYADIC_ROUNDS: usize = 4;

/// A joint placed by the iterative stage may move at most this multiple of
/// the previous step's largest joint displacement.
const BRANCH_JUMP_FACTOR: f64 = 3.0;

/// Finds joint and link positions for a new input value.
pub struct PositionFinder<'a> {
    graph: &'a MechanismGraph,
    minimizer: &'a dyn Minimizer,
    position_error: f64,
    used_optimizer: bool,
}

impl<'a> PositionFinder<'a> {
    pub fn new(graph: &'a MechanismGraph, minimizer: &'a dyn Minimizer) -> Self {
        Self {
            graph,
            minimizer,
            position_error: 0.0,
            used_optimizer: false,
        }
    }

    pub fn graph(&self) -> &'a MechanismGraph {
        self.graph
    }

    /// Advance the input by `delta` over a time step `dt`.
    ///
    /// On success `state` holds the new positions, angles and slide travels
    /// (velocities and accelerations are left for the kinematic solvers), and
    /// each joint's `last` holds the position it had before the call.
    /// On failure `state` is untouched.
    pub fn solve(&mut self, state: &mut MechanismState, delta: f64, dt: f64) -> SolverResult<()> {
        let mut work = Work::new(self.graph, state, dt);
        work.next.input = state.input + delta;
        work.run(self.minimizer)?;
        let used_optimizer = work.optimizer_rounds > 0;
        let (next, error) = work.finish()?;
        self.position_error = error;
        self.used_optimizer = used_optimizer;
        *state = next;
        Ok(())
    }

    /// Deviation of the last solution from the Taylor-predicted one, plus
    /// the root of any remaining non-dyadic residual.
    pub fn position_error(&self) -> f64 {
        self.position_error
    }

    /// Did the last solve need the iterative stage?
    pub fn used_optimizer(&self) -> bool {
        self.used_optimizer
    }

    /// Classify the mechanism by re-solving `state` in place.
    pub fn is_dyadic(&mut self, state: &MechanismState) -> SolverResult<bool> {
        let mut trial = state.clone();
        self.solve(&mut trial, 0.0, 0.0)?;
        Ok(!self.used_optimizer)
    }
}

/// Scratch data for one solve.
struct Work<'g> {
    graph: &'g MechanismGraph,
    next: MechanismState,
    posed: Vec<bool>,
    angle: Vec<Option<f64>>,
    known: Vec<Option<Vec2>>,
    predicted: Vec<Vec2>,
    predicted_angle: Vec<f64>,
    tolerance: f64,
    residual: f64,
    optimizer_rounds: usize,
}

fn taylor(x: f64, v: f64, a: f64, dt: f64) -> f64 {
    let p = x + v * dt + 0.5 * a * dt * dt;
    if p.is_finite() { p } else { x }
}

impl<'g> Work<'g> {
    fn new(graph: &'g MechanismGraph, prev: &MechanismState, dt: f64) -> Self {
        let predicted = prev
            .joints
            .iter()
            .map(|j| {
                Vec2::new(
                    taylor(j.position.x, j.velocity.x, j.acceleration.x, dt),
                    taylor(j.position.y, j.velocity.y, j.acceleration.y, dt),
                )
            })
            .collect();
        let predicted_angle = prev
            .links
            .iter()
            .map(|l| taylor(l.angle, l.velocity, l.acceleration, dt))
            .collect();
        let n_links = graph.links().len();
        Self {
            graph,
            next: prev.clone(),
            posed: vec![false; n_links],
            angle: vec![None; n_links],
            known: vec![None; graph.joints().len()],
            predicted,
            predicted_angle,
            tolerance: 1e-6 * graph.average_link_length(),
            residual: 0.0,
            optimizer_rounds: 0,
        }
    }

    fn initial_angle(&self, link: LinkId) -> f64 {
        self.graph.links()[link.ix()].angle_initial
    }

    fn rotation(&self, link: LinkId) -> Option<f64> {
        self.angle[link.ix()].map(|a| a - self.initial_angle(link))
    }

    fn run(&mut self, minimizer: &dyn Minimizer) -> SolverResult<()> {
        let g = self.graph;
        let ground = g.ground();
        let origin = self.next.links[ground.ix()].origin;
        let ground_angle = self.next.links[ground.ix()].angle;
        self.pose(ground, ground_angle, origin)?;
        self.drive_input()?;

        loop {
            let mut progress = self.transfer_angles();
            progress |= self.pose_links()?;
            if !progress {
                progress = self.intersect_loci()?;
            }
            if progress {
                continue;
            }
            if self.posed.iter().all(|&p| p) {
                return Ok(());
            }
            if self.optimizer_rounds >= MAX_NON_DYADIC_ROUNDS || !self.close_non_dyadic(minimizer)? {
                let names: Vec<&str> = g
                    .links()
                    .iter()
                    .filter(|l| !self.posed[l.id.ix()])
                    .map(|l| l.name.as_str())
                    .collect();
                return Err(SolverError::Unresolved {
                    what: format!("links {} could not be placed", names.join(", ")),
                });
            }
        }
    }

    fn drive_input(&mut self) -> SolverResult<()> {
        let g = self.graph;
        let link = g.input_link();
        let joint = g.input_joint();
        let q = self.next.input;
        let theta0 = self.initial_angle(link);
        match g.input_kind() {
            InputKind::Rotary => {
                let pivot = self.known[joint.ix()].ok_or(SolverError::Unresolved {
                    what: "input pivot is not on ground".into(),
                })?;
                self.pose_from_point(link, joint, pivot, theta0 + q)
            }
            InputKind::Prismatic { slot_on_ground } => {
                let j = &g.joints()[joint.ix()];
                let dir = unit(j.slide_angle_initial);
                if slot_on_ground {
                    self.pose_from_point(link, joint, j.initial + dir * q, theta0)
                } else {
                    let origin = g.links()[link.ix()].origin_initial - dir * q;
                    self.pose(link, theta0, origin)
                }
            }
        }
    }

    fn mark_known(&mut self, joint: JointId, p: Vec2) -> SolverResult<()> {
        match self.known[joint.ix()] {
            Some(q) => {
                let error = distance(&p, &q);
                if error > self.tolerance {
                    return Err(SolverError::LengthViolated { joint, error });
                }
            }
            None => self.known[joint.ix()] = Some(p),
        }
        Ok(())
    }

    /// Fix the pose of `link` and place every joint it carries.
    fn pose(&mut self, link: LinkId, theta: f64, origin: Vec2) -> SolverResult<()> {
        let g = self.graph;
        let l = &mut self.next.links[link.ix()];
        l.angle = theta;
        l.origin = origin;
        self.posed[link.ix()] = true;
        self.angle[link.ix()] = Some(theta);

        for j in g.fixed_joints(link).collect::<Vec<_>>() {
            let p = self.next.body_point(g, link, &g.joints()[j.ix()].initial);
            self.mark_known(j, p)?;
        }
        for gear in g.gears().iter().filter(|gear| gear.carrier == link) {
            let p = self.next.body_point(g, link, &g.joints()[gear.joint.ix()].initial);
            self.mark_known(gear.joint, p)?;
        }
        Ok(())
    }

    /// Pose `link` so that `joint` sits at `p` with absolute angle `theta`.
    fn pose_from_point(&mut self, link: LinkId, joint: JointId, p: Vec2, theta: f64) -> SolverResult<()> {
        let l = &self.graph.links()[link.ix()];
        let initial = self.graph.joints()[joint.ix()].initial;
        let origin = p - rotate(&(initial - l.origin_initial), theta - l.angle_initial);
        self.pose(link, theta, origin)
    }

    fn set_angle(&mut self, link: LinkId, rotation: f64) {
        self.angle[link.ix()] = Some(self.initial_angle(link) + rotation);
    }

    /// Rotations carried across `P` joints and gear meshes.
    fn transfer_angles(&mut self) -> bool {
        let g = self.graph;
        let mut progress = false;
        for j in g.joints().iter().filter(|j| j.joint_type == JointType::P) {
            let Some(l2) = j.link2 else { continue };
            match (self.rotation(j.link1), self.rotation(l2)) {
                (Some(r), None) => {
                    self.set_angle(l2, r);
                    progress = true;
                }
                (None, Some(r)) => {
                    self.set_angle(j.link1, r);
                    progress = true;
                }
                _ => {}
            }
        }
        for gear in g.gears() {
            let r1 = self.rotation(gear.gear1);
            let r2 = self.rotation(gear.gear2);
            let rc = self.rotation(gear.carrier);
            match (r1, r2, rc) {
                (Some(r1), None, Some(rc)) => {
                    self.set_angle(gear.gear2, gear.second_from_first(r1, rc));
                    progress = true;
                }
                (None, Some(r2), Some(rc)) => {
                    self.set_angle(gear.gear1, gear.first_from_second(r2, rc));
                    progress = true;
                }
                (Some(r1), Some(r2), None) => {
                    if let Some(rc) = gear.carrier_from_gears(r1, r2) {
                        self.set_angle(gear.carrier, rc);
                        progress = true;
                    }
                }
                _ => {}
            }
        }
        progress
    }

    fn known_fixed(&self, link: LinkId) -> Vec<(JointId, Vec2)> {
        self.graph
            .fixed_joints(link)
            .filter_map(|j| self.known[j.ix()].map(|p| (j, p)))
            .collect()
    }

    fn pose_links(&mut self) -> SolverResult<bool> {
        let g = self.graph;
        let mut progress = false;
        for link in g.links() {
            let id = link.id;
            if self.posed[id.ix()] {
                continue;
            }
            let kp = self.known_fixed(id);
            if let Some(theta) = self.angle[id.ix()] {
                if let Some(&(j, p)) = kp.first() {
                    self.pose_from_point(id, j, p, theta)?;
                    progress = true;
                }
                continue;
            }

            if kp.len() >= 2 {
                if let Some(((a, pa), (b, pb))) = widest_pair(g, &kp) {
                    let a0 = g.joints()[a.ix()].initial;
                    let b0 = g.joints()[b.ix()].initial;
                    let error = (distance(&pa, &pb) - distance(&a0, &b0)).abs();
                    if error > self.tolerance + 10.0 * self.residual.sqrt() {
                        return Err(SolverError::LengthViolated { joint: b, error });
                    }
                    let theta = link.angle_initial + angle(&pa, &pb) - angle(&a0, &b0);
                    let theta = unwrap_near(theta, self.predicted_angle[id.ix()]);
                    self.pose_from_point(id, a, pa, theta)?;
                    progress = true;
                    continue;
                }
            }

            if kp.len() == 1 {
                if let Some(theta) = self.slot_tangency(id, kp[0])? {
                    self.pose_from_point(id, kp[0].0, kp[0].1, theta)?;
                    progress = true;
                }
            }
        }
        Ok(progress)
    }

    /// Angle of a link with one known pivot `k` whose slot must pass through
    /// an already placed sliding joint.
    fn slot_tangency(&self, link: LinkId, (k, pk): (JointId, Vec2)) -> SolverResult<Option<f64>> {
        let g = self.graph;
        let l = &g.links()[link.ix()];
        for j in g.sliding_joints(link) {
            let Some(pj) = self.known[j.ix()] else { continue };
            let Some(d0) = l.distance_to_slide(k, j) else { continue };
            let w = pk - pj;
            let r = w.norm();
            if r < EPSILON_SAME * (1.0 + g.average_link_length()) {
                continue;
            }
            let ratio = d0 / r;
            if ratio.abs() > 1.0 + EPSILON {
                return Err(SolverError::SlotOutOfReach {
                    joint: j,
                    offset: d0,
                    reach: r,
                });
            }
            let beta = ratio.clamp(-1.0, 1.0).asin();
            let alpha = w.y.atan2(w.x);
            let offset = g.joints()[j.ix()].slide_offset;
            let want = self.predicted_angle[link.ix()] + offset;
            let phi = [alpha - beta, alpha - std::f64::consts::PI + beta]
                .into_iter()
                .min_by(|a, b| wrap_angle(a - want).abs().total_cmp(&wrap_angle(b - want).abs()))
                .unwrap_or(alpha - beta);
            debug!(link = %l.name, joint = %j, "slot tangency");
            return Ok(Some(unwrap_near(phi - offset, self.predicted_angle[link.ix()])));
        }
        Ok(None)
    }

    /// Loci that currently constrain `joint`.
    fn loci_for(&self, joint: JointId) -> Vec<Locus> {
        let g = self.graph;
        let jj = &g.joints()[joint.ix()];
        let mut loci = Vec::new();

        for link in std::iter::once(jj.link1).chain(jj.link2) {
            if self.posed[link.ix()] || !jj.fixed_with_respect_to(link) {
                continue;
            }
            match self.rotation(link) {
                None => {
                    let pivot = self.known_fixed(link).into_iter().find(|&(p, _)| p != joint);
                    if let Some((p, pp)) = pivot {
                        let radius = distance(&jj.initial, &g.joints()[p.ix()].initial);
                        loci.push(Locus::Circle { center: pp, radius });
                    }
                }
                Some(rot) => {
                    if let Some(line) = self.translated_slot(link, joint, rot) {
                        loci.push(line);
                    }
                }
            }
        }

        if let Some(slot) = jj.slot_link() {
            if self.posed[slot.ix()] {
                if let Some((point, dir)) = self.next.slot_line(g, joint) {
                    loci.push(Locus::line(point, dir));
                }
            }
        }
        loci
    }

    /// A link with known rotation but unknown position, tied to a line by a
    /// sliding joint, confines its other joints to parallel lines.
    fn translated_slot(&self, link: LinkId, joint: JointId, rot: f64) -> Option<Locus> {
        let g = self.graph;
        let k0 = g.joints()[joint.ix()].initial;
        for other in g.links()[link.ix()].joints.iter().copied() {
            if other == joint {
                continue;
            }
            let j = &g.joints()[other.ix()];
            if !j.joint_type.is_sliding() {
                continue;
            }
            let offset = rotate(&(k0 - j.initial), rot);
            // block on this link, slot already placed
            if j.link1 == link {
                if let Some(slot) = j.link2 {
                    if self.posed[slot.ix()] {
                        let (point, dir) = self.next.slot_line(g, other)?;
                        return Some(Locus::line(point + offset, dir));
                    }
                }
            }
            // slot on this link, pin already placed
            if j.link2 == Some(link) {
                if let Some(pj) = self.known[other.ix()] {
                    let dir = self.angle[link.ix()]? + j.slide_offset;
                    return Some(Locus::line(pj + offset, dir));
                }
            }
        }
        None
    }

    fn intersect_loci(&mut self) -> SolverResult<bool> {
        let g = self.graph;
        for jj in g.joints() {
            let id = jj.id;
            if self.known[id.ix()].is_some() || jj.joint_type == JointType::G {
                continue;
            }
            let loci = self.loci_for(id);
            if loci.len() < 2 {
                continue;
            }
            let candidates = loci[0].intersect(&loci[1]);
            let Some(p) = nearest(&candidates, &self.predicted[id.ix()]) else {
                return Err(SolverError::NoIntersection { joint: id });
            };
            debug!(joint = %id, roots = candidates.len(), "placed by locus intersection");
            self.known[id.ix()] = Some(p);
            return Ok(true);
        }
        Ok(false)
    }

    /// Place the joints of unposed links by minimizing rigid-length error.
    fn close_non_dyadic(&mut self, minimizer: &dyn Minimizer) -> SolverResult<bool> {
        let g = self.graph;
        let mut unknown: Vec<JointId> = Vec::new();
        for link in g.links().iter().filter(|l| !self.posed[l.id.ix()]) {
            for j in g.fixed_joints(link.id) {
                if self.known[j.ix()].is_none() && !unknown.contains(&j) {
                    unknown.push(j);
                }
            }
        }
        if unknown.is_empty() {
            return Ok(false);
        }

        let end = |j: JointId, known: &[Option<Vec2>]| match known[j.ix()] {
            Some(p) => PairEnd::Known(p),
            None => PairEnd::Variable(unknown.iter().position(|&u| u == j).unwrap_or(0)),
        };
        let mut objective = LinkLengthObjective::new(unknown.len());
        for link in g.links().iter().filter(|l| !self.posed[l.id.ix()]) {
            let fixed: Vec<JointId> = g.fixed_joints(link.id).collect();
            for (ia, &a) in fixed.iter().enumerate() {
                for &b in &fixed[ia + 1..] {
                    if self.known[a.ix()].is_some() && self.known[b.ix()].is_some() {
                        continue;
                    }
                    let Some(length) = link.length_between(a, b) else { continue };
                    if length <= EPSILON_SAME {
                        continue;
                    }
                    objective.push(LinkLengthFunction::new(
                        end(a, &self.known),
                        end(b, &self.known),
                        length,
                    ));
                }
            }
        }
        if objective.terms.is_empty() {
            return Ok(false);
        }

        let mut x0 = DVector::zeros(2 * unknown.len());
        for (i, j) in unknown.iter().enumerate() {
            x0[2 * i] = self.predicted[j.ix()].x;
            x0[2 * i + 1] = self.predicted[j.ix()].y;
        }
        let result = minimizer.minimize(&objective, x0);
        self.optimizer_rounds += 1;

        let avg = g.average_link_length();
        if !(result.value <= EPSILON * avg * avg) {
            return Err(SolverError::NonDyadic {
                residual: result.value,
                iterations: result.iterations,
            });
        }
        debug!(
            joints = unknown.len(),
            terms = objective.terms.len(),
            iterations = result.iterations,
            residual = result.value,
            "closed non-dyadic loop"
        );
        for (i, j) in unknown.iter().enumerate() {
            self.known[j.ix()] = Some(Vec2::new(result.x[2 * i], result.x[2 * i + 1]));
        }
        self.residual += result.value;
        Ok(true)
    }

    fn finish(mut self) -> SolverResult<(MechanismState, f64)> {
        let g = self.graph;
        if let Some(link) = g.links().iter().find(|l| !self.posed[l.id.ix()]) {
            return Err(SolverError::Unresolved {
                what: format!("link {} was not placed", link.name),
            });
        }

        let ground = g.ground();
        let mut sum = 0.0;
        let mut moving = 0usize;
        let mut displacements = Vec::new();
        let mut history = 0.0_f64;
        let mut expected = 0.0_f64;
        for jj in g.joints() {
            let p = self.known[jj.id.ix()].ok_or(SolverError::Unresolved {
                what: format!("joint {} was not placed", jj.input_index),
            })?;
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(SolverError::NonFinite { what: "joint position" });
            }
            let predicted = self.predicted[jj.id.ix()];
            let js = &mut self.next.joints[jj.id.ix()];
            let before = js.position;
            if !jj.fixed_with_respect_to(ground) {
                history = history.max((before - js.last).norm());
                expected = expected.max((predicted - before).norm());
                displacements.push((jj.id, (p - before).norm()));
                sum += (p - predicted).norm_squared();
                moving += 1;
            }
            js.last = before;
            js.position = p;
        }
        if self.optimizer_rounds > 0 {
            self.check_branch(&displacements, history, expected)?;
        }
        self.next.update_slides(g);

        let rms = if moving > 0 { (sum / moving as f64).sqrt() } else { 0.0 };
        Ok((self.next, rms + self.residual.sqrt()))
    }

    /// Refuse an iterative solution that left the assembly branch.
    ///
    /// Displacements are measured against the largest joint displacement of
    /// the previous step, or against the Taylor-predicted one before any
    /// step has been taken. Without either there is nothing to compare.
    fn check_branch(&self, displacements: &[(JointId, f64)], history: f64, expected: f64) -> SolverResult<()> {
        let scale = if history > self.tolerance { history } else { expected };
        if scale <= self.tolerance {
            return Ok(());
        }
        let limit = BRANCH_JUMP_FACTOR * scale + self.tolerance;
        match displacements.iter().find(|(_, d)| *d > limit) {
            Some(&(joint, distance)) => {
                debug!(joint = %joint, distance, limit, "iterative solution left the branch");
                Err(SolverError::BranchJump { joint, distance, limit })
            }
            None => Ok(()),
        }
    }
}

/// The two known joints farthest apart in the initial configuration.
fn widest_pair(graph: &MechanismGraph, kp: &[(JointId, Vec2)]) -> Option<((JointId, Vec2), (JointId, Vec2))> {
    let mut best = None;
    let mut best_d = EPSILON_SAME;
    for (i, a) in kp.iter().enumerate() {
        for b in &kp[i + 1..] {
            let d = distance(&graph.joints()[a.0.ix()].initial, &graph.joints()[b.0.ix()].initial);
            if d > best_d {
                best_d = d;
                best = Some((*a, *b));
            }
        }
    }
    best
}
