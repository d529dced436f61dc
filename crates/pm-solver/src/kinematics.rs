//! Linear velocity-level constraint system.
//!
//! Every link contributes a reference-point velocity and an angular velocity;
//! every joint its velocity; every sliding joint its slide rate. Each joint
//! states that it moves with every link it is fixed to,
//!
//! ```text
//! v_J = v_L + w_L k x (J - o_L)
//! ```
//!
//! sliding joints add the slide rate along their slot, `P` joints lock
//! relative rotation, gear meshes tie their angular velocities through the
//! pitch radii, ground is at rest, and one row fixes the input rate. For a
//! single-degree-of-freedom mechanism the system is square. Each link's
//! velocity field vanishes at its instant centre, which is recovered from the
//! solution.
//!
//! Differentiating once more gives the same coefficient matrix with
//! centripetal (`-w^2 r`) and Coriolis (`2 s' w k x u`) terms on the
//! right-hand side.

use nalgebra::{DMatrix, DVector};

use pm_core::constants::{
    JOINT_ACCELERATION_LIMIT_FACTOR, JOINT_VELOCITY_LIMIT_FACTOR, LINK_ACCELERATION_LIMIT_FACTOR,
    LINK_VELOCITY_LIMIT_FACTOR,
};
use pm_core::geometry::{perp, unit};
use pm_core::{JointId, LinkId, Vec2};
use pm_graph::{InputKind, JointType, MechanismGraph, MechanismState};

use crate::error::{SolverError, SolverResult};

/// Which derivative the right-hand side is built for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Level {
    Velocity,
    Acceleration,
}

/// Solution of the kinematic system, in unknown order.
#[derive(Debug, Clone)]
pub struct KinematicSolution {
    pub joints: Vec<Vec2>,
    pub link_origins: Vec<Vec2>,
    pub link_rates: Vec<f64>,
    /// Per joint; zero for joints that do not slide.
    pub slide_rates: Vec<f64>,
}

/// Plausibility bounds, scaled by the input speed and mechanism size.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub joint_velocity: f64,
    pub link_velocity: f64,
    pub joint_acceleration: f64,
    pub link_acceleration: f64,
}

impl Limits {
    pub fn new(graph: &MechanismGraph, speed: f64) -> Self {
        let s = speed.abs();
        let l = graph.average_link_length();
        match graph.input_kind() {
            InputKind::Rotary => Self {
                joint_velocity: JOINT_VELOCITY_LIMIT_FACTOR * s * l,
                link_velocity: LINK_VELOCITY_LIMIT_FACTOR * s,
                joint_acceleration: JOINT_ACCELERATION_LIMIT_FACTOR * s * s * l,
                link_acceleration: LINK_ACCELERATION_LIMIT_FACTOR * s * s,
            },
            InputKind::Prismatic { .. } => Self {
                joint_velocity: JOINT_VELOCITY_LIMIT_FACTOR * s,
                link_velocity: LINK_VELOCITY_LIMIT_FACTOR * s / l,
                joint_acceleration: JOINT_ACCELERATION_LIMIT_FACTOR * s * s / l,
                link_acceleration: LINK_ACCELERATION_LIMIT_FACTOR * s * s / (l * l),
            },
        }
    }
}

/// Column layout and assembly of the kinematic system.
#[derive(Debug, Clone)]
pub struct KinematicSystem<'a> {
    graph: &'a MechanismGraph,
    slider_column: Vec<Option<usize>>,
    unknowns: usize,
}

/// One sparse row: coefficients and right-hand side.
struct Row {
    terms: Vec<(usize, f64)>,
    rhs: f64,
}

impl<'a> KinematicSystem<'a> {
    pub fn new(graph: &'a MechanismGraph) -> Self {
        let base = 3 * graph.links().len() + 2 * graph.joints().len();
        let mut next = base;
        let slider_column = graph
            .joints()
            .iter()
            .map(|j| {
                j.slot_link().map(|_| {
                    next += 1;
                    next - 1
                })
            })
            .collect();
        Self {
            graph,
            slider_column,
            unknowns: next,
        }
    }

    pub fn unknowns(&self) -> usize {
        self.unknowns
    }

    fn link_col(&self, link: LinkId) -> usize {
        3 * link.ix()
    }

    fn joint_col(&self, joint: JointId) -> usize {
        3 * self.graph.links().len() + 2 * joint.ix()
    }

    /// Two rows stating that `joint` moves with `link`, plus `slide` along
    /// `u` when it rides in the link's slot.
    fn rigid_rows(
        &self,
        state: &MechanismState,
        level: Level,
        joint: JointId,
        link: LinkId,
        slide: Option<(usize, Vec2, f64)>,
        rows: &mut Vec<Row>,
    ) {
        let ls = state.link(link);
        let r = state.joint(joint).position - ls.origin;
        let w = ls.velocity;
        let jc = self.joint_col(joint);
        let lc = self.link_col(link);

        let mut rhs = match level {
            Level::Velocity => Vec2::zeros(),
            Level::Acceleration => -r * (w * w),
        };
        let mut x = vec![(jc, 1.0), (lc, -1.0), (lc + 2, r.y)];
        let mut y = vec![(jc + 1, 1.0), (lc + 1, -1.0), (lc + 2, -r.x)];
        if let Some((col, u, rate)) = slide {
            x.push((col, -u.x));
            y.push((col, -u.y));
            if level == Level::Acceleration {
                rhs += perp(&u) * (2.0 * rate * w);
            }
        }
        rows.push(Row { terms: x, rhs: rhs.x });
        rows.push(Row { terms: y, rhs: rhs.y });
    }

    fn assemble(&self, state: &MechanismState, level: Level, speed: f64) -> SolverResult<(DMatrix<f64>, DVector<f64>)> {
        let g = self.graph;
        let mut rows: Vec<Row> = Vec::with_capacity(self.unknowns);

        let gc = self.link_col(g.ground());
        for k in 0..3 {
            rows.push(Row {
                terms: vec![(gc + k, 1.0)],
                rhs: 0.0,
            });
        }

        for j in g.joints() {
            for link in std::iter::once(j.link1).chain(j.link2) {
                if j.fixed_with_respect_to(link) {
                    self.rigid_rows(state, level, j.id, link, None, &mut rows);
                }
            }
            if let (Some(slot), Some(col)) = (j.slot_link(), self.slider_column[j.id.ix()]) {
                let u = unit(state.link(slot).angle + j.slide_offset);
                let rate = state.joint(j.id).slide_rate;
                self.rigid_rows(state, level, j.id, slot, Some((col, u, rate)), &mut rows);
            }
            match j.joint_type {
                JointType::P => {
                    if let Some(l2) = j.link2 {
                        rows.push(Row {
                            terms: vec![(self.link_col(j.link1) + 2, 1.0), (self.link_col(l2) + 2, -1.0)],
                            rhs: 0.0,
                        });
                    }
                }
                JointType::G => {
                    let gear = g.gear_for(j.id).ok_or(SolverError::Unresolved {
                        what: format!("gear data missing for joint {}", j.input_index),
                    })?;
                    self.rigid_rows(state, level, j.id, gear.carrier, None, &mut rows);
                    rows.push(Row {
                        terms: vec![
                            (self.link_col(gear.gear1) + 2, gear.radius1),
                            (self.link_col(gear.gear2) + 2, gear.radius2),
                            (self.link_col(gear.carrier) + 2, -(gear.radius1 + gear.radius2)),
                        ],
                        rhs: 0.0,
                    });
                }
                JointType::R | JointType::RP => {}
            }
        }

        let input_rate = match level {
            Level::Velocity => speed,
            Level::Acceleration => 0.0,
        };
        let input_col = match g.input_kind() {
            InputKind::Rotary => self.link_col(g.input_link()) + 2,
            InputKind::Prismatic { .. } => self.slider_column[g.input_joint().ix()].ok_or(
                SolverError::Unresolved {
                    what: "prismatic input has no slide".into(),
                },
            )?,
        };
        rows.push(Row {
            terms: vec![(input_col, 1.0)],
            rhs: input_rate,
        });

        if rows.len() != self.unknowns {
            return Err(SolverError::Singular {
                what: "constraint count does not match unknowns",
            });
        }
        let mut a = DMatrix::zeros(self.unknowns, self.unknowns);
        let mut b = DVector::zeros(self.unknowns);
        for (i, row) in rows.iter().enumerate() {
            for &(c, v) in &row.terms {
                a[(i, c)] += v;
            }
            b[i] = row.rhs;
        }
        Ok((a, b))
    }

    /// Solve for all rates at `level`.
    pub fn solve(&self, state: &MechanismState, level: Level, speed: f64) -> SolverResult<KinematicSolution> {
        let (a, b) = self.assemble(state, level, speed)?;
        let x = a.lu().solve(&b).ok_or(SolverError::Singular {
            what: "instant centres are undefined",
        })?;
        if x.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::NonFinite {
                what: "kinematic solution",
            });
        }
        let g = self.graph;
        let joints = g
            .joints()
            .iter()
            .map(|j| {
                let c = self.joint_col(j.id);
                Vec2::new(x[c], x[c + 1])
            })
            .collect();
        let link_origins = g
            .links()
            .iter()
            .map(|l| {
                let c = self.link_col(l.id);
                Vec2::new(x[c], x[c + 1])
            })
            .collect();
        let link_rates = g.links().iter().map(|l| x[self.link_col(l.id) + 2]).collect();
        let slide_rates = self
            .slider_column
            .iter()
            .map(|c| c.map_or(0.0, |c| x[c]))
            .collect();
        Ok(KinematicSolution {
            joints,
            link_origins,
            link_rates,
            slide_rates,
        })
    }
}

/// Check magnitudes against limits.
pub(crate) fn check_limits(
    solution: &KinematicSolution,
    joint_limit: f64,
    link_limit: f64,
    what: (&'static str, &'static str),
) -> SolverResult<()> {
    let joint_max = solution
        .joints
        .iter()
        .map(|v| v.norm())
        .chain(solution.slide_rates.iter().map(|s| s.abs()))
        .fold(0.0, f64::max);
    if joint_max > joint_limit {
        return Err(SolverError::LimitExceeded {
            what: what.0,
            value: joint_max,
            limit: joint_limit,
        });
    }
    let link_max = solution.link_rates.iter().map(|w| w.abs()).fold(0.0, f64::max);
    if link_max > link_limit {
        return Err(SolverError::LimitExceeded {
            what: what.1,
            value: link_max,
            limit: link_limit,
        });
    }
    Ok(())
}

/// Instant centre of `link` relative to ground, if it is rotating.
pub fn instant_center(state: &MechanismState, link: LinkId) -> Option<Vec2> {
    let l = state.link(link);
    if l.velocity.abs() < pm_core::constants::EPSILON_SAME || !l.velocity.is_finite() {
        return None;
    }
    Some(l.origin + perp(&l.origin_velocity) / l.velocity)
}
