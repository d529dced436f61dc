//! The simulation entry point.

use std::sync::{Mutex, PoisonError};

use pm_graph::{MechanismBuilder, MechanismGraph, MechanismState};
use pm_results::{InputRange, JointParameters, LinkParameters, RunSummary};
use pm_solver::{Minimizer, NewtonMinimizer, PositionFinder};
use tracing::info;

use crate::bootstrap::bootstrap;
use crate::error::SimResult;
use crate::options::{Directions, SimOptions, StepMode};
use crate::sweep::{Direction, SharedRun, Sweep};

/// Where the simulator is in its life cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Topology built; nothing simulated yet (or settings changed since).
    Configured,
    /// Time-zero state established.
    Bootstrapped,
    /// Forward and backward sweeps running.
    Integrating,
    Complete,
}

/// Simulates a full cycle of a single-degree-of-freedom mechanism.
///
/// ```no_run
/// use pm_sim::Simulator;
///
/// let links = vec![
///     vec!["ground", "crank"],
///     vec!["crank", "coupler"],
///     vec!["coupler", "rocker"],
///     vec!["rocker", "ground"],
/// ];
/// let types = vec!["R", "R", "R", "R"];
/// let positions = vec![vec![0.0, 0.0], vec![0.0, 2.0], vec![4.0, 5.0], vec![4.0, 0.0]];
///
/// let mut sim = Simulator::from_input(&links, &types, &positions).unwrap();
/// sim.set_input_speed(1.0);
/// sim.set_delta_angle(0.05);
/// sim.find_full_movement().unwrap();
/// assert!(sim.input_range().span() >= 2.0 * std::f64::consts::PI - 1e-6);
/// ```
pub struct Simulator {
    graph: MechanismGraph,
    options: SimOptions,
    minimizer: Box<dyn Minimizer>,
    phase: Phase,
    joints: JointParameters,
    links: LinkParameters,
    range: InputRange,
    status: Vec<String>,
}

impl Simulator {
    pub fn new(graph: MechanismGraph) -> Self {
        Self {
            graph,
            options: SimOptions::default(),
            minimizer: Box::new(NewtonMinimizer::default()),
            phase: Phase::Configured,
            joints: JointParameters::new(),
            links: LinkParameters::new(),
            range: InputRange::at(0.0),
            status: Vec::new(),
        }
    }

    /// Build from tabular input (see [`MechanismBuilder::from_input`]).
    pub fn from_input<S: AsRef<str>>(
        link_names: &[Vec<S>],
        type_codes: &[S],
        positions: &[Vec<f64>],
    ) -> SimResult<Self> {
        Ok(Self::new(MechanismBuilder::from_input(
            link_names, type_codes, positions,
        )?))
    }

    /// Replace the minimizer used for non-dyadic loops.
    pub fn with_minimizer(mut self, minimizer: Box<dyn Minimizer>) -> Self {
        self.minimizer = minimizer;
        self
    }

    pub fn with_options(mut self, options: SimOptions) -> Self {
        self.options = options;
        self.phase = Phase::Configured;
        self
    }

    pub fn graph(&self) -> &MechanismGraph {
        &self.graph
    }

    pub fn options(&self) -> &SimOptions {
        &self.options
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn degrees_of_freedom(&self) -> i32 {
        self.graph.degrees_of_freedom()
    }

    /// Can every position be found in closed form?
    pub fn is_dyadic(&self) -> SimResult<bool> {
        let mut finder = PositionFinder::new(&self.graph, self.minimizer.as_ref());
        Ok(finder.is_dyadic(&MechanismState::initial(&self.graph))?)
    }

    pub fn set_input_speed(&mut self, speed: f64) {
        self.options.input_speed = speed;
        self.phase = Phase::Configured;
    }

    pub fn set_delta_angle(&mut self, delta: f64) {
        self.set_step(StepMode::DeltaAngle(delta));
    }

    pub fn set_fixed_time_step(&mut self, dt: f64) {
        self.set_step(StepMode::FixedTimeStep(dt));
    }

    pub fn set_max_smoothing_error(&mut self, fraction: f64) {
        self.set_step(StepMode::MaxSmoothingError(fraction));
    }

    pub fn set_directions(&mut self, directions: Directions) {
        self.options.directions = directions;
        self.phase = Phase::Configured;
    }

    fn set_step(&mut self, mode: StepMode) {
        self.options.step = Some(mode);
        self.phase = Phase::Configured;
    }

    /// Simulate one full cycle of the input.
    ///
    /// Fails only on configuration problems. A sweep that runs into a
    /// configuration it cannot solve stops there and leaves a status line;
    /// the samples found so far are kept.
    pub fn find_full_movement(&mut self) -> SimResult<()> {
        self.graph.require_single_dof()?;
        let plan = self.options.plan(&self.graph)?;
        self.phase = Phase::Configured;

        let graph = &self.graph;
        let minimizer = self.minimizer.as_ref();
        let mut finder = PositionFinder::new(graph, minimizer);
        let mut notes = Vec::new();
        let initial = bootstrap(graph, &mut finder, &plan, &mut notes);

        let mut run = SharedRun::new(InputRange::at(plan.base));
        for line in notes {
            run.note(line);
        }
        run.joints.add(0.0, initial.joint_rows(graph.joints_in_input_order()))?;
        run.links.add(0.0, initial.link_rows(graph.links_in_input_order()))?;
        self.phase = Phase::Bootstrapped;
        info!(
            joints = graph.joints().len(),
            links = graph.links().len(),
            speed = plan.speed,
            travel = plan.travel,
            "bootstrapped initial state"
        );

        let shared = Mutex::new(run);
        self.phase = Phase::Integrating;
        let forward = || Sweep::new(Direction::Forward, graph, minimizer, plan, &shared).run(initial.clone());
        let backward = || Sweep::new(Direction::Backward, graph, minimizer, plan, &shared).run(initial.clone());
        let ends = match self.options.directions {
            Directions::Both => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(2)
                    .thread_name(|i| format!("pm-sweep-{i}"))
                    .build()?;
                let (f, b) = pool.join(forward, backward);
                vec![f, b]
            }
            Directions::ForwardOnly => vec![forward()],
            Directions::BackwardOnly => vec![backward()],
        };

        let run = shared.into_inner().unwrap_or_else(PoisonError::into_inner);
        self.joints = run.joints;
        self.links = run.links;
        self.range = run.range;
        self.status = run.status;
        self.phase = Phase::Complete;
        info!(
            samples = self.joints.len(),
            start = self.range.start,
            end = self.range.end,
            status_lines = self.status.len(),
            ?ends,
            "full movement found"
        );
        Ok(())
    }

    /// Joint rows `[x, y, vx, vy, ax, ay]` per sample, joints in input order.
    pub fn joint_parameters(&self) -> &JointParameters {
        &self.joints
    }

    /// Link rows `[angle, omega, alpha]` per sample, links in order of first mention.
    pub fn link_parameters(&self) -> &LinkParameters {
        &self.links
    }

    pub fn input_range(&self) -> InputRange {
        self.range
    }

    /// Accumulated warnings, one per line.
    pub fn status(&self) -> String {
        self.status.join("\n")
    }

    pub fn status_lines(&self) -> &[String] {
        &self.status
    }

    pub fn summary(&self) -> SimResult<RunSummary> {
        Ok(RunSummary {
            degrees_of_freedom: self.degrees_of_freedom(),
            dyadic: self.is_dyadic()?,
            samples: self.joints.len(),
            time_span: self.joints.span(),
            input_range: self.range,
            status: self.status.clone(),
        })
    }
}
