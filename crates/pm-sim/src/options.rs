//! Simulation options.

use pm_core::constants::{
    DEFAULT_INPUT_SPEED, DEFAULT_STEP_SIZE, FULL_CIRCLE, MINIMUM_STEP_SIZE, RANGE_MULTIPLIER,
};
use pm_core::ensure_finite;
use pm_graph::{InputKind, MechanismGraph};

use crate::error::{SimError, SimResult};

/// How the input advances from one sample to the next.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepMode {
    /// Fixed change of the input per step (rad, or length for a slider input).
    DeltaAngle(f64),
    /// Fixed time step (s).
    FixedTimeStep(f64),
    /// Adaptive steps keeping the position error below this fraction of the
    /// average link length.
    MaxSmoothingError(f64),
}

/// Which way(s) to integrate from time zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Directions {
    #[default]
    Both,
    ForwardOnly,
    BackwardOnly,
}

#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Input rate (rad/s, or length/s for a slider input).
    pub input_speed: f64,
    pub step: Option<StepMode>,
    /// Safety limit on samples per sweep.
    pub max_steps_per_sweep: usize,
    /// Cycle length of a prismatic input; defaults to a multiple of the
    /// largest link.
    pub max_input_travel: Option<f64>,
    pub directions: Directions,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            input_speed: DEFAULT_INPUT_SPEED,
            step: None,
            max_steps_per_sweep: 100_000,
            max_input_travel: None,
            directions: Directions::default(),
        }
    }
}

/// Step control resolved against a particular mechanism.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Stepping {
    Fixed { dt: f64 },
    Adaptive { bound: f64, initial: f64, minimum: f64 },
}

/// Everything a sweep needs to know about pacing and termination.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StepPlan {
    pub speed: f64,
    pub stepping: Stepping,
    /// Input travel that completes the cycle.
    pub travel: f64,
    /// Input coordinate at time zero, as reported in the input range.
    pub base: f64,
    pub max_steps: usize,
}

impl StepPlan {
    /// Nominal input change per step, used to size finite differences.
    pub fn nominal_delta(&self) -> f64 {
        match self.stepping {
            Stepping::Fixed { dt } => (self.speed * dt).abs(),
            Stepping::Adaptive { initial, .. } => initial,
        }
    }
}

impl SimOptions {
    pub(crate) fn plan(&self, graph: &MechanismGraph) -> SimResult<StepPlan> {
        let speed = ensure_finite(self.input_speed, "input speed")?;
        if speed == 0.0 {
            return Err(SimError::InvalidArg {
                what: "input speed must be non-zero",
            });
        }
        if self.max_steps_per_sweep == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps_per_sweep must be positive",
            });
        }
        let positive = |v: f64, what: &'static str| {
            if v.is_finite() && v > 0.0 {
                Ok(v)
            } else {
                Err(SimError::InvalidArg { what })
            }
        };

        let (scale, travel, base) = match graph.input_kind() {
            InputKind::Rotary => {
                let base = graph.links()[graph.input_link().ix()].angle_initial;
                (1.0, FULL_CIRCLE, base)
            }
            InputKind::Prismatic { .. } => {
                let travel = match self.max_input_travel {
                    Some(t) => positive(t, "max_input_travel must be positive")?,
                    None => RANGE_MULTIPLIER * graph.max_link_length(),
                };
                (graph.average_link_length(), travel, 0.0)
            }
        };

        let stepping = match self.step.ok_or(SimError::NoStepMode)? {
            StepMode::DeltaAngle(d) => Stepping::Fixed {
                dt: positive(d, "delta angle must be positive")? / speed.abs(),
            },
            StepMode::FixedTimeStep(dt) => Stepping::Fixed {
                dt: positive(dt, "fixed time step must be positive")?,
            },
            StepMode::MaxSmoothingError(e) => Stepping::Adaptive {
                bound: positive(e, "max smoothing error must be positive")? * graph.average_link_length(),
                initial: DEFAULT_STEP_SIZE * scale,
                minimum: MINIMUM_STEP_SIZE * scale,
            },
        };

        Ok(StepPlan {
            speed,
            stepping,
            travel,
            base,
            max_steps: self.max_steps_per_sweep,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_options_defaults() {
        let opts = SimOptions::default();
        assert_eq!(opts.input_speed, 1.0);
        assert_eq!(opts.step, None);
        assert_eq!(opts.max_steps_per_sweep, 100_000);
        assert_eq!(opts.directions, Directions::Both);
    }
}
