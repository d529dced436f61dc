//! Tolerances and step-control constants.

/// Two values closer than this are treated as the same (positions, slopes).
pub const EPSILON_SAME: f64 = 1e-11;

/// Looser tolerance for converged residuals and tangency checks.
pub const EPSILON: f64 = 1e-8;

/// Fraction of the nominal step used for finite-difference perturbations.
pub const SMALL_PERTURBATION_FRACTION: f64 = 0.003;

/// Initial input change (rad, or fraction of average link length for sliders)
/// tried by the error-controlled stepper.
pub const DEFAULT_STEP_SIZE: f64 = 0.5;

/// Smallest input change the error-controlled stepper will shrink to.
pub const MINIMUM_STEP_SIZE: f64 = 0.001;

/// Retry budget of the error-controlled stepper per accepted sample.
pub const MAX_ITERS_IN_POSITION_ERROR: usize = 10;

/// Shrink factor (together with one half) applied after a rejected step.
pub const CONSERVATIVE_ERROR_ESTIMATION: f64 = 0.9;

/// Growth factor applied after an accepted step.
pub const ERROR_SIZE_INCREASE: f64 = 1.2;

/// Iteration cap handed to the non-dyadic minimizer.
pub const MAX_ITERS_IN_NON_DYADIC_SOLVER: usize = 300;

/// Input speed used when none is configured (rad/s).
pub const DEFAULT_INPUT_SPEED: f64 = 1.0;

/// Default prismatic travel, as a multiple of the largest link length.
pub const RANGE_MULTIPLIER: f64 = 5.0;

pub const JOINT_VELOCITY_LIMIT_FACTOR: f64 = 75.0;
pub const LINK_VELOCITY_LIMIT_FACTOR: f64 = 75.0;
pub const JOINT_ACCELERATION_LIMIT_FACTOR: f64 = 75.0;
pub const LINK_ACCELERATION_LIMIT_FACTOR: f64 = 75.0;

/// Slopes steeper than this are treated as vertical.
pub const MAX_SLOPE: f64 = 1e10;

pub const FULL_CIRCLE: f64 = 2.0 * std::f64::consts::PI;
