//! Finite-difference fallback for velocities and accelerations.
//!
//! When the analytic systems are singular the input is nudged by a small
//! fraction of the nominal step and the position solver is re-run. Central
//! differences are used when both neighbours can be solved, one-sided
//! differences when only one direction closes.

use tracing::debug;

use pm_core::Vec2;
use pm_graph::MechanismState;

use crate::position::PositionFinder;

/// Which derivatives to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    pub velocity: bool,
    pub acceleration: bool,
}

impl Fill {
    pub const BOTH: Fill = Fill {
        velocity: true,
        acceleration: true,
    };
    pub const VELOCITY: Fill = Fill {
        velocity: true,
        acceleration: false,
    };
    pub const ACCELERATION: Fill = Fill {
        velocity: false,
        acceleration: true,
    };
}

/// Stencil that produced a numerical estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceScheme {
    Central,
    Forward,
    Backward,
}

/// Sampled values of one scalar at `-2h..2h` (whichever were solved).
struct Stencil {
    first: f64,
    second: f64,
}

fn derivatives(scheme: DifferenceScheme, c: f64, n1: f64, n2: f64, h: f64) -> Stencil {
    match scheme {
        // n1 = x(t - h), n2 = x(t + h)
        DifferenceScheme::Central => Stencil {
            first: (n2 - n1) / (2.0 * h),
            second: (n2 - 2.0 * c + n1) / (h * h),
        },
        // n1 = x(t + h), n2 = x(t + 2h)
        DifferenceScheme::Forward => Stencil {
            first: (n1 - c) / h,
            second: (n2 - 2.0 * n1 + c) / (h * h),
        },
        // n1 = x(t - h), n2 = x(t - 2h)
        DifferenceScheme::Backward => Stencil {
            first: (c - n1) / h,
            second: (c - 2.0 * n1 + n2) / (h * h),
        },
    }
}

/// Write finite-difference derivatives of `a` and `b` neighbours into `center`.
pub fn apply_difference(
    scheme: DifferenceScheme,
    center: &mut MechanismState,
    a: &MechanismState,
    b: &MechanismState,
    h: f64,
    fill: Fill,
) {
    let vec = |c: Vec2, p: Vec2, q: Vec2| {
        let x = derivatives(scheme, c.x, p.x, q.x, h);
        let y = derivatives(scheme, c.y, p.y, q.y, h);
        (Vec2::new(x.first, y.first), Vec2::new(x.second, y.second))
    };

    for (i, j) in center.joints.iter_mut().enumerate() {
        let (v, acc) = vec(j.position, a.joints[i].position, b.joints[i].position);
        let s = derivatives(scheme, j.slide, a.joints[i].slide, b.joints[i].slide, h);
        if fill.velocity {
            j.velocity = v;
            j.slide_rate = s.first;
        }
        if fill.acceleration {
            j.acceleration = acc;
            j.slide_acceleration = s.second;
        }
    }
    for (i, l) in center.links.iter_mut().enumerate() {
        let (v, acc) = vec(l.origin, a.links[i].origin, b.links[i].origin);
        let w = derivatives(scheme, l.angle, a.links[i].angle, b.links[i].angle, h);
        if fill.velocity {
            l.origin_velocity = v;
            l.velocity = w.first;
        }
        if fill.acceleration {
            l.origin_acceleration = acc;
            l.acceleration = w.second;
        }
    }
}

/// Accelerations as the forward difference of two velocity fields.
pub fn difference_velocities(center: &mut MechanismState, ahead: &MechanismState, h: f64) {
    for (j, n) in center.joints.iter_mut().zip(&ahead.joints) {
        j.acceleration = (n.velocity - j.velocity) / h;
        j.slide_acceleration = (n.slide_rate - j.slide_rate) / h;
    }
    for (l, n) in center.links.iter_mut().zip(&ahead.links) {
        l.origin_acceleration = (n.origin_velocity - l.origin_velocity) / h;
        l.acceleration = (n.velocity - l.velocity) / h;
    }
}

/// Mark the requested derivatives as unknown.
pub fn invalidate(state: &mut MechanismState, fill: Fill) {
    let nan = Vec2::new(f64::NAN, f64::NAN);
    for j in &mut state.joints {
        if fill.velocity {
            j.velocity = nan;
            j.slide_rate = f64::NAN;
        }
        if fill.acceleration {
            j.acceleration = nan;
            j.slide_acceleration = f64::NAN;
        }
    }
    for l in &mut state.links {
        if fill.velocity {
            l.origin_velocity = nan;
            l.velocity = f64::NAN;
        }
        if fill.acceleration {
            l.origin_acceleration = nan;
            l.acceleration = f64::NAN;
        }
    }
}

/// Solve the configuration a signed time `h` away from `state`.
pub fn perturbed(
    finder: &mut PositionFinder<'_>,
    state: &MechanismState,
    speed: f64,
    h: f64,
) -> Option<MechanismState> {
    let mut s = state.clone();
    match finder.solve(&mut s, speed * h, h) {
        Ok(()) => {
            s.time = state.time + h;
            Some(s)
        }
        Err(e) => {
            debug!(h, error = %e, "perturbed position solve failed");
            None
        }
    }
}

/// Estimate derivatives of `state` by perturbing the input `epsilon` (input
/// units) either side. Returns the scheme used, or `None` (leaving the
/// requested fields as NaN) if neither direction can be solved.
pub fn estimate(
    finder: &mut PositionFinder<'_>,
    state: &mut MechanismState,
    speed: f64,
    epsilon: f64,
    fill: Fill,
) -> Option<DifferenceScheme> {
    let h = (epsilon / speed).abs();
    let plus = perturbed(finder, state, speed, h);
    let minus = perturbed(finder, state, speed, -h);

    let (scheme, a, b) = match (minus, plus) {
        (Some(m), Some(p)) => (DifferenceScheme::Central, m, p),
        (None, Some(p)) => match perturbed(finder, &p, speed, h) {
            Some(pp) => (DifferenceScheme::Forward, p, pp),
            None => {
                invalidate(state, fill);
                return None;
            }
        },
        (Some(m), None) => match perturbed(finder, &m, speed, -h) {
            Some(mm) => (DifferenceScheme::Backward, m, mm),
            None => {
                invalidate(state, fill);
                return None;
            }
        },
        (None, None) => {
            invalidate(state, fill);
            return None;
        }
    };
    apply_difference(scheme, state, &a, &b, h, fill);
    Some(scheme)
}
