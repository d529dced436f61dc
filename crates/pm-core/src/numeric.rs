use crate::constants::EPSILON_SAME;
use crate::{PmError, PmResult};

/// Floating point type used throughout the solver.
pub type Real = f64;

/// True when `x` is zero to within `EPSILON_SAME`.
pub fn same_close_zero(x: Real) -> bool {
    x.abs() < EPSILON_SAME
}

pub fn ensure_finite(v: Real, what: &'static str) -> PmResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(PmError::NonFinite { what, value: v })
    }
}
