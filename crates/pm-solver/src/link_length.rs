//! Rigid-length objective for non-dyadic loops.
//!
//! Each [`LinkLengthFunction`] penalizes the deviation of one joint pair from
//! its design length, `f = (L - L0)^2`. An end is either a free variable
//! (two consecutive slots in the optimizer vector) or a joint whose position
//! is already known. Only the partials of a term's own variables are
//! non-zero, so [`LinkLengthObjective`] assembles gradient and Hessian by
//! scattering each term's 2x2 blocks.

use nalgebra::{DMatrix, DVector};
use pm_core::Vec2;

use crate::optimize::ObjectiveFunction;

/// One end of a length constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairEnd {
    /// Index of the joint in the variable list (`x[2i]`, `x[2i + 1]`).
    Variable(usize),
    Known(Vec2),
}

impl PairEnd {
    fn position(&self, x: &DVector<f64>) -> Vec2 {
        match *self {
            PairEnd::Variable(i) => Vec2::new(x[2 * i], x[2 * i + 1]),
            PairEnd::Known(p) => p,
        }
    }

    fn variable(&self) -> Option<usize> {
        match *self {
            PairEnd::Variable(i) => Some(i),
            PairEnd::Known(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkLengthFunction {
    pub first: PairEnd,
    pub second: PairEnd,
    pub length: f64,
}

impl LinkLengthFunction {
    pub fn new(first: PairEnd, second: PairEnd, length: f64) -> Self {
        Self {
            first,
            second,
            length,
        }
    }

    /// `(first - second, current length)`.
    fn delta(&self, x: &DVector<f64>) -> (Vec2, f64) {
        let d = self.first.position(x) - self.second.position(x);
        let l = d.norm();
        (d, l)
    }

    pub fn value(&self, x: &DVector<f64>) -> f64 {
        let (_, l) = self.delta(x);
        (l - self.length).powi(2)
    }

    /// Partials with respect to `(x1, y1)`; those of the second end are the
    /// negation.
    pub fn gradient_first(&self, x: &DVector<f64>) -> Vec2 {
        let (d, l) = self.delta(x);
        if l <= f64::MIN_POSITIVE {
            return Vec2::zeros();
        }
        d * (2.0 * (1.0 - self.length / l))
    }

    /// Second partials with respect to the first end. The block for the
    /// second end is identical and the mixed block is its negation.
    pub fn hessian_block(&self, x: &DVector<f64>) -> [[f64; 2]; 2] {
        let (d, l) = self.delta(x);
        if l <= f64::MIN_POSITIVE {
            return [[0.0; 2]; 2];
        }
        let first_term = 2.0 * (1.0 - self.length / l);
        let second_term = 2.0 * self.length / (l * l * l);
        [
            [first_term + d.x * d.x * second_term, d.x * d.y * second_term],
            [d.x * d.y * second_term, first_term + d.y * d.y * second_term],
        ]
    }
}

/// Sum of rigid-length penalties over a set of free joints.
#[derive(Debug, Clone, Default)]
pub struct LinkLengthObjective {
    pub terms: Vec<LinkLengthFunction>,
    pub variables: usize,
}

impl LinkLengthObjective {
    pub fn new(variables: usize) -> Self {
        Self {
            terms: Vec::new(),
            variables,
        }
    }

    pub fn push(&mut self, term: LinkLengthFunction) {
        self.terms.push(term);
    }
}

impl ObjectiveFunction for LinkLengthObjective {
    fn dimension(&self) -> usize {
        2 * self.variables
    }

    fn value(&self, x: &DVector<f64>) -> f64 {
        self.terms.iter().map(|t| t.value(x)).sum()
    }

    fn gradient(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut g = DVector::zeros(self.dimension());
        for t in &self.terms {
            let gf = t.gradient_first(x);
            if let Some(i) = t.first.variable() {
                g[2 * i] += gf.x;
                g[2 * i + 1] += gf.y;
            }
            if let Some(j) = t.second.variable() {
                g[2 * j] -= gf.x;
                g[2 * j + 1] -= gf.y;
            }
        }
        g
    }

    fn hessian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        let n = self.dimension();
        let mut h = DMatrix::zeros(n, n);
        for t in &self.terms {
            let b = t.hessian_block(x);
            let ends = [(t.first.variable(), 1.0), (t.second.variable(), -1.0)];
            for &(a, sa) in &ends {
                for &(c, sc) in &ends {
                    let (Some(a), Some(c)) = (a, c) else {
                        continue;
                    };
                    for r in 0..2 {
                        for k in 0..2 {
                            h[(2 * a + r, 2 * c + k)] += sa * sc * b[r][k];
                        }
                    }
                }
            }
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn objective() -> (LinkLengthObjective, DVector<f64>) {
        let mut obj = LinkLengthObjective::new(2);
        obj.push(LinkLengthFunction::new(
            PairEnd::Known(Vec2::new(0.0, 0.0)),
            PairEnd::Variable(0),
            2.0,
        ));
        obj.push(LinkLengthFunction::new(
            PairEnd::Variable(0),
            PairEnd::Variable(1),
            3.0,
        ));
        obj.push(LinkLengthFunction::new(
            PairEnd::Variable(1),
            PairEnd::Known(Vec2::new(4.0, 0.0)),
            2.5,
        ));
        let x = DVector::from_vec(vec![0.3, 1.7, 3.1, 2.2]);
        (obj, x)
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let (obj, x) = objective();
        let g = obj.gradient(&x);
        let h = 1e-6;
        for i in 0..x.len() {
            let mut xp = x.clone();
            let mut xm = x.clone();
            xp[i] += h;
            xm[i] -= h;
            let fd = (obj.value(&xp) - obj.value(&xm)) / (2.0 * h);
            assert!((fd - g[i]).abs() < 1e-6, "component {i}: {fd} vs {}", g[i]);
        }
    }

    #[test]
    fn hessian_matches_finite_difference() {
        let (obj, x) = objective();
        let hess = obj.hessian(&x);
        let h = 1e-6;
        for j in 0..x.len() {
            let mut xp = x.clone();
            let mut xm = x.clone();
            xp[j] += h;
            xm[j] -= h;
            let col = (obj.gradient(&xp) - obj.gradient(&xm)) / (2.0 * h);
            for i in 0..x.len() {
                assert!((col[i] - hess[(i, j)]).abs() < 1e-5);
            }
        }
        assert!((hess.clone() - hess.transpose()).amax() < 1e-12);
    }

    #[test]
    fn zero_at_design_length() {
        let t = LinkLengthFunction::new(
            PairEnd::Known(Vec2::new(1.0, 1.0)),
            PairEnd::Known(Vec2::new(4.0, 5.0)),
            5.0,
        );
        let x = DVector::zeros(0);
        assert!(t.value(&x).abs() < 1e-24);
        assert!(t.gradient_first(&x).norm() < 1e-12);
    }
}
