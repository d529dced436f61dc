//! Unconstrained minimization seam.
//!
//! The position solver only needs "minimize this smooth objective from this
//! starting point". [`ObjectiveFunction`] supplies value, gradient and
//! Hessian; any [`Minimizer`] can be plugged in. [`NewtonMinimizer`] is the
//! default: Newton steps on a Levenberg-damped Hessian with backtracking.

use nalgebra::{DMatrix, DVector};

/// Twice-differentiable scalar objective.
pub trait ObjectiveFunction {
    /// Number of variables.
    fn dimension(&self) -> usize;
    fn value(&self, x: &DVector<f64>) -> f64;
    fn gradient(&self, x: &DVector<f64>) -> DVector<f64>;
    fn hessian(&self, x: &DVector<f64>) -> DMatrix<f64>;
}

/// Minimization result.
#[derive(Debug, Clone)]
pub struct MinimizeResult {
    pub x: DVector<f64>,
    /// Objective value at `x`.
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// A numerical minimizer.
///
/// Sweeps run concurrently and share one minimizer, hence `Send + Sync`.
pub trait Minimizer: Send + Sync {
    fn minimize(&self, objective: &dyn ObjectiveFunction, x0: DVector<f64>) -> MinimizeResult;
}

/// Newton minimizer configuration.
#[derive(Debug, Clone)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Stop once the objective falls below this
    pub value_tol: f64,
    /// Stop once the gradient norm falls below this
    pub gradient_tol: f64,
    /// First Levenberg shift tried when the Hessian is not positive definite
    pub initial_damping: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: pm_core::constants::MAX_ITERS_IN_NON_DYADIC_SOLVER,
            value_tol: 1e-24,
            gradient_tol: 1e-14,
            initial_damping: 1e-10,
            line_search_beta: 0.5,
            max_line_search_iters: 40,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewtonMinimizer {
    pub config: NewtonConfig,
}

impl NewtonMinimizer {
    pub fn new(config: NewtonConfig) -> Self {
        Self { config }
    }

    /// Newton direction on `H + λI`, raising `λ` until the Cholesky
    /// factorization succeeds.
    fn direction(&self, h: &DMatrix<f64>, g: &DVector<f64>) -> Option<DVector<f64>> {
        let n = g.len();
        let scale = h.diagonal().amax().max(1.0);
        let mut lambda = 0.0;
        for _ in 0..30 {
            let shifted = h + DMatrix::identity(n, n) * lambda;
            if let Some(chol) = shifted.cholesky() {
                let dx = -chol.solve(g);
                if dx.iter().all(|v| v.is_finite()) {
                    return Some(dx);
                }
            }
            lambda = if lambda == 0.0 {
                self.config.initial_damping * scale
            } else {
                lambda * 10.0
            };
        }
        None
    }
}

impl Minimizer for NewtonMinimizer {
    fn minimize(&self, objective: &dyn ObjectiveFunction, x0: DVector<f64>) -> MinimizeResult {
        let cfg = &self.config;
        let mut x = x0;
        let mut f = objective.value(&x);

        for iter in 0..cfg.max_iterations {
            let g = objective.gradient(&x);
            if !f.is_finite() {
                break;
            }
            if f <= cfg.value_tol || g.norm() <= cfg.gradient_tol {
                return MinimizeResult {
                    x,
                    value: f,
                    iterations: iter,
                    converged: true,
                };
            }

            let h = objective.hessian(&x);
            let Some(dx) = self.direction(&h, &g) else {
                break;
            };

            // Armijo backtracking
            let slope = g.dot(&dx);
            let mut alpha = 1.0;
            let mut accepted = None;
            for _ in 0..cfg.max_line_search_iters {
                let x_new = &x + &dx * alpha;
                let f_new = objective.value(&x_new);
                if f_new.is_finite() && f_new <= f + 1e-4 * alpha * slope {
                    accepted = Some((x_new, f_new));
                    break;
                }
                alpha *= cfg.line_search_beta;
            }
            match accepted {
                Some((x_new, f_new)) => {
                    x = x_new;
                    f = f_new;
                }
                None => {
                    // stalled: converged only if already at the floor
                    let converged = f <= cfg.value_tol;
                    return MinimizeResult {
                        x,
                        value: f,
                        iterations: iter + 1,
                        converged,
                    };
                }
            }
        }

        MinimizeResult {
            converged: f <= cfg.value_tol,
            x,
            value: f,
            iterations: cfg.max_iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rosenbrock valley.
    struct Rosenbrock;

    impl ObjectiveFunction for Rosenbrock {
        fn dimension(&self) -> usize {
            2
        }
        fn value(&self, x: &DVector<f64>) -> f64 {
            (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
        }
        fn gradient(&self, x: &DVector<f64>) -> DVector<f64> {
            DVector::from_vec(vec![
                -2.0 * (1.0 - x[0]) - 400.0 * x[0] * (x[1] - x[0] * x[0]),
                200.0 * (x[1] - x[0] * x[0]),
            ])
        }
        fn hessian(&self, x: &DVector<f64>) -> DMatrix<f64> {
            DMatrix::from_row_slice(
                2,
                2,
                &[
                    2.0 - 400.0 * x[1] + 1200.0 * x[0] * x[0],
                    -400.0 * x[0],
                    -400.0 * x[0],
                    200.0,
                ],
            )
        }
    }

    #[test]
    fn rosenbrock_converges() {
        let result = NewtonMinimizer::default()
            .minimize(&Rosenbrock, DVector::from_vec(vec![-1.2, 1.0]));
        assert!(result.converged, "{result:?}");
        assert!((result.x[0] - 1.0).abs() < 1e-6);
        assert!((result.x[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn already_optimal_start() {
        let result =
            NewtonMinimizer::default().minimize(&Rosenbrock, DVector::from_vec(vec![1.0, 1.0]));
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
    }
}
