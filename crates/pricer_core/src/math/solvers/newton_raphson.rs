//! Newton-Raphson root-finding solver.

use super::SolverConfig;
use crate::types::SolverError;

/// Smallest derivative magnitude accepted before the step is abandoned.
const DERIVATIVE_FLOOR: f64 = 1e-30;

/// Newton-Raphson root finder.
///
/// Uses `x_{n+1} = x_n - f(x_n) / f'(x_n)`, clamping each iterate into the
/// configured bounds when present.
///
/// # Example
///
/// ```
/// use pricer_core::math::solvers::{NewtonRaphsonSolver, SolverConfig};
///
/// let solver = NewtonRaphsonSolver::new(SolverConfig::default());
/// let root = solver.find_root(|x| x * x - 2.0, |x| 2.0 * x, 1.0).unwrap();
/// assert!((root - std::f64::consts::SQRT_2).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct NewtonRaphsonSolver {
    config: SolverConfig,
}

impl NewtonRaphsonSolver {
    /// Create a new solver with the given configuration.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SolverConfig::default())
    }

    /// Find a root of `f` using the explicit derivative `f_prime`.
    ///
    /// # Returns
    ///
    /// * `Ok(x)` - Root where `|f(x)| < tolerance`
    /// * `Err(SolverError::MaxIterationsExceeded)` - carries the last iterate
    /// * `Err(SolverError::DerivativeNearZero)` - carries the stalled iterate
    pub fn find_root<F, G>(&self, f: F, f_prime: G, x0: f64) -> Result<f64, SolverError>
    where
        F: Fn(f64) -> f64,
        G: Fn(f64) -> f64,
    {
        let mut x = self.clamp(x0);

        for _iteration in 0..self.config.max_iterations {
            let f_val = f(x);
            if !f_val.is_finite() {
                return Err(SolverError::NumericalInstability(format!(
                    "objective is not finite at x = {}",
                    x
                )));
            }

            if f_val.abs() < self.config.tolerance {
                return Ok(x);
            }

            let f_prime_val = f_prime(x);
            if !f_prime_val.is_finite() || f_prime_val.abs() < DERIVATIVE_FLOOR {
                return Err(SolverError::DerivativeNearZero { x });
            }

            x = self.clamp(x - f_val / f_prime_val);
        }

        // The final iterate may have converged on the last step.
        if f(x).abs() < self.config.tolerance {
            return Ok(x);
        }

        Err(SolverError::MaxIterationsExceeded {
            iterations: self.config.max_iterations,
            last: x,
        })
    }

    /// Returns a reference to the solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn clamp(&self, x: f64) -> f64 {
        match self.config.bounds {
            Some((lo, hi)) => x.clamp(lo, hi),
            None => x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cubic_root() {
        let solver = NewtonRaphsonSolver::with_defaults();
        let f = |x: f64| x * x * x - x - 2.0;
        let root = solver.find_root(f, |x| 3.0 * x * x - 1.0, 1.5).unwrap();
        assert!(f(root).abs() < 1e-10);
    }

    #[test]
    fn test_bounds_are_respected() {
        let config = SolverConfig::new(1e-12, 50).with_bounds(0.0, 1.0);
        let solver = NewtonRaphsonSolver::new(config);
        // Root at 2 lies outside bounds; iterates pin at the upper bound.
        let result = solver.find_root(|x| x - 2.0, |_| 1.0, 0.5);
        match result {
            Err(SolverError::MaxIterationsExceeded { last, .. }) => {
                assert_relative_eq!(last, 1.0)
            }
            other => panic!("Expected MaxIterationsExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_derivative() {
        let solver = NewtonRaphsonSolver::with_defaults();
        let result = solver.find_root(|x| x * x + 1.0, |_| 0.0, 0.0);
        assert!(matches!(result, Err(SolverError::DerivativeNearZero { .. })));
    }

    #[test]
    fn test_non_finite_objective() {
        let solver = NewtonRaphsonSolver::with_defaults();
        let result = solver.find_root(|_| f64::NAN, |_| 1.0, 0.0);
        assert!(matches!(result, Err(SolverError::NumericalInstability(_))));
    }
}
