//! Root-finding solvers.
//!
//! - [`NewtonRaphsonSolver`]: quadratic convergence using an explicit
//!   derivative, with optional clamping of iterates (used for implied
//!   volatility, where volatility is kept inside `[0.001, 3.0]`)
//!
//! ```
//! use pricer_core::math::solvers::{NewtonRaphsonSolver, SolverConfig};
//!
//! let solver = NewtonRaphsonSolver::new(SolverConfig::default());
//! let root = solver.find_root(|x| x * x - 2.0, |x| 2.0 * x, 1.0).unwrap();
//! assert!((root - std::f64::consts::SQRT_2).abs() < 1e-10);
//! ```

mod config;
mod newton_raphson;

pub use config::SolverConfig;
pub use newton_raphson::NewtonRaphsonSolver;
