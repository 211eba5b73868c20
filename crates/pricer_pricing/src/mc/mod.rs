//! Monte Carlo simulation of geometric Brownian motion paths.
//!
//! # Architecture
//!
//! ```text
//! MonteCarloEngine
//! ├── MonteCarloConfig   (paths, steps per year, seed, budget, deadline)
//! ├── SimulationInputs   (asset dynamics, rate, expiry, Cholesky factor)
//! ├── PathProduct        (terminal payoff, barriers, fixed coupons)
//! └── chunked rayon reduction
//!     └── PricerRng::for_stream(seed, chunk)
//! ```
//!
//! Bumped revaluations that reuse the configuration reuse the seed, so
//! finite-difference Greeks see common random numbers.

mod config;
mod engine;
mod error;
mod payoff;

pub use config::{MonteCarloConfig, MonteCarloConfigBuilder, MAX_PATHS, MAX_STEPS};
pub use engine::{AssetDynamics, MonteCarloEngine, SimulationInputs, SimulationResult};
pub use error::ConfigError;
pub use payoff::{PathBarrier, PathObservation, PathPayoff, PathProduct, BGK_BETA};
