//! # Random Number Generation
//!
//! Seeded pseudo-random streams for Monte Carlo simulation.
//!
//! - **Reproducibility**: every stream is derived from a run seed
//! - **Chunk independence**: [`PricerRng::for_stream`] gives each simulation
//!   chunk its own stream
//! - **Box-Muller normals** built from open-interval uniforms
//!
//! ```rust
//! use pricer_pricing::rng::PricerRng;
//!
//! let mut rng = PricerRng::from_seed(12345);
//! let z = rng.gen_normal();
//! assert!(z.is_finite());
//! ```

mod prng;

pub use prng::PricerRng;
