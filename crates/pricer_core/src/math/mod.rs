//! Numerical building blocks: normal distribution, root finding, and
//! correlation factorisation.

pub mod correlation;
pub mod distributions;
pub mod solvers;
