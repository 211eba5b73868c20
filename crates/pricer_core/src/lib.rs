//! # pricer_core: Foundation types for the valuation engine
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core is the bottom layer of the workspace, providing:
//! - Error types: `PricingError` and the layer errors that convert into it (`types::error`)
//! - Time types: `Date` and ACT/365 year fractions (`types::time`)
//! - Currency types: `Currency` (`types::currency`)
//! - Standard normal CDF/PDF via the Abramowitz-Stegun erfc (`math::distributions`)
//! - Newton-Raphson root finding (`math::solvers`)
//! - Correlation matrices and Cholesky factors (`math::correlation`)
//! - Market snapshots with shock helpers (`market_data`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other pricer_* crates.
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::math::distributions::norm_cdf;
//! use pricer_core::types::{time_to_maturity_dates, Currency, Date};
//!
//! let start = Date::from_ymd(2024, 1, 1).unwrap();
//! let end = Date::from_ymd(2024, 7, 1).unwrap();
//! let yf = time_to_maturity_dates(start, end);
//! assert!(yf > 0.49 && yf < 0.5);
//!
//! assert_eq!(Currency::USD.code(), "USD");
//! assert!((norm_cdf(0.0) - 0.5).abs() < 1e-7);
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod market_data;
pub mod math;
pub mod types;
