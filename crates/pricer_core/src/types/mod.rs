//! Core time, currency, and error types.
//!
//! # Re-exports
//!
//! - [`Date`], [`time_to_maturity_dates`] from `time`
//! - [`Currency`] from `currency`
//! - [`PricingError`], [`DateError`], [`SolverError`], [`CorrelationError`]
//!   from `error`

pub mod currency;
pub mod error;
pub mod time;

pub use currency::Currency;
pub use error::{CorrelationError, DateError, PricingError, SolverError};
pub use time::{time_to_maturity_dates, Date};
