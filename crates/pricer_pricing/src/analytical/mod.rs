//! Closed-form (analytic) pricing.
//!
//! - [`BlackScholes`]: European options with dividend yield and full Greeks
//! - [`future_greeks`]: cost-of-carry futures valuation
//! - [`replicate_redemption`]: single-name structured notes by static
//!   replication

mod black_scholes;
mod error;
mod futures;
mod structured;

pub use black_scholes::{AnalyticGreeks, BlackScholes, EXPIRY_EPSILON};
pub use error::AnalyticalError;
pub use futures::future_greeks;
pub use structured::{coupon_value, replicate_redemption, ReplicationInputs};
