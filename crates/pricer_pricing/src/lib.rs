//! # pricer_pricing: Pricing engines (Layer 3)
//!
//! ## Layer 3 Role
//!
//! pricer_pricing turns instruments and market snapshots into values and
//! sensitivities:
//! - Closed-form Black–Scholes family with analytic Greeks (`analytical`)
//! - Cox-Ross-Rubinstein binomial lattice with early exercise and barrier
//!   truncation (`lattice`)
//! - Parallel Monte Carlo simulator with barrier monitoring (`mc`)
//! - Model selection policy (`selector`)
//! - Instrument-level pricing façade (`pricer`)
//! - Analytic and finite-difference Greeks (`greeks`)
//! - Implied volatility solver and analysis (`implied_vol`)
//!
//! ## Usage Example
//!
//! ```rust
//! use pricer_core::market_data::{MarketSnapshot, UnderlyingQuote};
//! use pricer_core::types::{Currency, Date};
//! use pricer_models::instruments::{EquityOption, ExerciseStyle, Instrument, InstrumentTerms, OptionType};
//! use pricer_pricing::pricer::Pricer;
//! use pricer_pricing::selector::ModelType;
//!
//! let as_of = Date::from_ymd(2024, 1, 2).unwrap();
//! let terms = InstrumentTerms::new("OPT-1", Currency::USD, as_of, Date::from_ymd(2025, 1, 1).unwrap(), 1.0);
//! let option: Instrument = EquityOption::new(terms, "ACME", 100.0, OptionType::Call, ExerciseStyle::European)
//!     .unwrap()
//!     .into();
//! let snapshot = MarketSnapshot::new(as_of, 0.05).with_quote(UnderlyingQuote::new("ACME", 100.0, 0.2));
//!
//! let outcome = Pricer::default().price_auto(&option, &snapshot).unwrap();
//! assert_eq!(outcome.model, ModelType::ClosedForm);
//! assert!((outcome.value - 10.4506).abs() < 1e-3);
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod analytical;
pub mod greeks;
pub mod implied_vol;
pub mod lattice;
pub mod mc;
pub mod pricer;
pub mod rng;
pub mod selector;
