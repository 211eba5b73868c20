//! # Pricer Risk (L4: Application)
//!
//! Valuation orchestration and risk analytics on top of the pricing
//! engines.
//!
//! This crate provides:
//! - [`orchestrator::ValuationEngine`]: model selection, pricing, Greeks,
//!   barrier statuses and scenario P&L in one call, on a bounded worker pool
//! - Barrier monitoring with a transactional hit-state store (`barrier`)
//! - Spot × volatility scenario grids and preset stress tests (`scenario`)
//! - SPAN-style scan margin (`margin`)
//! - Batch portfolio valuation with per-position error capture (`portfolio`)
//! - Request/response façade over instrument and market data collaborators
//!   (`service`)
//! - Layered engine configuration and tracing bootstrap (`config`,
//!   `telemetry`)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            pricer_risk (L4)             │
//! ├─────────────────────────────────────────┤
//! │  service/      - requests, repositories │
//! │  orchestrator  - ValuationEngine        │
//! │  barrier/      - evaluator, store       │
//! │  scenario/     - grids, presets         │
//! │  margin        - SPAN scan              │
//! │  portfolio/    - batch valuation        │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │           pricer_pricing (L3)           │
//! │  closed form, lattice, Monte Carlo      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use pricer_core::market_data::{MarketSnapshot, UnderlyingQuote};
//! use pricer_core::types::{Currency, Date};
//! use pricer_models::instruments::{
//!     BarrierFeature, BarrierType, InstrumentTerms, PayoffParams, StructuredProduct, UnderlyingAsset,
//! };
//! use pricer_risk::barrier::BarrierState;
//! use pricer_risk::config::EngineConfig;
//! use pricer_risk::orchestrator::{ValuationEngine, ValuationOptions};
//!
//! let as_of = Date::from_ymd(2024, 1, 2).unwrap();
//! let terms = InstrumentTerms::new("NOTE-1", Currency::USD, as_of, Date::from_ymd(2025, 1, 2).unwrap(), 10_000.0);
//! let note = StructuredProduct::new(
//!     terms,
//!     vec![UnderlyingAsset::new("ACME", 100.0, 140.0)],
//!     vec![BarrierFeature::new("KO-1", BarrierType::DownAndOut, "ACME", 0.7)],
//!     PayoffParams::participation(1.0).unwrap(),
//! )
//! .unwrap()
//! .into();
//! let snapshot = MarketSnapshot::new(as_of, 0.03).with_quote(UnderlyingQuote::new("ACME", 99.0, 0.25));
//!
//! let mut config = EngineConfig::default();
//! config.monte_carlo.paths = 2_000;
//! let engine = ValuationEngine::new(config).unwrap();
//! let result = engine
//!     .valuate(&note, &snapshot, &ValuationOptions::default().with_barriers())
//!     .unwrap();
//!
//! let status = &result.barrier_statuses.unwrap()[0];
//! assert_eq!(status.state, BarrierState::Approaching);
//! assert!(result.diagnostics.std_error.is_some());
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod barrier;
pub mod config;
pub mod margin;
pub mod orchestrator;
pub mod portfolio;
pub mod scenario;
pub mod service;
pub mod telemetry;
