//! # Pricer Models (L2: Instruments)
//!
//! Instrument definitions consumed by the pricing engines:
//! - [`instruments::Instrument`]: options, futures and structured products
//! - [`instruments::BarrierFeature`]: the eight barrier variants and their hit state
//! - [`instruments::PayoffParams`]: closed set of structured payoff parameters
//!
//! ## Design Principles
//!
//! - **Enum-based instruments** with exhaustive matching in the engines
//! - **Validation at construction** via `new` constructors and `validate`
//! - **Serde-friendly** so term-sheet output deserialises directly

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod instruments;
