//! Barrier monitoring.
//!
//! - [`BarrierEvaluator`]: distance, state and breach probability per barrier
//! - [`BarrierStateStore`]: hit-state keyed by [`BarrierKey`] (instrument and barrier id)
//! - [`BarrierAlert`] and [`MonitoringSummary`]: derived reporting records

mod alert;
mod evaluator;
mod store;

pub use alert::{AlertSeverity, AlertType, BarrierAlert, MonitoringSummary};
pub use evaluator::{breach_probability, wilson_interval, BarrierEvaluator, BarrierState, BarrierStatus};
pub use store::{BarrierKey, BarrierObservationSample, BarrierRecord, BarrierStateStore, Transition};
