//! Market data snapshots.

mod snapshot;

pub use snapshot::{CorrelationEntry, MarketSnapshot, UnderlyingQuote, VolPoint};
