//! Collaborator seams for instruments and market data.
//!
//! The engine performs no I/O. Hosts implement these traits over their own
//! storage and feeds; the in-memory versions serve tests and embedding.

use std::collections::BTreeMap;
use std::sync::RwLock;

use pricer_core::market_data::MarketSnapshot;
use pricer_core::types::{Date, PricingError};
use pricer_models::instruments::Instrument;

use crate::portfolio::{Portfolio, PortfolioId};

/// Resolves instruments and portfolios by identifier.
pub trait InstrumentRepository: Send + Sync {
    /// Instrument with `instrument_id`.
    ///
    /// # Errors
    ///
    /// `InstrumentNotFound` when unknown.
    fn instrument(&self, instrument_id: &str) -> Result<Instrument, PricingError>;

    /// Portfolio with `portfolio_id`.
    ///
    /// # Errors
    ///
    /// `InstrumentNotFound` when unknown.
    fn portfolio(&self, portfolio_id: &PortfolioId) -> Result<Portfolio, PricingError>;

    /// Every known instrument identifier.
    fn instrument_ids(&self) -> Vec<String>;
}

/// Supplies market snapshots.
pub trait MarketDataSource: Send + Sync {
    /// Snapshot as of `date`, or the latest one when `None`.
    ///
    /// # Errors
    ///
    /// `MarketDataUnavailable` when no snapshot exists.
    fn snapshot(&self, date: Option<Date>) -> Result<MarketSnapshot, PricingError>;
}

/// Instrument repository backed by maps.
#[derive(Debug, Default)]
pub struct InMemoryInstrumentRepository {
    instruments: RwLock<BTreeMap<String, Instrument>>,
    portfolios: RwLock<BTreeMap<PortfolioId, Portfolio>>,
}

impl InMemoryInstrumentRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an instrument under its identifier, replacing any previous one.
    pub fn insert(&self, instrument: Instrument) -> Result<(), PricingError> {
        let mut map = self.instruments.write().map_err(|_| poisoned())?;
        map.insert(instrument.instrument_id().to_string(), instrument);
        Ok(())
    }

    /// Stores a portfolio and its instruments.
    pub fn insert_portfolio(&self, portfolio: Portfolio) -> Result<(), PricingError> {
        for position in portfolio.positions() {
            self.insert(position.instrument.clone())?;
        }
        let mut map = self.portfolios.write().map_err(|_| poisoned())?;
        map.insert(portfolio.id().clone(), portfolio);
        Ok(())
    }
}

impl InstrumentRepository for InMemoryInstrumentRepository {
    fn instrument(&self, instrument_id: &str) -> Result<Instrument, PricingError> {
        let map = self.instruments.read().map_err(|_| poisoned())?;
        map.get(instrument_id)
            .cloned()
            .ok_or_else(|| PricingError::InstrumentNotFound(instrument_id.to_string()))
    }

    fn portfolio(&self, portfolio_id: &PortfolioId) -> Result<Portfolio, PricingError> {
        let map = self.portfolios.read().map_err(|_| poisoned())?;
        map.get(portfolio_id)
            .cloned()
            .ok_or_else(|| PricingError::InstrumentNotFound(format!("portfolio {}", portfolio_id)))
    }

    fn instrument_ids(&self) -> Vec<String> {
        self.instruments
            .read()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Market data source backed by dated snapshots.
#[derive(Debug, Default)]
pub struct InMemoryMarketData {
    snapshots: RwLock<BTreeMap<Date, MarketSnapshot>>,
}

impl InMemoryMarketData {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Source holding one snapshot.
    pub fn with_snapshot(snapshot: MarketSnapshot) -> Self {
        let source = Self::new();
        if let Ok(mut map) = source.snapshots.write() {
            map.insert(snapshot.as_of, snapshot);
        }
        source
    }

    /// Stores a snapshot under its as-of date.
    pub fn insert(&self, snapshot: MarketSnapshot) -> Result<(), PricingError> {
        let mut map = self.snapshots.write().map_err(|_| poisoned())?;
        map.insert(snapshot.as_of, snapshot);
        Ok(())
    }
}

impl MarketDataSource for InMemoryMarketData {
    fn snapshot(&self, date: Option<Date>) -> Result<MarketSnapshot, PricingError> {
        let map = self.snapshots.read().map_err(|_| poisoned())?;
        let found = match date {
            Some(date) => map.get(&date),
            None => map.values().next_back(),
        };
        found.cloned().ok_or_else(|| {
            PricingError::MarketDataUnavailable(match date {
                Some(date) => format!("no snapshot for {}", date),
                None => "no snapshot loaded".to_string(),
            })
        })
    }
}

fn poisoned() -> PricingError {
    PricingError::InternalConsistency("repository lock poisoned".to_string())
}
