//! Request/response service façade.
//!
//! [`PricingService`] resolves identifiers through an
//! [`InstrumentRepository`] and snapshots through a [`MarketDataSource`],
//! then delegates to the [`ValuationEngine`].

mod repository;
mod requests;

pub use repository::{InMemoryInstrumentRepository, InMemoryMarketData, InstrumentRepository, MarketDataSource};
pub use requests::{
    BarrierMonitoringRequest, BarrierMonitoringResponse, GreeksRequest, GreeksResponse, ImpliedVolatilityRequest,
    ImpliedVolatilityResponse, MarginCalculationRequest, MarginPositionRequest, StructuredProductValuationRequest,
    ValuationResponse,
};

use std::time::Instant;

use pricer_core::market_data::{MarketSnapshot, UnderlyingQuote};
use pricer_core::types::PricingError;
use pricer_models::instruments::Instrument;
use pricer_pricing::implied_vol::ImpliedVolInputs;
use tracing::{debug, info_span, warn};

use crate::barrier::{BarrierAlert, MonitoringSummary};
use crate::margin::{MarginCalculationResult, MarginPosition};
use crate::orchestrator::{ValuationEngine, ValuationOptions};
use crate::scenario::ScenarioGrid;

/// Service façade over the valuation engine.
#[derive(Debug)]
pub struct PricingService<R, M> {
    engine: ValuationEngine,
    instruments: R,
    market: M,
}

impl<R: InstrumentRepository, M: MarketDataSource> PricingService<R, M> {
    /// Creates a service.
    pub fn new(engine: ValuationEngine, instruments: R, market: M) -> Self {
        Self {
            engine,
            instruments,
            market,
        }
    }

    /// Underlying engine.
    pub fn engine(&self) -> &ValuationEngine {
        &self.engine
    }

    /// Instrument repository.
    pub fn instruments(&self) -> &R {
        &self.instruments
    }

    /// Market data source.
    pub fn market(&self) -> &M {
        &self.market
    }

    /// Greeks with optional overrides on the primary underlying.
    pub fn greeks(&self, request: &GreeksRequest) -> Result<GreeksResponse, PricingError> {
        let start = Instant::now();
        let _span = info_span!("greeks", instrument = %request.instrument_id).entered();
        let instrument = self.instruments.instrument(&request.instrument_id)?;
        let mut snapshot = self.market.snapshot(None)?;
        override_primary(
            &mut snapshot,
            &instrument,
            request.underlying_price,
            request.volatility,
            request.dividend_yield,
        )?;
        if let Some(rate) = request.risk_free_rate {
            snapshot.risk_free_rate = rate;
        }

        let greeks = self.engine.greeks(&instrument, &snapshot, request.model)?;
        Ok(GreeksResponse {
            instrument_id: request.instrument_id.clone(),
            warnings: greeks.warnings.clone(),
            greeks,
            calculation_time_ms: elapsed_ms(start),
        })
    }

    /// Implied volatility analysis of an option price.
    pub fn implied_volatility(
        &self,
        request: &ImpliedVolatilityRequest,
    ) -> Result<ImpliedVolatilityResponse, PricingError> {
        let start = Instant::now();
        let _span = info_span!("implied_volatility", instrument = %request.instrument_id).entered();
        let instrument = self.instruments.instrument(&request.instrument_id)?;
        let Instrument::Option(option) = &instrument else {
            return Err(PricingError::InvalidInput(format!(
                "implied volatility needs an option, {} is a {}",
                request.instrument_id,
                instrument.kind()
            )));
        };
        let snapshot = self.market.snapshot(None)?;
        let quote = snapshot.quote(&option.underlying)?;

        let inputs = ImpliedVolInputs {
            option_price: request.option_price,
            spot: request.underlying_price.unwrap_or(quote.spot),
            strike: option.strike,
            expiry: request
                .time_to_expiration
                .unwrap_or_else(|| instrument.time_to_expiry(snapshot.as_of)),
            rate: request.risk_free_rate.unwrap_or(snapshot.risk_free_rate),
            dividend: request.dividend_yield.unwrap_or(quote.dividend_yield),
            option_type: option.option_type,
        };
        let analysis = self.engine.implied_volatility(&inputs, quote)?;
        Ok(ImpliedVolatilityResponse {
            instrument_id: request.instrument_id.clone(),
            warnings: analysis.warnings.clone(),
            analysis,
            calculation_time_ms: elapsed_ms(start),
        })
    }

    /// Full valuation with barrier statuses and optional Greeks and
    /// scenario grid.
    pub fn valuate_structured_product(
        &self,
        request: &StructuredProductValuationRequest,
    ) -> Result<ValuationResponse, PricingError> {
        let start = Instant::now();
        let instrument = self.instruments.instrument(&request.instrument_id)?;
        let snapshot = self.market.snapshot(request.valuation_date)?;

        let mut options = ValuationOptions::default().with_barriers();
        options.model = request.model_type;
        options.include_greeks = request.include_greeks;
        if request.scenario_analysis {
            options.scenario_grid = Some(ScenarioGrid::from_config(&self.engine.config().scenario)?);
        }

        let mut result = self.engine.valuate(&instrument, &snapshot, &options)?;
        let market_data = instrument
            .underlyings()
            .into_iter()
            .map(|symbol| snapshot.quote(symbol).cloned())
            .collect::<Result<Vec<UnderlyingQuote>, _>>()?;
        let scenario_analysis = result.scenarios.take();
        Ok(ValuationResponse {
            instrument_id: request.instrument_id.clone(),
            theoretical_value: result.value,
            market_data,
            warnings: result.warnings.clone(),
            model_results: result,
            scenario_analysis,
            calculation_time_ms: elapsed_ms(start),
        })
    }

    /// Barrier statuses, alerts and summary across the requested scope.
    ///
    /// Expired instruments are skipped with a warning; an unknown
    /// identifier fails the request.
    pub fn monitor_barriers(&self, request: &BarrierMonitoringRequest) -> Result<BarrierMonitoringResponse, PricingError> {
        let start = Instant::now();
        let snapshot = self.market.snapshot(None)?;

        let mut instruments: Vec<Instrument> = Vec::new();
        let mut push_unique = |instrument: Instrument| {
            if !instruments.iter().any(|i| i.instrument_id() == instrument.instrument_id()) {
                instruments.push(instrument);
            }
        };
        if let Some(ids) = &request.instrument_ids {
            for id in ids {
                push_unique(self.instruments.instrument(id)?);
            }
        }
        if let Some(ids) = &request.portfolio_ids {
            for id in ids {
                for position in self.instruments.portfolio(id)?.positions() {
                    push_unique(position.instrument.clone());
                }
            }
        }
        if request.instrument_ids.is_none() && request.portfolio_ids.is_none() {
            for id in self.instruments.instrument_ids() {
                push_unique(self.instruments.instrument(&id)?);
            }
        }

        let mut warnings = Vec::new();
        let mut active_barriers = Vec::new();
        for instrument in instruments.iter().filter(|i| !i.barriers().is_empty()) {
            if instrument.time_to_expiry(snapshot.as_of) <= 0.0 {
                let msg = format!("{} expired; barriers not monitored", instrument.instrument_id());
                warn!("{}", msg);
                warnings.push(msg);
                continue;
            }
            active_barriers.extend(self.engine.monitor_barriers(instrument, &snapshot, request.alert_threshold)?);
        }
        for warning in active_barriers.iter().flat_map(|s| &s.warnings) {
            if !warnings.contains(warning) {
                warnings.push(warning.clone());
            }
        }

        let mut alerts: Vec<BarrierAlert> = active_barriers.iter().filter_map(BarrierAlert::from_status).collect();
        alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
        let summary = MonitoringSummary::from_statuses(&active_barriers);
        debug!(barriers = summary.total, alerts = alerts.len(), "barrier monitoring complete");
        Ok(BarrierMonitoringResponse {
            active_barriers,
            alerts,
            summary,
            warnings,
            calculation_time_ms: elapsed_ms(start),
        })
    }

    /// SPAN-style margin for the requested positions.
    ///
    /// Prices and volatilities in the request override the snapshot. When
    /// no snapshot exists for the requested date, one is built from the
    /// request alone at the configured default rate.
    pub fn calculate_margin(&self, request: &MarginCalculationRequest) -> Result<MarginCalculationResult, PricingError> {
        let mut snapshot = match (self.market.snapshot(request.valuation_date), request.valuation_date) {
            (Ok(snapshot), _) => snapshot,
            (Err(PricingError::MarketDataUnavailable(_)), Some(date)) => {
                MarketSnapshot::new(date, self.engine.config().margin.default_rate)
            }
            (Err(e), _) => return Err(e),
        };
        if let Some(rate) = request.risk_free_rate {
            snapshot.risk_free_rate = rate;
        }
        for (symbol, &spot) in &request.underlying_prices {
            if snapshot.quotes.contains_key(symbol) {
                snapshot.quote_mut(symbol)?.spot = spot;
            } else {
                let volatility = request.volatilities.get(symbol).copied().ok_or_else(|| {
                    PricingError::MarketDataUnavailable(format!("no volatility for {}", symbol))
                })?;
                snapshot = snapshot.with_quote(UnderlyingQuote::new(symbol.clone(), spot, volatility));
            }
        }
        for (symbol, &volatility) in &request.volatilities {
            snapshot.quote_mut(symbol)?.volatility = volatility;
        }

        let positions = request
            .positions
            .iter()
            .map(|p| Ok(MarginPosition::new(self.instruments.instrument(&p.instrument_id)?, p.quantity)))
            .collect::<Result<Vec<_>, PricingError>>()?;
        self.engine
            .margin(&positions, &snapshot, request.scenario_shifts.as_deref())
    }
}

fn override_primary(
    snapshot: &mut MarketSnapshot,
    instrument: &Instrument,
    spot: Option<f64>,
    volatility: Option<f64>,
    dividend: Option<f64>,
) -> Result<(), PricingError> {
    let symbol = instrument
        .underlyings()
        .first()
        .map(|s| s.to_string())
        .ok_or_else(|| PricingError::InvalidInput("instrument has no underlying".to_string()))?;
    let quote = snapshot.quote_mut(&symbol)?;
    if let Some(spot) = spot {
        quote.spot = spot;
    }
    if let Some(volatility) = volatility {
        quote.volatility = volatility;
    }
    if let Some(dividend) = dividend {
        quote.dividend_yield = dividend;
    }
    Ok(())
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1_000.0
}
