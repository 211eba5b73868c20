//! Barrier distance, state classification and breach probability.

use pricer_core::market_data::MarketSnapshot;
use pricer_core::math::distributions::norm_cdf;
use pricer_core::types::PricingError;
use pricer_models::instruments::{
    BarrierDirection, BarrierFeature, BarrierId, BarrierType, Instrument, StructuredProduct,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::{BarrierKey, BarrierObservationSample, BarrierRecord, BarrierStateStore};
use crate::config::BarrierSection;

/// 97.5% standard normal quantile.
const Z_95: f64 = 1.959_963_984_540_054;

/// Classified barrier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarrierState {
    /// Outside the alert threshold.
    Safe,
    /// Within the alert threshold.
    Approaching,
    /// Hit, or permanently knocked.
    Hit,
    /// Previously hit, now back outside the level.
    Recovered,
}

/// Point-in-time evaluation of one barrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrierStatus {
    /// Barrier identifier.
    pub barrier_id: BarrierId,
    /// Owning instrument.
    pub instrument_id: String,
    /// Barrier variant.
    pub barrier_type: BarrierType,
    /// Monitored underlying.
    pub underlying: String,
    /// Spot of the underlying.
    pub current_level: f64,
    /// Resolved absolute barrier level.
    pub barrier_level: f64,
    /// Signed distance, positive while not breached.
    pub distance: f64,
    /// Distance in percent of spot.
    pub distance_pct: f64,
    /// Classified state.
    pub state: BarrierState,
    /// Whether today is an observation date.
    pub observed: bool,
    /// Probability of a breach within the horizon.
    pub breach_probability: f64,
    /// Lower Wilson bound.
    pub ci_lower: f64,
    /// Upper Wilson bound.
    pub ci_upper: f64,
    /// Non-fatal observations about the inputs.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Evaluates barriers against a snapshot and records hits in a store.
///
/// # Examples
///
/// ```
/// use pricer_risk::barrier::{BarrierEvaluator, BarrierState};
/// use pricer_models::instruments::{BarrierFeature, BarrierType};
///
/// let evaluator = BarrierEvaluator::default();
/// let barrier = BarrierFeature::new("B1", BarrierType::DownAndOut, "ACME", 0.7);
/// let status = evaluator.classify(&barrier, 140.0, 99.0, 0.25, None);
/// assert!((status.barrier_level - 98.0).abs() < 1e-9);
/// assert_eq!(status.state, BarrierState::Approaching);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrierEvaluator {
    alert_threshold_pct: f64,
    wilson_sample: usize,
    horizon_days: u32,
}

impl Default for BarrierEvaluator {
    fn default() -> Self {
        Self::from_config(&BarrierSection::default())
    }
}

impl BarrierEvaluator {
    /// Evaluator from the barrier configuration section.
    pub fn from_config(section: &BarrierSection) -> Self {
        Self {
            alert_threshold_pct: section.alert_threshold_pct,
            wilson_sample: section.wilson_sample.max(1),
            horizon_days: section.horizon_days.max(1),
        }
    }

    /// Overrides the approach threshold (percent of spot).
    pub fn with_alert_threshold(mut self, pct: f64) -> Result<Self, PricingError> {
        if !(pct > 0.0 && pct <= 100.0) {
            return Err(PricingError::InvalidInput(format!(
                "alert threshold must be in (0, 100], got {}",
                pct
            )));
        }
        self.alert_threshold_pct = pct;
        Ok(self)
    }

    /// Approach threshold in percent.
    pub fn alert_threshold_pct(&self) -> f64 {
        self.alert_threshold_pct
    }

    /// Breach horizon in years.
    pub fn horizon(&self) -> f64 {
        self.horizon_days as f64 / 365.0
    }

    /// Evaluates every barrier of `instrument`, recording hits in `store`.
    ///
    /// Options and futures carry no barriers and yield an empty list.
    /// Discrete barriers register hits only on their observation dates.
    pub fn evaluate(
        &self,
        instrument: &Instrument,
        snapshot: &MarketSnapshot,
        store: &BarrierStateStore,
    ) -> Result<Vec<BarrierStatus>, PricingError> {
        let Instrument::StructuredProduct(product) = instrument else {
            return Ok(Vec::new());
        };
        product
            .barriers
            .iter()
            .map(|barrier| self.evaluate_one(product, barrier, snapshot, store))
            .collect()
    }

    fn evaluate_one(
        &self,
        product: &StructuredProduct,
        barrier: &BarrierFeature,
        snapshot: &MarketSnapshot,
        store: &BarrierStateStore,
    ) -> Result<BarrierStatus, PricingError> {
        let initial = product
            .underlyings
            .iter()
            .find(|a| a.symbol == barrier.underlying)
            .map(|a| a.initial_level)
            .ok_or_else(|| {
                PricingError::InvalidInput(format!(
                    "barrier {} references unknown underlying {}",
                    barrier.id, barrier.underlying
                ))
            })?;
        let quote = snapshot.quote(&barrier.underlying)?;
        let key = BarrierKey::new(product.terms.instrument_id.clone(), barrier.id.clone());
        let mut warnings = Vec::new();
        if quote.volatility <= 0.0 {
            warn!(
                barrier = %key,
                volatility = quote.volatility,
                "non-positive volatility; breach probability is degenerate"
            );
            warnings.push(format!(
                "non-positive volatility {} for {}; breach probability of barrier {} is degenerate",
                quote.volatility, barrier.underlying, key
            ));
        }

        let level = barrier.resolve_level(initial);
        let observed = barrier.observation.observes_on(snapshot.as_of);
        let record = if observed {
            let sample = BarrierObservationSample {
                date: snapshot.as_of,
                level: quote.spot,
                breached: barrier.is_breached(quote.spot, level),
                recoverable: barrier.barrier_type.is_recoverable(),
            };
            store.observe(&key, barrier.hit_state, sample)?.0
        } else {
            store.current(&key, barrier.hit_state)?
        };

        let mut status = self.classify(barrier, initial, quote.spot, quote.volatility, Some(record));
        status.instrument_id = product.terms.instrument_id.clone();
        status.observed = observed;
        status.warnings = warnings;
        debug!(
            barrier = %status.barrier_id,
            state = ?status.state,
            distance_pct = status.distance_pct,
            breach_probability = status.breach_probability,
            "barrier evaluated"
        );
        Ok(status)
    }

    /// Classifies a barrier from spot, volatility and recorded state alone.
    ///
    /// `record = None` treats the barrier as never hit and breached only if
    /// the spot is through the level now.
    pub fn classify(
        &self,
        barrier: &BarrierFeature,
        initial_level: f64,
        spot: f64,
        volatility: f64,
        record: Option<BarrierRecord>,
    ) -> BarrierStatus {
        let level = barrier.resolve_level(initial_level);
        let distance = barrier.signed_distance(spot, level);
        let distance_pct = distance / spot * 100.0;
        let record = record.unwrap_or(BarrierRecord {
            hit_state: barrier.hit_state,
            breached: barrier.is_breached(spot, level),
        });
        let recoverable = barrier.barrier_type.is_recoverable();

        let state = if record.breached || (record.hit_state.has_been_hit && !recoverable) {
            BarrierState::Hit
        } else if record.hit_state.has_been_hit {
            BarrierState::Recovered
        } else if distance_pct <= self.alert_threshold_pct {
            BarrierState::Approaching
        } else {
            BarrierState::Safe
        };

        let breach_probability = if state == BarrierState::Hit {
            1.0
        } else {
            breach_probability(barrier.direction(), spot, level, volatility, self.horizon())
        };
        let (ci_lower, ci_upper) = wilson_interval(breach_probability, self.wilson_sample);

        BarrierStatus {
            barrier_id: barrier.id.clone(),
            instrument_id: String::new(),
            barrier_type: barrier.barrier_type,
            underlying: barrier.underlying.clone(),
            current_level: spot,
            barrier_level: level,
            distance,
            distance_pct,
            state,
            observed: true,
            breach_probability,
            ci_lower,
            ci_upper,
            warnings: Vec::new(),
        }
    }
}

/// Lognormal first-passage breach estimate over `horizon` years.
///
/// Down barriers: `Φ(ln(B/S) / (σ√h))`; up barriers: `1 − Φ(·)`. A spot at
/// or through the level gives 1; zero volatility or horizon gives 0 unless
/// already breached.
pub fn breach_probability(direction: BarrierDirection, spot: f64, barrier: f64, volatility: f64, horizon: f64) -> f64 {
    let breached = match direction {
        BarrierDirection::Down => spot <= barrier,
        BarrierDirection::Up => spot >= barrier,
    };
    if breached {
        return 1.0;
    }
    let scale = volatility * horizon.sqrt();
    if !(scale > 0.0 && scale.is_finite()) {
        return 0.0;
    }
    let z = (barrier / spot).ln() / scale;
    let p = match direction {
        BarrierDirection::Down => norm_cdf(z),
        BarrierDirection::Up => 1.0 - norm_cdf(z),
    };
    p.clamp(0.0, 1.0)
}

/// Wilson score interval for a proportion `p` observed over `n` trials.
pub fn wilson_interval(p: f64, n: usize) -> (f64, f64) {
    let n = n.max(1) as f64;
    let z2 = Z_95 * Z_95;
    let denom = 1.0 + z2 / n;
    let centre = (p + z2 / (2.0 * n)) / denom;
    let half = Z_95 / denom * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();
    ((centre - half).max(0.0), (centre + half).min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_core::market_data::UnderlyingQuote;
    use pricer_core::types::{Currency, Date};
    use pricer_models::instruments::{InstrumentTerms, PayoffParams, UnderlyingAsset};
    use proptest::prelude::*;

    fn as_of() -> Date {
        Date::from_ymd(2024, 6, 3).unwrap()
    }

    fn note(barriers: Vec<BarrierFeature>) -> Instrument {
        let terms = InstrumentTerms::new("NOTE-1", Currency::USD, as_of(), Date::from_ymd(2026, 6, 3).unwrap(), 1_000.0);
        StructuredProduct::new(
            terms,
            vec![UnderlyingAsset::new("ACME", 100.0, 140.0)],
            barriers,
            PayoffParams::participation(1.0).unwrap(),
        )
        .unwrap()
        .into()
    }

    fn snapshot(spot: f64) -> MarketSnapshot {
        MarketSnapshot::new(as_of(), 0.03).with_quote(UnderlyingQuote::new("ACME", spot, 0.25))
    }

    // ========================================
    // Classification
    // ========================================

    #[test]
    fn test_down_and_out_approaching_then_hit() {
        let instrument = note(vec![BarrierFeature::new("KO", BarrierType::DownAndOut, "ACME", 0.7)]);
        let evaluator = BarrierEvaluator::default();
        let store = BarrierStateStore::new();

        let status = &evaluator.evaluate(&instrument, &snapshot(99.0), &store).unwrap()[0];
        assert_relative_eq!(status.barrier_level, 98.0, epsilon = 1e-12);
        assert_relative_eq!(status.distance, 1.0, epsilon = 1e-12);
        assert_eq!(status.state, BarrierState::Approaching);
        assert_eq!(status.instrument_id, "NOTE-1");

        let status = &evaluator.evaluate(&instrument, &snapshot(98.0), &store).unwrap()[0];
        assert_eq!(status.state, BarrierState::Hit);
        assert_eq!(status.breach_probability, 1.0);

        // knock-out is permanent
        let status = &evaluator.evaluate(&instrument, &snapshot(130.0), &store).unwrap()[0];
        assert_eq!(status.state, BarrierState::Hit);
    }

    #[test]
    fn test_coupon_barrier_recovers() {
        let instrument = note(vec![BarrierFeature::new("CPN", BarrierType::CouponDown, "ACME", 0.8)]);
        let evaluator = BarrierEvaluator::default();
        let store = BarrierStateStore::new();

        let status = &evaluator.evaluate(&instrument, &snapshot(100.0), &store).unwrap()[0];
        assert_eq!(status.state, BarrierState::Hit);
        let status = &evaluator.evaluate(&instrument, &snapshot(150.0), &store).unwrap()[0];
        assert_eq!(status.state, BarrierState::Recovered);
        assert!(status.breach_probability < 1.0);
    }

    #[test]
    fn test_safe_outside_threshold() {
        let instrument = note(vec![BarrierFeature::new("UP", BarrierType::UpAndOut, "ACME", 200.0)]);
        let status = &BarrierEvaluator::default()
            .evaluate(&instrument, &snapshot(140.0), &BarrierStateStore::new())
            .unwrap()[0];
        assert_eq!(status.state, BarrierState::Safe);
        assert!(status.distance > 0.0);
    }

    #[test]
    fn test_discrete_barrier_ignores_non_observation_dates() {
        let obs = Date::from_ymd(2024, 12, 2).unwrap();
        let instrument = note(vec![
            BarrierFeature::new("KI", BarrierType::DownAndIn, "ACME", 0.7).with_observation_dates(vec![obs])
        ]);
        let evaluator = BarrierEvaluator::default();
        let store = BarrierStateStore::new();

        let status = &evaluator.evaluate(&instrument, &snapshot(90.0), &store).unwrap()[0];
        assert!(!status.observed);
        assert_eq!(status.state, BarrierState::Approaching);

        let on_date = snapshot(90.0).with_date_shift(obs - as_of());
        let status = &evaluator.evaluate(&instrument, &on_date, &store).unwrap()[0];
        assert!(status.observed);
        assert_eq!(status.state, BarrierState::Hit);
    }

    #[test]
    fn test_options_have_no_barriers() {
        use pricer_models::instruments::{EquityOption, ExerciseStyle, OptionType};
        let terms = InstrumentTerms::new("OPT", Currency::USD, as_of(), Date::from_ymd(2025, 6, 3).unwrap(), 1.0);
        let option: Instrument = EquityOption::new(terms, "ACME", 100.0, OptionType::Put, ExerciseStyle::European)
            .unwrap()
            .into();
        let statuses = BarrierEvaluator::default()
            .evaluate(&option, &snapshot(100.0), &BarrierStateStore::new())
            .unwrap();
        assert!(statuses.is_empty());
    }

    #[test]
    fn test_zero_volatility_is_reported_on_status() {
        let instrument = note(vec![BarrierFeature::new("KO", BarrierType::DownAndOut, "ACME", 0.7)]);
        let snapshot = MarketSnapshot::new(as_of(), 0.03).with_quote(UnderlyingQuote::new("ACME", 120.0, 0.0));
        let status = &BarrierEvaluator::default()
            .evaluate(&instrument, &snapshot, &BarrierStateStore::new())
            .unwrap()[0];
        assert_eq!(status.breach_probability, 0.0);
        assert_eq!(status.warnings.len(), 1);
        assert!(status.warnings[0].contains("non-positive volatility"));

        let healthy = &BarrierEvaluator::default()
            .evaluate(&instrument, &self::snapshot(120.0), &BarrierStateStore::new())
            .unwrap()[0];
        assert!(healthy.warnings.is_empty());
    }

    #[test]
    fn test_threshold_validation() {
        assert!(BarrierEvaluator::default().with_alert_threshold(0.0).is_err());
        assert!(BarrierEvaluator::default().with_alert_threshold(10.0).is_ok());
    }

    // ========================================
    // Breach probability
    // ========================================

    #[test]
    fn test_breach_probability_closed_values() {
        // ln(98/99) / (0.25 * sqrt(30/365))
        let h: f64 = 30.0 / 365.0;
        let z = (98.0f64 / 99.0).ln() / (0.25 * h.sqrt());
        let p = breach_probability(BarrierDirection::Down, 99.0, 98.0, 0.25, h);
        assert_relative_eq!(p, norm_cdf(z), epsilon = 1e-12);
        assert_eq!(breach_probability(BarrierDirection::Up, 120.0, 110.0, 0.25, h), 1.0);
        assert_eq!(breach_probability(BarrierDirection::Down, 120.0, 110.0, 0.0, h), 0.0);
    }

    #[test]
    fn test_wilson_interval_brackets_estimate() {
        let (lo, hi) = wilson_interval(0.3, 252);
        assert!(lo < 0.3 && 0.3 < hi);
        let (lo, hi) = wilson_interval(1.0, 252);
        assert!(lo > 0.95 && hi == 1.0);
    }

    proptest! {
        #[test]
        fn prop_breach_probability_bounded_and_monotone(
            barrier in 50.0f64..150.0,
            gap in 0.01f64..0.5,
            shrink in 0.1f64..0.9,
            vol in 0.05f64..1.0,
            days in 1u32..365,
        ) {
            let h = days as f64 / 365.0;
            // down barrier: spot above the level
            let far = barrier * (1.0 + gap);
            let near = barrier * (1.0 + gap * shrink);
            let p_far = breach_probability(BarrierDirection::Down, far, barrier, vol, h);
            let p_near = breach_probability(BarrierDirection::Down, near, barrier, vol, h);
            prop_assert!((0.0..=1.0).contains(&p_far));
            prop_assert!((0.0..=1.0).contains(&p_near));
            prop_assert!(p_near >= p_far);

            // up barrier: spot below the level
            let far = barrier / (1.0 + gap);
            let near = barrier / (1.0 + gap * shrink);
            let p_far = breach_probability(BarrierDirection::Up, far, barrier, vol, h);
            let p_near = breach_probability(BarrierDirection::Up, near, barrier, vol, h);
            prop_assert!((0.0..=1.0).contains(&p_far));
            prop_assert!(p_near >= p_far);

            let (lo, hi) = wilson_interval(p_near, 252);
            prop_assert!(0.0 <= lo && lo <= hi && hi <= 1.0);
        }
    }
}
