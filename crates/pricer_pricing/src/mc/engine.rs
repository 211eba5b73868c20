//! Chunked, parallel geometric Brownian motion simulator.
//!
//! Paths are simulated in chunks of [`MonteCarloConfig::chunk_size`]; chunk
//! `i` draws from `PricerRng::for_stream(seed, i)`, so the estimate depends
//! only on the seed and path count, never on the thread count. Per-chunk
//! `(count, sum, sum of squares)` triples are combined with a rayon reduce.

use std::time::Instant;

use pricer_core::math::correlation::CholeskyFactor;
use pricer_core::types::PricingError;
use rayon::prelude::*;
use tracing::{debug, warn};

use super::config::MonteCarloConfig;
use super::error::ConfigError;
use super::payoff::{CompiledProduct, PathProduct, PathScratch};
use crate::rng::PricerRng;

/// Dynamics of one simulated asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetDynamics {
    /// Current spot.
    pub spot: f64,
    /// Volatility.
    pub volatility: f64,
    /// Dividend yield.
    pub dividend: f64,
}

/// Market inputs of a simulation.
#[derive(Debug, Clone)]
pub struct SimulationInputs {
    /// Simulated assets, in product order.
    pub assets: Vec<AssetDynamics>,
    /// Risk-free rate.
    pub rate: f64,
    /// Years to expiry.
    pub expiry: f64,
    /// Cholesky factor of the asset correlation matrix; `None` means
    /// independent assets.
    pub correlation: Option<CholeskyFactor>,
}

impl SimulationInputs {
    /// Single asset inputs.
    pub fn single(spot: f64, volatility: f64, dividend: f64, rate: f64, expiry: f64) -> Self {
        Self {
            assets: vec![AssetDynamics {
                spot,
                volatility,
                dividend,
            }],
            rate,
            expiry,
            correlation: None,
        }
    }
}

/// Monte Carlo estimate with diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Discounted mean payoff.
    pub price: f64,
    /// Standard error of the mean.
    pub std_error: f64,
    /// 95% confidence half-width.
    pub confidence_95: f64,
    /// Number of samples in the estimate.
    pub samples: usize,
    /// Time steps per path.
    pub time_steps: usize,
    /// Whether the step budget or deadline cut the run short.
    pub early_stop: bool,
    /// Non-fatal conditions.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
struct ChunkStats {
    count: usize,
    sum: f64,
    sum_sq: f64,
}

impl ChunkStats {
    #[inline]
    fn push(&mut self, x: f64) {
        self.count += 1;
        self.sum += x;
        self.sum_sq += x * x;
    }

    #[inline]
    fn merge(self, other: Self) -> Self {
        Self {
            count: self.count + other.count,
            sum: self.sum + other.sum,
            sum_sq: self.sum_sq + other.sum_sq,
        }
    }
}

/// Buffers reused across the paths of one chunk.
struct PathWorkspace {
    normals: Vec<f64>,
    path: Vec<f64>,
    scratch: PathScratch,
}

/// Monte Carlo engine.
///
/// # Examples
///
/// ```
/// use pricer_pricing::mc::{MonteCarloConfig, MonteCarloEngine, PathPayoff, PathProduct, SimulationInputs};
/// use pricer_models::instruments::OptionType;
///
/// let config = MonteCarloConfig::builder().n_paths(20_000).steps_per_year(12).build().unwrap();
/// let engine = MonteCarloEngine::new(config).unwrap();
/// let product = PathProduct::terminal(PathPayoff::Vanilla { option_type: OptionType::Call, strike: 100.0 });
///
/// let result = engine.run(&SimulationInputs::single(100.0, 0.2, 0.0, 0.05, 1.0), &product).unwrap();
/// assert!((result.price - 10.45).abs() < 4.0 * result.std_error + 0.05);
/// ```
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    config: MonteCarloConfig,
}

impl Default for MonteCarloEngine {
    fn default() -> Self {
        Self {
            config: MonteCarloConfig::default(),
        }
    }
}

impl MonteCarloEngine {
    /// Creates an engine after validating `config`.
    pub fn new(config: MonteCarloConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Engine configuration.
    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Simulates `product` under `inputs`.
    pub fn run(&self, inputs: &SimulationInputs, product: &PathProduct) -> Result<SimulationResult, PricingError> {
        let started = Instant::now();
        let n_assets = inputs.assets.len();
        if n_assets == 0 {
            return Err(PricingError::InvalidInput("simulation needs at least one asset".to_string()));
        }
        if let Some(factor) = &inputs.correlation {
            if factor.dim() != n_assets {
                return Err(PricingError::InternalConsistency(format!(
                    "correlation dimension {} does not match {} assets",
                    factor.dim(),
                    n_assets
                )));
            }
        }
        for asset in &inputs.assets {
            if !(asset.spot.is_finite() && asset.spot > 0.0) {
                return Err(PricingError::InvalidInput(format!("spot must be positive, got {}", asset.spot)));
            }
            if !(asset.volatility.is_finite() && asset.volatility > 0.0) {
                return Err(PricingError::InvalidInput(format!(
                    "volatility must be positive, got {}",
                    asset.volatility
                )));
            }
        }
        if inputs.expiry <= 0.0 {
            return Err(PricingError::InvalidInput(
                "simulation requires positive time to expiry".to_string(),
            ));
        }

        let mut warnings = Vec::new();
        let steps = self.config.time_steps(inputs.expiry);
        let mut samples = self.config.n_paths();
        let paths_per_sample = if self.config.antithetic() { 2 } else { 1 };
        if let Some(budget) = self.config.step_budget() {
            let cost = (steps * paths_per_sample) as u64;
            let affordable = (budget / cost.max(1)).max(1) as usize;
            if affordable < samples {
                let msg = format!(
                    "step budget {} caps Monte Carlo at {} of {} samples",
                    budget, affordable, samples
                );
                warn!("{}", msg);
                warnings.push(msg);
                samples = affordable;
            }
        }

        let dt = inputs.expiry / steps as f64;
        let sqrt_dt = dt.sqrt();
        let vols: Vec<f64> = inputs.assets.iter().map(|a| a.volatility).collect();
        let drift: Vec<f64> = inputs
            .assets
            .iter()
            .map(|a| (inputs.rate - a.dividend - 0.5 * a.volatility * a.volatility) * dt)
            .collect();
        let diffusion: Vec<f64> = vols.iter().map(|v| v * sqrt_dt).collect();
        let discount: Vec<f64> = (0..=steps).map(|i| (-inputs.rate * dt * i as f64).exp()).collect();
        let compiled = CompiledProduct::compile(
            product,
            inputs.expiry,
            steps,
            &vols,
            self.config.continuity_correction(),
        );

        let chunk_size = self.config.chunk_size();
        let n_chunks = samples.div_ceil(chunk_size);
        let deadline = self.config.deadline();
        let seed = self.config.seed();
        let antithetic = self.config.antithetic();

        let (stats, skipped) = (0..n_chunks)
            .into_par_iter()
            .map(|chunk| {
                if chunk > 0 {
                    if let Some(limit) = deadline {
                        if started.elapsed() > limit {
                            return (ChunkStats::default(), 1usize);
                        }
                    }
                }
                let len = chunk_size.min(samples - chunk * chunk_size);
                let mut rng = PricerRng::for_stream(seed, chunk as u64);
                let mut ws = PathWorkspace {
                    normals: vec![0.0; steps * n_assets],
                    path: vec![0.0; n_assets * (steps + 1)],
                    scratch: compiled.scratch(n_assets),
                };
                let mut stats = ChunkStats::default();
                for _ in 0..len {
                    rng.fill_normal(&mut ws.normals);
                    if let Some(factor) = &inputs.correlation {
                        for row in ws.normals.chunks_exact_mut(n_assets) {
                            factor.transform_inplace(row);
                        }
                    }
                    simulate(inputs, &drift, &diffusion, steps, &ws.normals, 1.0, &mut ws.path);
                    let mut value = compiled.evaluate(&ws.path, &discount, &mut ws.scratch);
                    if antithetic {
                        simulate(inputs, &drift, &diffusion, steps, &ws.normals, -1.0, &mut ws.path);
                        let mirror = compiled.evaluate(&ws.path, &discount, &mut ws.scratch);
                        value = 0.5 * (value + mirror);
                    }
                    stats.push(value);
                }
                (stats, 0usize)
            })
            .reduce(
                || (ChunkStats::default(), 0usize),
                |(a, sa), (b, sb)| (a.merge(b), sa + sb),
            );

        let early_stop = skipped > 0 || samples < self.config.n_paths();
        if skipped > 0 {
            let msg = format!(
                "deadline reached: {} of {} Monte Carlo chunks skipped, estimate uses {} samples",
                skipped, n_chunks, stats.count
            );
            warn!("{}", msg);
            warnings.push(msg);
        }

        let n = stats.count.max(1) as f64;
        let price = stats.sum / n;
        let variance = if stats.count > 1 {
            ((stats.sum_sq - n * price * price) / (n - 1.0)).max(0.0)
        } else {
            0.0
        };
        let std_error = (variance / n).sqrt();
        if !price.is_finite() || !std_error.is_finite() {
            return Err(PricingError::InternalConsistency(format!(
                "Monte Carlo produced non-finite estimate (price {}, std error {})",
                price, std_error
            )));
        }

        debug!(
            samples = stats.count,
            time_steps = steps,
            price,
            std_error,
            "Monte Carlo run complete"
        );

        Ok(SimulationResult {
            price,
            std_error,
            confidence_95: 1.96 * std_error,
            samples: stats.count,
            time_steps: steps,
            early_stop,
            warnings,
        })
    }
}

/// Builds one path from `normals` (step-major, `n_assets` per step),
/// scaled by `sign` for the antithetic mirror.
#[inline]
fn simulate(
    inputs: &SimulationInputs,
    drift: &[f64],
    diffusion: &[f64],
    steps: usize,
    normals: &[f64],
    sign: f64,
    path: &mut [f64],
) {
    let stride = steps + 1;
    for (a, asset) in inputs.assets.iter().enumerate() {
        let row = &mut path[a * stride..(a + 1) * stride];
        let mut log_s = asset.spot.ln();
        row[0] = asset.spot;
        for step in 0..steps {
            let z = sign * normals[step * inputs.assets.len() + a];
            log_s += drift[a] + diffusion[a] * z;
            row[step + 1] = log_s.exp();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytical::BlackScholes;
    use crate::mc::payoff::{PathBarrier, PathObservation, PathPayoff};
    use pricer_core::math::correlation::CorrelationMatrix;
    use pricer_models::instruments::{BarrierType, OptionType, PayoffParams};
    use std::time::Duration;

    fn engine(paths: usize, steps_per_year: usize) -> MonteCarloEngine {
        let config = MonteCarloConfig::builder()
            .n_paths(paths)
            .steps_per_year(steps_per_year)
            .build()
            .unwrap();
        MonteCarloEngine::new(config).unwrap()
    }

    fn call() -> PathProduct {
        PathProduct::terminal(PathPayoff::Vanilla {
            option_type: OptionType::Call,
            strike: 100.0,
        })
    }

    #[test]
    fn test_european_call_within_confidence_of_closed_form() {
        let result = engine(40_000, 4)
            .run(&SimulationInputs::single(100.0, 0.2, 0.0, 0.05, 1.0), &call())
            .unwrap();
        let bs = BlackScholes::new(100.0, 0.05, 0.0, 0.2).unwrap().price_call(100.0, 1.0);
        assert!((result.price - bs).abs() < 4.0 * result.std_error);
        assert_eq!(result.samples, 40_000);
        assert!(!result.early_stop);
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let inputs = SimulationInputs::single(100.0, 0.2, 0.0, 0.05, 1.0);
        let a = engine(5_000, 12).run(&inputs, &call()).unwrap();
        let b = engine(5_000, 12).run(&inputs, &call()).unwrap();
        assert_eq!(a.price, b.price);
    }

    #[test]
    fn test_antithetic_reduces_standard_error() {
        let inputs = SimulationInputs::single(100.0, 0.2, 0.0, 0.05, 1.0);
        let plain = engine(10_000, 4).run(&inputs, &call()).unwrap();
        let config = MonteCarloConfig::builder()
            .n_paths(10_000)
            .steps_per_year(4)
            .antithetic(true)
            .build()
            .unwrap();
        let anti = MonteCarloEngine::new(config).unwrap().run(&inputs, &call()).unwrap();
        assert!(anti.std_error < plain.std_error);
    }

    #[test]
    fn test_knock_out_is_cheaper_than_vanilla_note() {
        let note = PathPayoff::Note {
            payoff: PayoffParams::Participation { rate: 1.0 },
            weights: vec![1.0],
            initial_levels: vec![100.0],
        };
        let inputs = SimulationInputs::single(100.0, 0.25, 0.0, 0.03, 1.0);
        let plain = engine(10_000, 52).run(&inputs, &PathProduct::terminal(note.clone())).unwrap();
        let knocked = engine(10_000, 52)
            .run(
                &inputs,
                &PathProduct::terminal(note).with_barrier(PathBarrier {
                    asset: 0,
                    barrier_type: BarrierType::UpAndOut,
                    level: 130.0,
                    observation: PathObservation::Continuous,
                    rebate: 0.0,
                    coupon: 0.0,
                    already_hit: false,
                }),
            )
            .unwrap();
        assert!(knocked.price < plain.price);
    }

    #[test]
    fn test_correlated_basket_runs() {
        let note = PathPayoff::Note {
            payoff: PayoffParams::Basket { participation: 1.0 },
            weights: vec![0.5, 0.5],
            initial_levels: vec![100.0, 50.0],
        };
        let correlation = CorrelationMatrix::new(&[1.0, 0.6, 0.6, 1.0], 2).unwrap().cholesky().unwrap();
        let asset = |spot| AssetDynamics {
            spot,
            volatility: 0.2,
            dividend: 0.0,
        };
        let inputs = SimulationInputs {
            assets: vec![asset(100.0), asset(50.0)],
            rate: 0.02,
            expiry: 1.0,
            correlation: Some(correlation),
        };
        let result = engine(5_000, 12).run(&inputs, &PathProduct::terminal(note)).unwrap();
        assert!(result.price > (-0.02f64).exp());
        assert!(result.std_error > 0.0);
    }

    #[test]
    fn test_step_budget_caps_paths_with_warning() {
        let config = MonteCarloConfig::builder()
            .n_paths(10_000)
            .steps_per_year(10)
            .step_budget(Some(10_000))
            .build()
            .unwrap();
        let result = MonteCarloEngine::new(config)
            .unwrap()
            .run(&SimulationInputs::single(100.0, 0.2, 0.0, 0.05, 1.0), &call())
            .unwrap();
        assert_eq!(result.samples, 1_000);
        assert!(result.early_stop);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_zero_deadline_keeps_first_chunk() {
        let config = MonteCarloConfig::builder()
            .n_paths(8_192)
            .chunk_size(1_024)
            .steps_per_year(12)
            .deadline(Some(Duration::ZERO))
            .build()
            .unwrap();
        let result = MonteCarloEngine::new(config)
            .unwrap()
            .run(&SimulationInputs::single(100.0, 0.2, 0.0, 0.05, 1.0), &call())
            .unwrap();
        assert!(result.samples >= 1_024);
        assert!(result.price.is_finite());
    }

    #[test]
    fn test_rejects_zero_volatility() {
        let result = engine(100, 12).run(&SimulationInputs::single(100.0, 0.0, 0.0, 0.05, 1.0), &call());
        assert!(matches!(result, Err(PricingError::InvalidInput(_))));
    }
}
