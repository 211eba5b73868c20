//! Implied volatility: Newton–Raphson on the Black–Scholes price, with a
//! bisection fallback when vega vanishes, plus history-based analysis.

use pricer_core::market_data::{UnderlyingQuote, VolPoint};
use pricer_core::math::solvers::{NewtonRaphsonSolver, SolverConfig};
use pricer_core::types::{PricingError, SolverError};
use pricer_models::instruments::OptionType;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analytical::{BlackScholes, EXPIRY_EPSILON};

/// Solver and analysis settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpliedVolConfig {
    /// Starting volatility.
    pub initial_guess: f64,
    /// Price tolerance.
    pub tolerance: f64,
    /// Newton iteration cap.
    pub max_iterations: usize,
    /// Lower volatility clamp.
    pub min_volatility: f64,
    /// Upper volatility clamp.
    pub max_volatility: f64,
    /// Sample size for the confidence band when no history is available.
    pub confidence_sample: usize,
}

impl Default for ImpliedVolConfig {
    fn default() -> Self {
        Self {
            initial_guess: 0.3,
            tolerance: 1e-4,
            max_iterations: 100,
            min_volatility: 0.001,
            max_volatility: 3.0,
            confidence_sample: 252,
        }
    }
}

impl ImpliedVolConfig {
    /// Checks bounds and tolerances.
    pub fn validate(&self) -> Result<(), PricingError> {
        if !(self.min_volatility > 0.0 && self.min_volatility < self.max_volatility) {
            return Err(PricingError::Config(format!(
                "volatility clamp [{}, {}] is not a positive interval",
                self.min_volatility, self.max_volatility
            )));
        }
        if !(self.initial_guess >= self.min_volatility && self.initial_guess <= self.max_volatility) {
            return Err(PricingError::Config(format!(
                "initial guess {} outside the volatility clamp",
                self.initial_guess
            )));
        }
        if !(self.tolerance > 0.0) || self.max_iterations == 0 || self.confidence_sample == 0 {
            return Err(PricingError::Config(
                "tolerance, iterations and confidence sample must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Observed option quote to invert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpliedVolInputs {
    /// Observed option price.
    pub option_price: f64,
    /// Spot.
    pub spot: f64,
    /// Strike.
    pub strike: f64,
    /// Years to expiry.
    pub expiry: f64,
    /// Risk-free rate.
    pub rate: f64,
    /// Dividend yield.
    pub dividend: f64,
    /// Call or put.
    pub option_type: OptionType,
}

/// Solved volatility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolSolution {
    /// Implied volatility (best estimate when not converged).
    pub volatility: f64,
    /// Whether the price tolerance was met.
    pub converged: bool,
    /// Non-fatal conditions.
    pub warnings: Vec<String>,
}

/// Implied volatility with market context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolatilityAnalysis {
    /// Implied volatility.
    pub implied_volatility: f64,
    /// Whether the solver converged.
    pub converged: bool,
    /// Position within the history's range, in percent.
    pub iv_rank: Option<f64>,
    /// Share of history at or below the solved value, in percent.
    pub iv_percentile: Option<f64>,
    /// Lower end of the 95% band.
    pub confidence_95_lower: f64,
    /// Upper end of the 95% band.
    pub confidence_95_upper: f64,
    /// Quoted term structure merged with the solved point, by tenor.
    pub term_structure: Vec<VolPoint>,
    /// Non-fatal conditions.
    pub warnings: Vec<String>,
}

/// Implied volatility solver.
///
/// # Examples
///
/// ```
/// use pricer_pricing::implied_vol::{ImpliedVolInputs, ImpliedVolSolver};
/// use pricer_models::instruments::OptionType;
///
/// let solver = ImpliedVolSolver::with_defaults();
/// let solution = solver
///     .solve(&ImpliedVolInputs {
///         option_price: 10.4506,
///         spot: 100.0,
///         strike: 100.0,
///         expiry: 1.0,
///         rate: 0.05,
///         dividend: 0.0,
///         option_type: OptionType::Call,
///     })
///     .unwrap();
/// assert!((solution.volatility - 0.2).abs() < 1e-4);
/// ```
#[derive(Debug, Clone)]
pub struct ImpliedVolSolver {
    config: ImpliedVolConfig,
}

impl ImpliedVolSolver {
    /// Creates a solver after validating `config`.
    pub fn new(config: ImpliedVolConfig) -> Result<Self, PricingError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Solver with default settings.
    pub fn with_defaults() -> Self {
        Self {
            config: ImpliedVolConfig::default(),
        }
    }

    /// Solver settings.
    pub fn config(&self) -> &ImpliedVolConfig {
        &self.config
    }

    /// Inverts the Black–Scholes price.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the quote is non-positive, expired or outside the
    /// no-arbitrage bounds. Non-convergence is not an error: the best
    /// estimate is returned with `converged == false` and a warning.
    pub fn solve(&self, inputs: &ImpliedVolInputs) -> Result<ImpliedVolSolution, PricingError> {
        let t = inputs.expiry;
        if t <= EXPIRY_EPSILON {
            return Err(PricingError::InvalidInput(format!(
                "implied volatility undefined at {} years to expiry",
                t
            )));
        }
        if !(inputs.option_price.is_finite() && inputs.option_price > 0.0) {
            return Err(PricingError::InvalidInput(format!(
                "option price must be positive, got {}",
                inputs.option_price
            )));
        }
        let (lower, upper) = arbitrage_bounds(inputs);
        if inputs.option_price < lower - 1e-12 || inputs.option_price > upper + 1e-12 {
            return Err(PricingError::InvalidInput(format!(
                "option price {} outside no-arbitrage bounds [{:.6}, {:.6}]",
                inputs.option_price, lower, upper
            )));
        }

        let model = BlackScholes::new(inputs.spot, inputs.rate, inputs.dividend, self.config.initial_guess)?;
        let price_at = |sigma: f64| {
            model
                .with_volatility(sigma)
                .map_or(f64::NAN, |m| m.price(inputs.strike, t, inputs.option_type))
        };
        let objective = |sigma: f64| price_at(sigma) - inputs.option_price;
        let vega = |sigma: f64| {
            model
                .with_volatility(sigma)
                .map_or(f64::NAN, |m| m.greeks(inputs.strike, t, inputs.option_type).vega)
        };

        let solver = NewtonRaphsonSolver::new(
            SolverConfig::new(self.config.tolerance, self.config.max_iterations)
                .with_bounds(self.config.min_volatility, self.config.max_volatility),
        );
        let mut warnings = Vec::new();
        let (volatility, converged) = match solver.find_root(objective, vega, self.config.initial_guess) {
            Ok(sigma) => (sigma, true),
            Err(err) => {
                debug!(error = %err, "Newton iteration failed, bisecting");
                let sigma = self.bisect(&objective);
                let converged = objective(sigma).abs() < self.config.tolerance;
                if !converged {
                    let best = match err {
                        SolverError::MaxIterationsExceeded { last, .. }
                            if objective(last).abs() < objective(sigma).abs() =>
                        {
                            last
                        }
                        _ => sigma,
                    };
                    let non_convergence = PricingError::NumericalNonConvergence {
                        iterations: self.config.max_iterations,
                        best_estimate: best,
                    };
                    let msg = format!("{}; returning best estimate", non_convergence);
                    warn!("{}", msg);
                    warnings.push(msg);
                    return Ok(ImpliedVolSolution {
                        volatility: best,
                        converged: false,
                        warnings,
                    });
                }
                (sigma, converged)
            }
        };

        Ok(ImpliedVolSolution {
            volatility,
            converged,
            warnings,
        })
    }

    /// Solves and adds rank, percentile, confidence band and term structure
    /// from `quote`.
    pub fn analyse(
        &self,
        inputs: &ImpliedVolInputs,
        quote: &UnderlyingQuote,
    ) -> Result<ImpliedVolatilityAnalysis, PricingError> {
        let solution = self.solve(inputs)?;
        let iv = solution.volatility;
        let mut warnings = solution.warnings;

        let history: Vec<f64> = quote.iv_history.iter().copied().filter(|v| v.is_finite()).collect();
        let (iv_rank, iv_percentile) = if history.is_empty() {
            let msg = format!("no implied volatility history for {}; rank and percentile unavailable", quote.symbol);
            warn!("{}", msg);
            warnings.push(msg);
            (None, None)
        } else {
            (iv_rank(iv, &history), Some(iv_percentile(iv, &history)))
        };

        let n = if history.len() >= 2 {
            history.len()
        } else {
            self.config.confidence_sample
        };
        let half_width = 1.96 * iv / (2.0 * n as f64).sqrt();

        let mut term_structure: Vec<VolPoint> = quote
            .term_structure
            .iter()
            .filter(|p| (p.tenor - inputs.expiry).abs() > 1e-9)
            .cloned()
            .collect();
        term_structure.push(VolPoint {
            tenor: inputs.expiry,
            volatility: iv,
        });
        term_structure.sort_by(|a, b| a.tenor.total_cmp(&b.tenor));

        Ok(ImpliedVolatilityAnalysis {
            implied_volatility: iv,
            converged: solution.converged,
            iv_rank,
            iv_percentile,
            confidence_95_lower: (iv - half_width).max(self.config.min_volatility),
            confidence_95_upper: (iv + half_width).min(self.config.max_volatility),
            term_structure,
            warnings,
        })
    }

    fn bisect<F>(&self, objective: &F) -> f64
    where
        F: Fn(f64) -> f64,
    {
        let mut lo = self.config.min_volatility;
        let mut hi = self.config.max_volatility;
        let mut f_lo = objective(lo);
        for _ in 0..(2 * self.config.max_iterations) {
            let mid = 0.5 * (lo + hi);
            let f_mid = objective(mid);
            if !f_mid.is_finite() || f_mid.abs() < self.config.tolerance {
                return mid;
            }
            if (f_mid < 0.0) == (f_lo < 0.0) {
                lo = mid;
                f_lo = f_mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }
}

/// No-arbitrage price interval of a European option.
pub fn arbitrage_bounds(inputs: &ImpliedVolInputs) -> (f64, f64) {
    let forward_spot = inputs.spot * (-inputs.dividend * inputs.expiry).exp();
    let pv_strike = inputs.strike * (-inputs.rate * inputs.expiry).exp();
    match inputs.option_type {
        OptionType::Call => ((forward_spot - pv_strike).max(0.0), forward_spot),
        OptionType::Put => ((pv_strike - forward_spot).max(0.0), pv_strike),
    }
}

/// `(iv − min) / (max − min)` over the history, in percent.
///
/// `None` for a flat history.
pub fn iv_rank(iv: f64, history: &[f64]) -> Option<f64> {
    let min = history.iter().copied().fold(f64::INFINITY, f64::min);
    let max = history.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(max - min > 1e-12) {
        return None;
    }
    Some(((iv - min) / (max - min)).clamp(0.0, 1.0) * 100.0)
}

/// Share of observations at or below `iv`, in percent.
pub fn iv_percentile(iv: f64, history: &[f64]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let below = history.iter().filter(|&&v| v <= iv).count();
    below as f64 / history.len() as f64 * 100.0
}
