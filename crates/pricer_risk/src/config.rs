//! Engine configuration management.
//!
//! Loads [`EngineConfig`] from TOML files and `PRICER__SECTION__KEY`
//! environment variables. Every section falls back to its defaults when
//! omitted.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use pricer_core::types::PricingError;
use pricer_pricing::greeks::GreeksBumps;
use pricer_pricing::implied_vol::ImpliedVolConfig;
use pricer_pricing::mc::MonteCarloConfig;
use pricer_pricing::pricer::{PricingSettings, DEFAULT_LATTICE_STEPS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PRICER";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unknown log level.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// A value outside its allowed range.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Dotted field path
        field: &'static str,
        /// Reason
        message: String,
    },

    /// Reading or parsing a file failed.
    #[error("Configuration file error: {0}")]
    FileError(String),

    /// Layered source merge failed.
    #[error("Configuration source error: {0}")]
    SourceError(String),
}

impl From<ConfigError> for PricingError {
    fn from(err: ConfigError) -> Self {
        PricingError::Config(err.to_string())
    }
}

/// Log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything
    Trace,
    /// Engine diagnostics
    Debug,
    /// Barrier transitions and lifecycle
    #[default]
    Info,
    /// Warnings only
    Warn,
    /// Errors only
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Tracing filter directive.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Binomial lattice settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeSection {
    /// Tree depth.
    pub steps: usize,
}

impl Default for LatticeSection {
    fn default() -> Self {
        Self {
            steps: DEFAULT_LATTICE_STEPS,
        }
    }
}

/// Monte Carlo settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloSection {
    /// Samples per valuation.
    pub paths: usize,
    /// Time steps per year.
    pub steps_per_year: usize,
    /// Base seed.
    pub seed: u64,
    /// Paths per parallel chunk.
    pub chunk_size: usize,
    /// Cap on `paths × steps`.
    pub step_budget: Option<u64>,
    /// Wall-clock cap in milliseconds.
    pub deadline_ms: Option<u64>,
    /// Antithetic variates.
    pub antithetic: bool,
    /// Broadie–Glasserman–Kou barrier shift.
    pub continuity_correction: bool,
}

impl Default for MonteCarloSection {
    fn default() -> Self {
        Self {
            paths: 20_000,
            steps_per_year: 252,
            seed: 42,
            chunk_size: 1_024,
            step_budget: None,
            deadline_ms: None,
            antithetic: false,
            continuity_correction: true,
        }
    }
}

impl MonteCarloSection {
    /// Engine configuration.
    pub fn to_engine_config(&self) -> Result<MonteCarloConfig, PricingError> {
        Ok(MonteCarloConfig::builder()
            .n_paths(self.paths)
            .steps_per_year(self.steps_per_year)
            .seed(self.seed)
            .chunk_size(self.chunk_size)
            .step_budget(self.step_budget)
            .deadline(self.deadline_ms.map(Duration::from_millis))
            .antithetic(self.antithetic)
            .continuity_correction(self.continuity_correction)
            .build()?)
    }
}

/// Barrier monitoring settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierSection {
    /// Approach threshold in percent of spot.
    pub alert_threshold_pct: f64,
    /// Sample size behind the Wilson interval.
    pub wilson_sample: usize,
    /// Breach probability horizon in calendar days.
    pub horizon_days: u32,
}

impl Default for BarrierSection {
    fn default() -> Self {
        Self {
            alert_threshold_pct: 5.0,
            wilson_sample: 252,
            horizon_days: 30,
        }
    }
}

/// Scenario grid settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSection {
    /// Smallest spot shock (fraction).
    pub spot_min: f64,
    /// Largest spot shock (fraction).
    pub spot_max: f64,
    /// Spot shock step (fraction).
    pub spot_step: f64,
    /// Smallest volatility shock (absolute).
    pub vol_min: f64,
    /// Largest volatility shock (absolute).
    pub vol_max: f64,
    /// Volatility shock step (absolute).
    pub vol_step: f64,
}

impl Default for ScenarioSection {
    fn default() -> Self {
        Self {
            spot_min: -0.30,
            spot_max: 0.30,
            spot_step: 0.10,
            vol_min: -0.05,
            vol_max: 0.05,
            vol_step: 0.05,
        }
    }
}

/// SPAN-style margin settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginSection {
    /// Price scan range (fraction of spot).
    pub price_scan: f64,
    /// Volatility scan range (absolute).
    pub vol_scan: f64,
    /// Maintenance margin as a share of initial margin.
    pub maintenance_ratio: f64,
    /// Rate used when a request carries none.
    pub default_rate: f64,
}

impl Default for MarginSection {
    fn default() -> Self {
        Self {
            price_scan: 0.10,
            vol_scan: 0.04,
            maintenance_ratio: 0.75,
            default_rate: 0.0,
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelSection {
    /// Worker threads; `0` means one per core.
    pub worker_threads: usize,
}

impl Default for ParallelSection {
    fn default() -> Self {
        Self { worker_threads: 0 }
    }
}

impl ParallelSection {
    /// Resolved thread count.
    pub fn threads(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get()
        } else {
            self.worker_threads
        }
    }
}

/// Engine configuration.
///
/// # Examples
///
/// ```
/// use pricer_risk::config::EngineConfig;
///
/// let config = EngineConfig::from_toml_str(
///     r#"
///     log_level = "debug"
///
///     [lattice]
///     steps = 800
///
///     [barrier]
///     alert_threshold_pct = 7.5
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.lattice.steps, 800);
/// assert_eq!(config.monte_carlo.paths, 20_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level.
    pub log_level: LogLevel,
    /// Lattice settings.
    pub lattice: LatticeSection,
    /// Monte Carlo settings.
    pub monte_carlo: MonteCarloSection,
    /// Finite-difference bumps.
    pub greeks: GreeksBumps,
    /// Barrier monitoring.
    pub barrier: BarrierSection,
    /// Implied volatility solver.
    pub implied_vol: ImpliedVolConfig,
    /// Scenario grid.
    pub scenario: ScenarioSection,
    /// Margin scan.
    pub margin: MarginSection,
    /// Worker pool.
    pub parallel: ParallelSection,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            lattice: LatticeSection::default(),
            monte_carlo: MonteCarloSection::default(),
            greeks: GreeksBumps::default(),
            barrier: BarrierSection::default(),
            implied_vol: ImpliedVolConfig::default(),
            scenario: ScenarioSection::default(),
            margin: MarginSection::default(),
            parallel: ParallelSection::default(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Builds configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (`PRICER__MONTE_CARLO__PATHS=50000`)
    /// 2. Config file, when given
    /// 3. Default values
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
        let config: EngineConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::SourceError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates ranges across sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, message: String| Err(ConfigError::InvalidValue { field, message });
        if self.lattice.steps == 0 {
            return invalid("lattice.steps", "must be positive".to_string());
        }
        self.monte_carlo
            .to_engine_config()
            .map_err(|e| ConfigError::InvalidValue {
                field: "monte_carlo",
                message: e.to_string(),
            })?;
        self.greeks.validate().map_err(|e| ConfigError::InvalidValue {
            field: "greeks",
            message: e.to_string(),
        })?;
        self.implied_vol.validate().map_err(|e| ConfigError::InvalidValue {
            field: "implied_vol",
            message: e.to_string(),
        })?;
        let threshold = self.barrier.alert_threshold_pct;
        if !(threshold > 0.0 && threshold <= 100.0) {
            return invalid("barrier.alert_threshold_pct", format!("{} not in (0, 100]", threshold));
        }
        if self.barrier.wilson_sample == 0 || self.barrier.horizon_days == 0 {
            return invalid("barrier", "wilson_sample and horizon_days must be positive".to_string());
        }
        let s = &self.scenario;
        if !(s.spot_step > 0.0 && s.vol_step > 0.0 && s.spot_min <= s.spot_max && s.vol_min <= s.vol_max) {
            return invalid("scenario", "steps must be positive and ranges ordered".to_string());
        }
        if s.spot_min <= -1.0 {
            return invalid("scenario.spot_min", format!("{} would make spots non-positive", s.spot_min));
        }
        let m = &self.margin;
        if !(m.price_scan > 0.0 && m.price_scan < 1.0 / 3.0 && m.vol_scan >= 0.0) {
            return invalid("margin", "price scan must lie in (0, 1/3) and vol scan be non-negative".to_string());
        }
        if !(m.maintenance_ratio > 0.0 && m.maintenance_ratio <= 1.0) {
            return invalid("margin.maintenance_ratio", format!("{} not in (0, 1]", m.maintenance_ratio));
        }
        Ok(())
    }

    /// Pricing settings for the engines.
    pub fn pricing_settings(&self) -> Result<PricingSettings, PricingError> {
        Ok(PricingSettings {
            lattice_steps: self.lattice.steps,
            monte_carlo: self.monte_carlo.to_engine_config()?,
        })
    }
}
