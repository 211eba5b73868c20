//! Monte Carlo simulation configuration.

use std::time::Duration;

use super::error::ConfigError;

/// Maximum number of simulation paths allowed.
pub const MAX_PATHS: usize = 10_000_000;

/// Maximum number of time steps allowed per path.
pub const MAX_STEPS: usize = 10_000;

/// Monte Carlo simulation configuration.
///
/// Immutable; use [`MonteCarloConfigBuilder`] to construct instances.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::mc::MonteCarloConfig;
///
/// let config = MonteCarloConfig::builder()
///     .n_paths(10_000)
///     .steps_per_year(252)
///     .seed(42)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.n_paths(), 10_000);
/// assert_eq!(config.time_steps(0.5), 126);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct MonteCarloConfig {
    n_paths: usize,
    steps_per_year: usize,
    seed: u64,
    chunk_size: usize,
    antithetic: bool,
    continuity_correction: bool,
    step_budget: Option<u64>,
    deadline: Option<Duration>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            n_paths: 20_000,
            steps_per_year: 252,
            seed: 42,
            chunk_size: 1_024,
            antithetic: false,
            continuity_correction: true,
            step_budget: None,
            deadline: None,
        }
    }
}

impl MonteCarloConfig {
    /// Creates a new configuration builder seeded with the defaults.
    #[inline]
    pub fn builder() -> MonteCarloConfigBuilder {
        MonteCarloConfigBuilder {
            config: MonteCarloConfig::default(),
        }
    }

    /// Number of simulated samples (antithetic pairs count as one).
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.n_paths
    }

    /// Time steps per year of simulated life.
    #[inline]
    pub fn steps_per_year(&self) -> usize {
        self.steps_per_year
    }

    /// Run seed.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Paths per independently seeded chunk.
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Whether antithetic pairs are simulated.
    #[inline]
    pub fn antithetic(&self) -> bool {
        self.antithetic
    }

    /// Whether continuously monitored barriers are shifted by the
    /// Broadie-Glasserman-Kou correction.
    #[inline]
    pub fn continuity_correction(&self) -> bool {
        self.continuity_correction
    }

    /// Cap on total simulated path-steps.
    #[inline]
    pub fn step_budget(&self) -> Option<u64> {
        self.step_budget
    }

    /// Wall-clock limit for a single run.
    #[inline]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Number of time steps for a horizon of `expiry` years, at least one.
    pub fn time_steps(&self, expiry: f64) -> usize {
        let steps = (expiry.max(0.0) * self.steps_per_year as f64).ceil() as usize;
        steps.clamp(1, MAX_STEPS)
    }

    /// Same configuration with a different seed.
    pub fn with_seed(&self, seed: u64) -> Self {
        let mut out = self.clone();
        out.seed = seed;
        out
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_paths == 0 || self.n_paths > MAX_PATHS {
            return Err(ConfigError::InvalidPathCount(self.n_paths));
        }
        if self.steps_per_year == 0 || self.steps_per_year > MAX_STEPS {
            return Err(ConfigError::InvalidStepCount(self.steps_per_year));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "chunk_size",
                value: "must be positive".to_string(),
            });
        }
        if self.step_budget == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "step_budget",
                value: "must be positive when set".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for [`MonteCarloConfig`].
#[derive(Clone, Debug)]
pub struct MonteCarloConfigBuilder {
    config: MonteCarloConfig,
}

impl MonteCarloConfigBuilder {
    /// Sets the number of samples.
    #[inline]
    pub fn n_paths(mut self, n_paths: usize) -> Self {
        self.config.n_paths = n_paths;
        self
    }

    /// Sets the time step density.
    #[inline]
    pub fn steps_per_year(mut self, steps: usize) -> Self {
        self.config.steps_per_year = steps;
        self
    }

    /// Sets the run seed.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Sets the chunk size.
    #[inline]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Enables antithetic variates.
    #[inline]
    pub fn antithetic(mut self, enabled: bool) -> Self {
        self.config.antithetic = enabled;
        self
    }

    /// Enables the continuity correction for continuous barriers.
    #[inline]
    pub fn continuity_correction(mut self, enabled: bool) -> Self {
        self.config.continuity_correction = enabled;
        self
    }

    /// Caps total simulated path-steps.
    #[inline]
    pub fn step_budget(mut self, budget: Option<u64>) -> Self {
        self.config.step_budget = budget;
        self
    }

    /// Sets a wall-clock deadline.
    #[inline]
    pub fn deadline(mut self, deadline: Option<Duration>) -> Self {
        self.config.deadline = deadline;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<MonteCarloConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonteCarloConfig::default();
        assert_eq!(config.n_paths(), 20_000);
        assert_eq!(config.seed(), 42);
        assert!(config.continuity_correction());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_zero_paths() {
        let result = MonteCarloConfig::builder().n_paths(0).build();
        assert!(matches!(result, Err(ConfigError::InvalidPathCount(0))));
    }

    #[test]
    fn test_invalid_too_many_paths() {
        let result = MonteCarloConfig::builder().n_paths(MAX_PATHS + 1).build();
        assert!(matches!(result, Err(ConfigError::InvalidPathCount(_))));
    }

    #[test]
    fn test_invalid_zero_steps() {
        let result = MonteCarloConfig::builder().steps_per_year(0).build();
        assert!(matches!(result, Err(ConfigError::InvalidStepCount(0))));
    }

    #[test]
    fn test_time_steps_has_floor_of_one() {
        let config = MonteCarloConfig::default();
        assert_eq!(config.time_steps(0.0), 1);
        assert_eq!(config.time_steps(1.0), 252);
        assert_eq!(config.time_steps(1.001), 253);
    }
}
