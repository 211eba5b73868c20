//! Solver configuration types.

/// Configuration for root-finding algorithms.
///
/// ```
/// use pricer_core::math::solvers::SolverConfig;
///
/// let config = SolverConfig::default();
/// assert_eq!(config.max_iterations, 100);
///
/// let iv = SolverConfig::new(1e-4, 100).with_bounds(0.001, 3.0);
/// assert_eq!(iv.bounds, Some((0.001, 3.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// The solver stops when `|f(x)| < tolerance`.
    pub tolerance: f64,

    /// Maximum number of iterations before giving up.
    pub max_iterations: usize,

    /// Optional `[lower, upper]` clamp applied after every Newton step.
    pub bounds: Option<(f64, f64)>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 100,
            bounds: None,
        }
    }
}

impl SolverConfig {
    /// Create a new configuration without bounds.
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
            bounds: None,
        }
    }

    /// Clamp iterates to `[lower, upper]`.
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.bounds = Some((lower, upper));
        self
    }

    /// Checks tolerance, iteration budget and bounds ordering.
    pub fn is_valid(&self) -> bool {
        let bounds_ok = match self.bounds {
            Some((lo, hi)) => lo.is_finite() && hi.is_finite() && lo < hi,
            None => true,
        };
        self.tolerance > 0.0 && self.max_iterations > 0 && bounds_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert!((config.tolerance - 1e-10).abs() < 1e-15);
        assert!(config.is_valid());
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(!SolverConfig::new(1e-4, 10).with_bounds(3.0, 0.1).is_valid());
        assert!(!SolverConfig::new(0.0, 10).is_valid());
    }
}
