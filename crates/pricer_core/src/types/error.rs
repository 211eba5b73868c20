//! Error types for structured error handling.
//!
//! This module provides:
//! - `PricingError`: the single error surfaced by valuation entry points
//! - `DateError`: Errors from date construction and parsing
//! - `SolverError`: Errors from root-finding solvers
//! - `CorrelationError`: Errors from correlation matrix construction
//!
//! Layer-specific errors convert into `PricingError` via `From`, so `?`
//! can be used across layer boundaries.

use thiserror::Error;

/// Categorised pricing errors.
///
/// # Variants
/// - `InvalidInput`: rejected before any model runs
/// - `InstrumentNotFound` / `MarketDataUnavailable`: collaborator lookups failed
/// - `NumericalNonConvergence`: an iterative solver ran out of budget
/// - `UnsupportedModel`: model selector and engine disagree
/// - `InternalConsistency`: NaN or infinity produced by an engine
/// - `Config`: invalid engine configuration
///
/// # Examples
/// ```
/// use pricer_core::types::PricingError;
///
/// let err = PricingError::InvalidInput("Negative spot price".to_string());
/// assert_eq!(format!("{}", err), "Invalid input: Negative spot price");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// Invalid input data or parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Instrument identifier could not be resolved
    #[error("Instrument not found: {0}")]
    InstrumentNotFound(String),

    /// No market data available for an underlying
    #[error("Market data unavailable: {0}")]
    MarketDataUnavailable(String),

    /// Iterative solver exceeded its iteration budget
    #[error("Numerical non-convergence after {iterations} iterations (best estimate {best_estimate})")]
    NumericalNonConvergence {
        /// Iterations performed
        iterations: usize,
        /// Best estimate reached before giving up
        best_estimate: f64,
    },

    /// Requested model cannot price the instrument
    #[error("Unsupported model {model}: {reason}")]
    UnsupportedModel {
        /// Model name
        model: String,
        /// Why the model was rejected
        reason: String,
    },

    /// Non-finite value produced inside an engine
    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PricingError {
    /// Returns true when the error was caused by caller input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PricingError::InvalidInput(_)
                | PricingError::InstrumentNotFound(_)
                | PricingError::MarketDataUnavailable(_)
        )
    }
}

/// Date-related errors.
///
/// # Examples
/// ```
/// use pricer_core::types::DateError;
///
/// let err = DateError::InvalidDate { year: 2024, month: 2, day: 30 };
/// assert_eq!(format!("{}", err), "Invalid date: 2024-2-30");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// Invalid date components (e.g., February 30th).
    #[error("Invalid date: {year}-{month}-{day}")]
    InvalidDate {
        /// Year component
        year: i32,
        /// Month component (1-12)
        month: u32,
        /// Day component (1-31)
        day: u32,
    },

    /// Failed to parse date string.
    #[error("Date parse error: {0}")]
    ParseError(String),
}

/// Root-finding solver errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// Iteration budget exhausted.
    #[error("Maximum iterations ({iterations}) exceeded, last estimate {last}")]
    MaxIterationsExceeded {
        /// Iterations performed
        iterations: usize,
        /// Last iterate
        last: f64,
    },

    /// Derivative vanished during Newton iteration.
    #[error("Derivative near zero at x = {x}")]
    DerivativeNearZero {
        /// Point at which the derivative vanished
        x: f64,
    },

    /// Iteration produced a non-finite value.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

/// Correlation matrix errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorrelationError {
    /// Matrix is not square or does not match the asset count.
    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Matrix is not symmetric.
    #[error("Correlation matrix is not symmetric at ({row}, {col})")]
    NotSymmetric {
        /// Row index
        row: usize,
        /// Column index
        col: usize,
    },

    /// Entry outside [-1, 1] or diagonal not equal to one.
    #[error("Invalid correlation value {value} at ({row}, {col})")]
    InvalidValue {
        /// Row index
        row: usize,
        /// Column index
        col: usize,
        /// Offending value
        value: f64,
    },

    /// Cholesky decomposition failed.
    #[error("Correlation matrix is not positive definite")]
    NotPositiveDefinite,
}

impl From<DateError> for PricingError {
    fn from(err: DateError) -> Self {
        PricingError::InvalidInput(err.to_string())
    }
}

impl From<CorrelationError> for PricingError {
    fn from(err: CorrelationError) -> Self {
        PricingError::InvalidInput(err.to_string())
    }
}

impl From<SolverError> for PricingError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::MaxIterationsExceeded { iterations, last } => {
                PricingError::NumericalNonConvergence {
                    iterations,
                    best_estimate: last,
                }
            }
            other => PricingError::InternalConsistency(other.to_string()),
        }
    }
}
