//! Identifier types for portfolio entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a portfolio.
///
/// # Examples
///
/// ```
/// use pricer_risk::portfolio::PortfolioId;
///
/// let id = PortfolioId::new("BOOK-EQ");
/// assert_eq!(id.as_str(), "BOOK-EQ");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioId(String);

impl PortfolioId {
    /// Creates a new portfolio ID.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortfolioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PortfolioId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PortfolioId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
