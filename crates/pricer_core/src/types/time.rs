//! Dates and ACT/365 year fractions.
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::time::{time_to_maturity_dates, Date};
//!
//! let start = Date::from_ymd(2024, 1, 1).unwrap();
//! let end = Date::from_ymd(2024, 7, 1).unwrap();
//!
//! let yf = time_to_maturity_dates(start, end);
//! assert!((yf - 0.4986).abs() < 0.001);
//! ```

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

use super::error::DateError;

/// Type-safe date wrapper around `chrono::NaiveDate`.
///
/// Serialises as an ISO 8601 string.
///
/// # Examples
///
/// ```
/// use pricer_core::types::time::Date;
///
/// let date = Date::from_ymd(2024, 6, 15).unwrap();
/// let parsed: Date = "2024-06-15".parse().unwrap();
/// assert_eq!(date, parsed);
///
/// let later = Date::from_ymd(2024, 6, 25).unwrap();
/// assert_eq!(later - date, 10);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a Date from year, month, and day components.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or(DateError::InvalidDate { year, month, day })
    }

    /// Parses a date from an ISO 8601 string (YYYY-MM-DD).
    pub fn parse(s: &str) -> Result<Self, DateError> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Date)
            .map_err(|e| DateError::ParseError(e.to_string()))
    }

    /// Year component.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the date shifted by a signed number of calendar days.
    ///
    /// Saturates at the chrono date range.
    pub fn add_days(&self, days: i64) -> Self {
        self.0
            .checked_add_signed(Duration::days(days))
            .map(Date)
            .unwrap_or(*self)
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

impl Sub for Date {
    type Output = i64;

    /// Signed number of calendar days between two dates.
    fn sub(self, rhs: Date) -> i64 {
        (self.0 - rhs.0).num_days()
    }
}

impl FromStr for Date {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Time to maturity in years under ACT/365. Negative if `start > end`.
///
/// ```
/// use pricer_core::types::time::{Date, time_to_maturity_dates};
///
/// let valuation = Date::from_ymd(2024, 1, 1).unwrap();
/// let maturity = Date::from_ymd(2025, 1, 1).unwrap();
/// assert!((time_to_maturity_dates(valuation, maturity) - 1.0027).abs() < 0.001);
/// assert!(time_to_maturity_dates(maturity, valuation) < 0.0);
/// ```
pub fn time_to_maturity_dates(start: Date, end: Date) -> f64 {
    (end - start) as f64 / 365.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_act_365_known_dates() {
        let start = Date::from_ymd(2024, 1, 1).unwrap();
        let end = Date::from_ymd(2024, 7, 1).unwrap();
        assert_relative_eq!(time_to_maturity_dates(start, end), 182.0 / 365.0, epsilon = 1e-12);
        assert_relative_eq!(time_to_maturity_dates(end, start), -182.0 / 365.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_date() {
        assert!(matches!(
            Date::from_ymd(2023, 2, 29),
            Err(DateError::InvalidDate { .. })
        ));
        assert!(Date::parse("2024/01/01").is_err());
    }

    #[test]
    fn test_add_days_and_display() {
        let d = Date::from_ymd(2024, 2, 28).unwrap();
        assert_eq!(d.add_days(1).to_string(), "2024-02-29");
        assert_eq!(d.add_days(-28).to_string(), "2024-01-31");
    }

    #[test]
    fn test_serde_as_iso_string() {
        let d = Date::from_ymd(2024, 6, 15).unwrap();
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"2024-06-15\"");
        let back: Date = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
