//! Option exercise styles.

use pricer_core::types::Date;
use serde::{Deserialize, Serialize};

/// When an option can be exercised.
///
/// # Examples
/// ```
/// use pricer_models::instruments::ExerciseStyle;
/// use pricer_core::types::Date;
///
/// let bermudan = ExerciseStyle::Bermudan {
///     exercise_dates: vec![Date::from_ymd(2024, 6, 28).unwrap()],
/// };
/// assert!(bermudan.has_early_exercise());
/// assert!(!ExerciseStyle::European.has_early_exercise());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExerciseStyle {
    /// Exercise only at expiry.
    #[default]
    European,

    /// Exercise at any time up to expiry.
    American,

    /// Exercise on the listed dates (and at expiry).
    Bermudan {
        /// Early exercise dates
        exercise_dates: Vec<Date>,
    },
}

impl ExerciseStyle {
    /// Whether exercise is possible before expiry.
    #[inline]
    pub fn has_early_exercise(&self) -> bool {
        !matches!(self, ExerciseStyle::European)
    }

    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            ExerciseStyle::European => "European",
            ExerciseStyle::American => "American",
            ExerciseStyle::Bermudan { .. } => "Bermudan",
        }
    }
}
