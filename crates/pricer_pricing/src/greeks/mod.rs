//! Greeks: analytic for closed-form engines, centred finite differences
//! otherwise.

mod calculator;
mod result;

pub use calculator::{GreeksBumps, GreeksCalculator};
pub use result::GreeksResult;
