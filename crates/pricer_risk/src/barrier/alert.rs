//! Alerts and monitoring summaries derived from barrier statuses.

use pricer_models::instruments::BarrierId;
use serde::{Deserialize, Serialize};

use super::evaluator::{BarrierState, BarrierStatus};

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertSeverity {
    /// Informational
    Info,
    /// Needs attention
    Warning,
    /// Barrier hit
    Critical,
}

/// Kind of event an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    /// Spot at or through the barrier.
    BarrierHit,
    /// Spot within the alert threshold.
    BarrierApproaching,
    /// A recoverable barrier moved back outside its level.
    BarrierRecovered,
}

/// Alert derived from a [`BarrierStatus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrierAlert {
    /// Barrier identifier.
    pub barrier_id: BarrierId,
    /// Owning instrument.
    pub instrument_id: String,
    /// Severity.
    pub severity: AlertSeverity,
    /// Event kind.
    pub alert_type: AlertType,
    /// Distance in percent of spot.
    pub distance_pct: f64,
    /// Human-readable message.
    pub message: String,
}

impl BarrierAlert {
    /// Alert for `status`; `None` for safe barriers.
    pub fn from_status(status: &BarrierStatus) -> Option<Self> {
        let (severity, alert_type, message) = match status.state {
            BarrierState::Safe => return None,
            BarrierState::Hit => (
                AlertSeverity::Critical,
                AlertType::BarrierHit,
                format!(
                    "{} barrier {} on {} hit at {:.4} (level {:.4})",
                    status.barrier_type.name(),
                    status.barrier_id,
                    status.underlying,
                    status.current_level,
                    status.barrier_level
                ),
            ),
            BarrierState::Approaching => (
                AlertSeverity::Warning,
                AlertType::BarrierApproaching,
                format!(
                    "{} barrier {} on {} is {:.2}% away (breach probability {:.1}%)",
                    status.barrier_type.name(),
                    status.barrier_id,
                    status.underlying,
                    status.distance_pct,
                    status.breach_probability * 100.0
                ),
            ),
            BarrierState::Recovered => (
                AlertSeverity::Info,
                AlertType::BarrierRecovered,
                format!(
                    "{} barrier {} on {} recovered, {:.2}% away",
                    status.barrier_type.name(),
                    status.barrier_id,
                    status.underlying,
                    status.distance_pct
                ),
            ),
        };
        Some(Self {
            barrier_id: status.barrier_id.clone(),
            instrument_id: status.instrument_id.clone(),
            severity,
            alert_type,
            distance_pct: status.distance_pct,
            message,
        })
    }
}

/// Counts by state and the nearest live barrier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonitoringSummary {
    /// Barriers evaluated.
    pub total: usize,
    /// Hit barriers.
    pub hit: usize,
    /// Approaching barriers.
    pub approaching: usize,
    /// Recovered barriers.
    pub recovered: usize,
    /// Safe barriers.
    pub safe: usize,
    /// Closest barrier that is not hit.
    pub nearest_barrier: Option<BarrierId>,
    /// Its distance in percent of spot.
    pub nearest_distance_pct: Option<f64>,
}

impl MonitoringSummary {
    /// Summarises `statuses`.
    pub fn from_statuses(statuses: &[BarrierStatus]) -> Self {
        let mut summary = Self {
            total: statuses.len(),
            ..Self::default()
        };
        for status in statuses {
            match status.state {
                BarrierState::Hit => summary.hit += 1,
                BarrierState::Approaching => summary.approaching += 1,
                BarrierState::Recovered => summary.recovered += 1,
                BarrierState::Safe => summary.safe += 1,
            }
        }
        if let Some(nearest) = statuses
            .iter()
            .filter(|s| s.state != BarrierState::Hit)
            .min_by(|a, b| a.distance_pct.total_cmp(&b.distance_pct))
        {
            summary.nearest_barrier = Some(nearest.barrier_id.clone());
            summary.nearest_distance_pct = Some(nearest.distance_pct);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barrier::BarrierEvaluator;
    use pricer_models::instruments::{BarrierFeature, BarrierType};

    fn status(id: &str, spot: f64) -> BarrierStatus {
        let barrier = BarrierFeature::new(id, BarrierType::DownAndOut, "ACME", 0.7);
        BarrierEvaluator::default().classify(&barrier, 140.0, spot, 0.25, None)
    }

    #[test]
    fn test_severity_by_state() {
        assert_eq!(
            BarrierAlert::from_status(&status("A", 97.0)).map(|a| a.severity),
            Some(AlertSeverity::Critical)
        );
        let approaching = BarrierAlert::from_status(&status("B", 99.0)).unwrap();
        assert_eq!(approaching.severity, AlertSeverity::Warning);
        assert_eq!(approaching.alert_type, AlertType::BarrierApproaching);
        assert!(approaching.message.contains("down-and-out"));
        assert!(BarrierAlert::from_status(&status("C", 140.0)).is_none());
        assert!(AlertSeverity::Critical > AlertSeverity::Warning);
    }

    #[test]
    fn test_summary_counts_and_nearest() {
        let statuses = vec![status("A", 97.0), status("B", 99.0), status("C", 140.0), status("D", 120.0)];
        let summary = MonitoringSummary::from_statuses(&statuses);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.hit, 1);
        assert_eq!(summary.approaching, 1);
        assert_eq!(summary.safe, 2);
        assert_eq!(summary.nearest_barrier, Some(BarrierId::new("B")));
    }
}
