//! Week-over-week delta arithmetic between two 7-day trend summaries.
//!
//! A raw two-point comparison: no smoothing, no rolling average. The 30-day
//! window and the priority list are not compared.

use serde::Serialize;

use crate::artifact::{Severity, TrendSummary};

/// Signed and percentage change for one metric.
///
/// Invariant: `delta == new - old`. `pct` is `None` iff `old == 0` (including
/// a flat 0 → 0 comparison); a zero baseline renders as `n/a`, never as
/// infinite growth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricChange {
    pub old: i64,
    pub new: i64,
    pub delta: i64,
    pub pct: Option<f64>,
}

impl MetricChange {
    pub fn between(old: u64, new: u64) -> Self {
        let old = old as i64;
        let new = new as i64;
        let delta = new - old;
        let pct = if old == 0 {
            None
        } else {
            Some(delta as f64 / old as f64 * 100.0)
        };
        Self {
            old,
            new,
            delta,
            pct,
        }
    }
}

/// Per-bucket changes as a total mapping, mirroring `SeverityCounts`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeverityDeltas {
    pub critical: MetricChange,
    pub high: MetricChange,
    pub medium: MetricChange,
    pub low: MetricChange,
    pub unknown: MetricChange,
}

impl SeverityDeltas {
    pub fn get(&self, severity: Severity) -> MetricChange {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Unknown => self.unknown,
        }
    }
}

/// Movement between two snapshots' 7-day summaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Delta {
    pub total: MetricChange,
    pub by_severity: SeverityDeltas,
}

/// Compare the previous run's 7-day summary against the current one.
pub fn compute(previous: &TrendSummary, current: &TrendSummary) -> Delta {
    let bucket = |s: Severity| {
        MetricChange::between(previous.by_severity.get(s), current.by_severity.get(s))
    };
    Delta {
        total: MetricChange::between(previous.total_items, current.total_items),
        by_severity: SeverityDeltas {
            critical: bucket(Severity::Critical),
            high: bucket(Severity::High),
            medium: bucket(Severity::Medium),
            low: bucket(Severity::Low),
            unknown: bucket(Severity::Unknown),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_new_minus_old() {
        for (old, new) in [(0u64, 0u64), (0, 20), (100, 150), (150, 100), (7, 7)] {
            let change = MetricChange::between(old, new);
            assert_eq!(change.delta, new as i64 - old as i64);
        }
    }

    #[test]
    fn pct_is_none_iff_old_is_zero() {
        assert_eq!(MetricChange::between(0, 20).pct, None);
        assert_eq!(MetricChange::between(0, 0).pct, None);
        assert!(MetricChange::between(1, 0).pct.is_some());
        assert!(MetricChange::between(100, 150).pct.is_some());
    }

    #[test]
    fn fifty_percent_growth() {
        let change = MetricChange::between(100, 150);
        assert_eq!(change.old, 100);
        assert_eq!(change.new, 150);
        assert_eq!(change.delta, 50);
        assert_eq!(change.pct, Some(50.0));
    }

    #[test]
    fn negative_movement() {
        let change = MetricChange::between(200, 150);
        assert_eq!(change.delta, -50);
        assert_eq!(change.pct, Some(-25.0));
    }

    #[test]
    fn compute_covers_total_and_every_bucket() {
        let previous: TrendSummary = serde_json::from_str(
            r#"{"total_items": 100, "by_severity": {"critical": 10, "high": 40}}"#,
        )
        .unwrap();
        let current: TrendSummary = serde_json::from_str(
            r#"{"total_items": 150, "by_severity": {"critical": 15, "medium": 5}}"#,
        )
        .unwrap();

        let delta = compute(&previous, &current);
        assert_eq!(delta.total.delta, 50);
        assert_eq!(delta.by_severity.critical.delta, 5);
        assert_eq!(delta.by_severity.critical.pct, Some(50.0));
        assert_eq!(delta.by_severity.high.delta, -40);
        // medium had a zero baseline
        assert_eq!(delta.by_severity.medium.delta, 5);
        assert_eq!(delta.by_severity.medium.pct, None);
        assert_eq!(delta.by_severity.unknown.delta, 0);
        assert_eq!(delta.by_severity.unknown.pct, None);
    }
}
