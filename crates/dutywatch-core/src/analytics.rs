//! Compliance analytics: deterministic aggregation over one evaluation.
//!
//! No rule re-evaluation happens here; analytics only fold the detected
//! violations and the logged intervals into a scorecard. Scoring is
//! penalty-based from a base of 100.00 (20 per critical, 10 per major,
//! 5 per minor, floored at zero). Risk factors are independent threshold
//! checks; any subset may apply simultaneously.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::duty::{DutyStatus, NormalizedInterval};
use crate::hours::Hours;
use crate::limits::CycleLimits;
use crate::violation::{Severity, Violation, ViolationKind};

/// Perfect compliance score.
pub const BASE_SCORE: Hours = Hours::from_centis(100_00);

/// Compliance score below which the driver is flagged at risk.
pub const SCORE_RISK_THRESHOLD: Hours = Hours::from_centis(80_00);

/// Violation count above which the driver is flagged at risk.
pub const VIOLATION_COUNT_RISK_THRESHOLD: usize = 5;

/// Restarts-per-week above which the driver is flagged at risk.
pub const RESTART_FREQUENCY_RISK_THRESHOLD: Hours = Hours::from_centis(2_00);

/// Average daily hours above which the driver is flagged at risk.
pub const DAILY_HOURS_RISK_THRESHOLD: Hours = Hours::from_centis(12_00);

/// Qualitative risk factors surfaced alongside the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum RiskFactor {
    /// Compliance score under 80.
    LowComplianceScore,
    /// More than five violations in the evaluation.
    HighViolationCount,
    /// More than two 34-hour restarts per week.
    FrequentRestarts,
    /// Average logged hours above twelve per day.
    HighDailyHours,
}

impl RiskFactor {
    /// Returns the display label for this factor.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LowComplianceScore => "Low compliance score",
            Self::HighViolationCount => "High violation count",
            Self::FrequentRestarts => "Frequent restarts",
            Self::HighDailyHours => "High daily hours",
        }
    }
}

impl std::fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only compliance scorecard for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceAnalytics {
    /// Total violations detected.
    pub total_violations: usize,
    /// Violation counts by kind.
    pub violations_by_type: BTreeMap<ViolationKind, u32>,
    /// Violation counts by severity.
    pub violations_by_severity: BTreeMap<Severity, u32>,
    /// Penalty-based score out of 100.00, floored at zero.
    pub compliance_score: Hours,
    /// Driving hours as a percentage of all logged hours.
    pub cycle_efficiency: Hours,
    /// Qualifying restarts per week over the logged span.
    pub restart_frequency: Hours,
    /// Average logged hours per day that has entries.
    pub average_daily_hours: Hours,
    /// Independent risk flags.
    pub risk_factors: Vec<RiskFactor>,
}

impl Default for ComplianceAnalytics {
    fn default() -> Self {
        Self {
            total_violations: 0,
            violations_by_type: BTreeMap::new(),
            violations_by_severity: BTreeMap::new(),
            compliance_score: BASE_SCORE,
            cycle_efficiency: Hours::ZERO,
            restart_frequency: Hours::ZERO,
            average_daily_hours: Hours::ZERO,
            risk_factors: Vec::new(),
        }
    }
}

/// Folds the evaluation's violations and log into a scorecard.
#[must_use]
pub fn compute(
    entries: &[NormalizedInterval],
    violations: &[Violation],
    limits: &CycleLimits,
    now: DateTime<Utc>,
) -> ComplianceAnalytics {
    let mut analytics = ComplianceAnalytics {
        total_violations: violations.len(),
        ..ComplianceAnalytics::default()
    };

    for violation in violations {
        *analytics.violations_by_type.entry(violation.kind).or_insert(0) += 1;
        *analytics
            .violations_by_severity
            .entry(violation.severity)
            .or_insert(0) += 1;
    }

    let penalty_centis: i64 = violations
        .iter()
        .map(|violation| i64::from(violation.severity.penalty_points()) * 100)
        .sum();
    analytics.compliance_score = BASE_SCORE
        .saturating_sub(Hours::from_centis(penalty_centis))
        .max(Hours::ZERO);

    let total_hours = entries
        .iter()
        .fold(Hours::ZERO, |acc, entry| acc.saturating_add(entry.hours));
    let driving_hours = entries
        .iter()
        .filter(|entry| entry.status == DutyStatus::Driving)
        .fold(Hours::ZERO, |acc, entry| acc.saturating_add(entry.hours));
    analytics.cycle_efficiency = driving_hours.percent_of(total_hours);

    analytics.restart_frequency = restart_frequency(entries, limits, now);
    analytics.average_daily_hours = average_daily_hours(entries);

    if analytics.compliance_score < SCORE_RISK_THRESHOLD {
        analytics.risk_factors.push(RiskFactor::LowComplianceScore);
    }
    if analytics.total_violations > VIOLATION_COUNT_RISK_THRESHOLD {
        analytics.risk_factors.push(RiskFactor::HighViolationCount);
    }
    if analytics.restart_frequency > RESTART_FREQUENCY_RISK_THRESHOLD {
        analytics.risk_factors.push(RiskFactor::FrequentRestarts);
    }
    if analytics.average_daily_hours > DAILY_HOURS_RISK_THRESHOLD {
        analytics.risk_factors.push(RiskFactor::HighDailyHours);
    }

    analytics
}

/// Qualifying restarts per week over the logged span.
fn restart_frequency(
    entries: &[NormalizedInterval],
    limits: &CycleLimits,
    now: DateTime<Utc>,
) -> Hours {
    let Some(first) = entries.first() else {
        return Hours::ZERO;
    };

    let restart_count = entries
        .iter()
        .filter(|entry| {
            entry.status == DutyStatus::OffDuty
                && !entry.open
                && entry.hours >= limits.min_restart_hours
        })
        .count();

    let span_days = (now - first.start).num_days() + 1;
    Hours::from_ratio(i64::try_from(restart_count).unwrap_or(i64::MAX) * 7, span_days)
}

/// Average logged hours per day, over days that have entries.
fn average_daily_hours(entries: &[NormalizedInterval]) -> Hours {
    if entries.is_empty() {
        return Hours::ZERO;
    }

    let mut per_day: BTreeMap<NaiveDate, Hours> = BTreeMap::new();
    for entry in entries {
        let day = entry.start.date_naive();
        let total = per_day.entry(day).or_insert(Hours::ZERO);
        *total = total.saturating_add(entry.hours);
    }

    let sum = per_day
        .values()
        .fold(Hours::ZERO, |acc, hours| acc.saturating_add(*hours));
    sum.div_round(i64::try_from(per_day.len()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::duty::{normalize, DutyInterval};
    use crate::limits::CycleType;

    fn at(day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, h, 0, 0).unwrap()
    }

    fn violation(severity: Severity) -> Violation {
        Violation::new(ViolationKind::DrivingOver11, "v", severity, at(1, 0))
    }

    #[test]
    fn test_empty_evaluation_scores_perfect() {
        let limits = CycleType::SeventyHourEightDay.limits();
        let analytics = compute(&[], &[], &limits, at(1, 0));
        assert_eq!(analytics.compliance_score, BASE_SCORE);
        assert_eq!(analytics.total_violations, 0);
        assert_eq!(analytics.cycle_efficiency, Hours::ZERO);
        assert!(analytics.risk_factors.is_empty());
    }

    #[test]
    fn test_penalty_points_per_severity() {
        let limits = CycleType::SeventyHourEightDay.limits();
        let violations = vec![
            violation(Severity::Critical),
            violation(Severity::Major),
            violation(Severity::Minor),
        ];
        let analytics = compute(&[], &violations, &limits, at(1, 0));
        // 100 - 20 - 10 - 5 = 65.00
        assert_eq!(analytics.compliance_score, Hours::from_whole(65));
        assert_eq!(
            analytics.violations_by_severity.get(&Severity::Critical),
            Some(&1)
        );
        assert!(analytics
            .risk_factors
            .contains(&RiskFactor::LowComplianceScore));
    }

    #[test]
    fn test_score_floors_at_zero() {
        let limits = CycleType::SeventyHourEightDay.limits();
        let violations: Vec<Violation> = (0..6).map(|_| violation(Severity::Critical)).collect();
        let analytics = compute(&[], &violations, &limits, at(1, 0));
        assert_eq!(analytics.compliance_score, Hours::ZERO);
        assert!(analytics
            .risk_factors
            .contains(&RiskFactor::HighViolationCount));
    }

    #[test]
    fn test_cycle_efficiency() {
        let limits = CycleType::SeventyHourEightDay.limits();
        let now = at(1, 20);
        let entries = normalize(
            &[
                DutyInterval::closed(at(1, 0), at(1, 6), DutyStatus::Driving),
                DutyInterval::closed(at(1, 6), at(1, 12), DutyStatus::OffDuty),
            ],
            now,
        )
        .unwrap();
        let analytics = compute(&entries, &[], &limits, now);
        assert_eq!(analytics.cycle_efficiency, Hours::from_whole(50));
    }

    #[test]
    fn test_restart_frequency_per_week() {
        let limits = CycleType::SeventyHourEightDay.limits();
        let now = at(7, 0);
        // One 36-hour restart in a 7-day span: 1/7*7 = 1.00 per week.
        let entries = normalize(
            &[
                DutyInterval::closed(at(1, 0), at(1, 8), DutyStatus::Driving),
                DutyInterval::closed(at(1, 8), at(2, 20), DutyStatus::OffDuty),
                DutyInterval::closed(at(2, 20), at(3, 0), DutyStatus::Driving),
            ],
            now,
        )
        .unwrap();
        let analytics = compute(&entries, &[], &limits, now);
        assert_eq!(analytics.restart_frequency, Hours::from_whole(1));
    }

    #[test]
    fn test_average_daily_hours_over_logged_days() {
        let limits = CycleType::SeventyHourEightDay.limits();
        let now = at(3, 0);
        // Day 1: 10 logged hours. Day 2: 14 logged hours. Average 12.00.
        let entries = normalize(
            &[
                DutyInterval::closed(at(1, 0), at(1, 10), DutyStatus::Driving),
                DutyInterval::closed(at(2, 0), at(2, 14), DutyStatus::OnDutyNotDriving),
            ],
            now,
        )
        .unwrap();
        let analytics = compute(&entries, &[], &limits, now);
        assert_eq!(analytics.average_daily_hours, Hours::from_whole(12));
        // Exactly at the threshold is not flagged.
        assert!(!analytics.risk_factors.contains(&RiskFactor::HighDailyHours));
    }

    #[test]
    fn test_high_daily_hours_flagged() {
        let limits = CycleType::SeventyHourEightDay.limits();
        let now = at(2, 0);
        let entries = normalize(
            &[DutyInterval::closed(at(1, 0), at(1, 13), DutyStatus::Driving)],
            now,
        )
        .unwrap();
        let analytics = compute(&entries, &[], &limits, now);
        assert!(analytics.risk_factors.contains(&RiskFactor::HighDailyHours));
    }
}
