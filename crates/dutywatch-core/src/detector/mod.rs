//! Violation detection over cycle-scoped intervals.
//!
//! For every enabled rule in the evaluation's registry snapshot, the
//! detector inspects the cycle-scoped intervals and emits zero or more
//! [`Violation`] records. Violations come back in snapshot (registration)
//! order, then in chronological order within a rule. Nothing is
//! deduplicated here: the detector intentionally over-reports in
//! ambiguous restart cases and never suppresses a candidate violation.
//! Idempotent storage and human dispute handling belong to the
//! persistence collaborator — missing a real violation must be
//! impossible; reporting one a human later disputes is acceptable.
//!
//! Rules without a built-in checker (custom registrations) are skipped.

use chrono::{DateTime, Utc};

use crate::cycle::SleeperBerthPeriod;
use crate::duty::{DutyStatus, NormalizedInterval};
use crate::eligibility::driving_hours_since_break;
use crate::hours::Hours;
use crate::limits::CycleLimits;
use crate::rules::{rule_ids, Rule, RuleSnapshot};
use crate::violation::{Violation, ViolationKind};

/// Runs every enabled rule against the cycle-scoped intervals.
#[must_use]
pub fn detect(
    snapshot: &RuleSnapshot,
    scoped: &[NormalizedInterval],
    sleeper_periods: &[SleeperBerthPeriod],
    limits: &CycleLimits,
    now: DateTime<Utc>,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for rule in snapshot.iter() {
        match rule.id.as_str() {
            rule_ids::DRIVING_LIMIT_11_HOURS => {
                check_driving_limit(rule, scoped, &mut violations);
            },
            rule_ids::ON_DUTY_LIMIT_14_HOURS => {
                check_on_duty_limit(rule, scoped, &mut violations);
            },
            rule_ids::THIRTY_MIN_BREAK_REQUIREMENT => {
                check_break_requirement(rule, scoped, now, &mut violations);
            },
            rule_ids::CYCLE_HOURS_LIMIT => {
                check_cycle_hours(rule, scoped, limits, now, &mut violations);
            },
            rule_ids::RESTART_34_HOUR => {
                check_restart_attempts(rule, scoped, &mut violations);
            },
            rule_ids::SLEEPER_BERTH_SPLIT => {
                check_split_berth(rule, sleeper_periods, &mut violations);
            },
            _ => {},
        }
    }

    violations
}

/// Flags each continuous driving interval that exceeds the driving limit.
///
/// This is a per-interval check, not a running total across breaks; each
/// offending interval triggers once.
fn check_driving_limit(rule: &Rule, scoped: &[NormalizedInterval], out: &mut Vec<Violation>) {
    let max_hours = rule
        .param_hours("max_hours")
        .unwrap_or(Hours::from_centis(11_00));

    for entry in scoped {
        if entry.status != DutyStatus::Driving {
            continue;
        }
        if let Some(over) = entry.hours.excess_over(max_hours) {
            out.push(
                Violation::new(
                    ViolationKind::DrivingOver11,
                    format!(
                        "Drove for {} hours without 10-hour break (limit: {max_hours}h)",
                        entry.hours
                    ),
                    rule.severity,
                    entry.start,
                )
                .with_duration_over(over)
                .with_immediate_action()
                .with_impact("Driver must take 10-hour break before driving again"),
            );
        }
    }
}

/// Flags each continuous on-duty interval that exceeds the on-duty limit.
fn check_on_duty_limit(rule: &Rule, scoped: &[NormalizedInterval], out: &mut Vec<Violation>) {
    let max_hours = rule
        .param_hours("max_hours")
        .unwrap_or(Hours::from_centis(14_00));

    for entry in scoped {
        if !entry.status.is_on_duty() {
            continue;
        }
        if let Some(over) = entry.hours.excess_over(max_hours) {
            out.push(
                Violation::new(
                    ViolationKind::OnDutyOver14,
                    format!(
                        "On duty for {} hours without 10-hour break (limit: {max_hours}h)",
                        entry.hours
                    ),
                    rule.severity,
                    entry.start,
                )
                .with_duration_over(over)
                .with_immediate_action()
                .with_impact("Driver must take 10-hour break before any duty"),
            );
        }
    }
}

/// Flags driving past the break threshold without a qualifying
/// 30-minute break.
///
/// When no qualifying break exists at all, every driving hour in the
/// window counts toward the threshold.
fn check_break_requirement(
    rule: &Rule,
    scoped: &[NormalizedInterval],
    now: DateTime<Utc>,
    out: &mut Vec<Violation>,
) {
    let threshold = rule
        .param_hours("break_threshold")
        .unwrap_or(Hours::from_centis(8_00));
    let min_break = rule.param_hours("min_break").unwrap_or(Hours::from_centis(50));

    let driving = driving_hours_since_break(scoped);
    if driving > threshold {
        let break_minutes = min_break.centis() * 60 / 100;
        out.push(
            Violation::new(
                ViolationKind::No30MinBreak,
                format!(
                    "No {break_minutes}-minute break after {driving} hours of driving \
                     (threshold: {threshold}h)"
                ),
                rule.severity,
                now,
            )
            .with_immediate_action()
            .with_impact("Driver must take 30-minute break before continuing to drive"),
        );
    }
}

/// Flags the cycle window when its on-duty total exceeds the cycle limit.
///
/// The limit comes from the engine's cycle type, so switching between
/// 70/8 and 60/7 cannot disagree with the rule's documented default.
fn check_cycle_hours(
    rule: &Rule,
    scoped: &[NormalizedInterval],
    limits: &CycleLimits,
    now: DateTime<Utc>,
    out: &mut Vec<Violation>,
) {
    let limit = limits.cycle_hours;
    let total = scoped
        .iter()
        .filter(|entry| entry.status.is_on_duty())
        .fold(Hours::ZERO, |acc, entry| acc.saturating_add(entry.hours));

    if let Some(over) = total.excess_over(limit) {
        let occurred_at = scoped.last().map_or(now, |entry| entry.end);
        out.push(
            Violation::new(
                ViolationKind::CycleHoursExceeded,
                format!("Exceeded {limit}-hour cycle limit by {over} hours"),
                rule.severity,
                occurred_at,
            )
            .with_duration_over(over)
            .with_immediate_action()
            .with_impact("Driver must take 34-hour restart or wait for cycle reset"),
        );
    }
}

/// Flags every closed off-duty interval shorter than the restart minimum.
///
/// Intentionally permissive: any short off-duty period is reported as an
/// invalid restart attempt, including breaks never meant as restarts.
/// Over-reporting is the chosen failure bias; narrowing happens in human
/// review.
fn check_restart_attempts(rule: &Rule, scoped: &[NormalizedInterval], out: &mut Vec<Violation>) {
    let min_hours = rule
        .param_hours("min_hours")
        .unwrap_or(Hours::from_centis(34_00));

    for entry in scoped {
        if entry.status != DutyStatus::OffDuty || entry.open {
            continue;
        }
        if entry.hours < min_hours {
            out.push(
                Violation::new(
                    ViolationKind::Invalid34HourRestart,
                    format!(
                        "Attempted 34-hour restart with only {} hours off duty \
                         (minimum: {min_hours}h)",
                        entry.hours
                    ),
                    rule.severity,
                    entry.start,
                )
                .with_impact("Restart attempt invalid, cycle continues"),
            );
        }
    }
}

/// Checks the first two split-flagged sleeper periods against the
/// per-leg minimums, emitting one violation per failing leg.
fn check_split_berth(rule: &Rule, periods: &[SleeperBerthPeriod], out: &mut Vec<Violation>) {
    let min_first = rule
        .param_hours("min_first_period")
        .unwrap_or(Hours::from_centis(2_00));
    let min_second = rule
        .param_hours("min_second_period")
        .unwrap_or(Hours::from_centis(2_00));

    let mut split = periods.iter().filter(|period| period.split_berth_period);
    let (Some(first), Some(second)) = (split.next(), split.next()) else {
        return;
    };

    if first.duration < min_first {
        out.push(
            Violation::new(
                ViolationKind::InvalidSplitBerthFirst,
                format!(
                    "First sleeper berth period only {} hours (minimum: {min_first}h)",
                    first.duration
                ),
                rule.severity,
                first.start,
            )
            .with_impact("Split berth period invalid"),
        );
    }
    if second.duration < min_second {
        out.push(
            Violation::new(
                ViolationKind::InvalidSplitBerthSecond,
                format!(
                    "Second sleeper berth period only {} hours (minimum: {min_second}h)",
                    second.duration
                ),
                rule.severity,
                second.start,
            )
            .with_impact("Split berth period invalid"),
        );
    }
}
