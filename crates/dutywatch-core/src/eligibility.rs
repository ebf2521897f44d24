//! Eligibility decisions: can-drive, can-be-on-duty, needs-rest.
//!
//! A pure function of the detected violations, the cycle-scoped
//! intervals, the evaluation instant, and (optionally) the driver's
//! team-driving seat. Signals are checked in order with early exits:
//! critical violations gate everything, the team seat gates driving, and
//! the hours-since-break measures enforce the hard limits plus tighter
//! early-warning thresholds for [`Eligibility::needs_rest`].
//!
//! "Hours since break" is anchored at the most recent qualifying rest:
//! a ≥30-minute off-duty interval for driving hours, a ≥10-hour off-duty
//! interval for on-duty hours. When no on-duty anchor exists within the
//! window, the anchor falls back to `now − 14h` — a conservative default,
//! not a regulatory exception.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::duty::{DutyStatus, NormalizedInterval};
use crate::hours::Hours;
use crate::team::TeamDrivingInfo;
use crate::violation::{Severity, Violation};

/// Hard driving limit since the last qualifying break.
pub const DRIVING_LIMIT: Hours = Hours::from_centis(11_00);

/// Hard on-duty limit since the last 10-hour break.
pub const ON_DUTY_LIMIT: Hours = Hours::from_centis(14_00);

/// Early-warning driving threshold for the rest recommendation.
pub const DRIVING_REST_WARNING: Hours = Hours::from_centis(10_00);

/// Early-warning on-duty threshold for the rest recommendation.
pub const ON_DUTY_REST_WARNING: Hours = Hours::from_centis(13_00);

/// Minimum off-duty duration that counts as a driving break.
pub const QUALIFYING_BREAK_MIN: Hours = Hours::from_centis(50);

/// Minimum off-duty duration that anchors the on-duty measure.
pub const QUALIFYING_REST_MIN: Hours = Hours::from_centis(10_00);

/// Fallback lookback when no qualifying 10-hour rest exists.
const ON_DUTY_LOOKBACK_HOURS: i64 = 14;

/// The three eligibility flags for a driver at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    /// The driver may drive right now.
    pub can_drive: bool,
    /// The driver may be on duty right now.
    pub can_be_on_duty: bool,
    /// The driver should rest before limits are reached.
    pub needs_rest: bool,
}

impl Eligibility {
    /// A fully unrestricted driver.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self {
            can_drive: true,
            can_be_on_duty: true,
            needs_rest: false,
        }
    }
}

impl Default for Eligibility {
    fn default() -> Self {
        Self::unrestricted()
    }
}

/// Decides eligibility from violations, scoped intervals, and team seat.
#[must_use]
pub fn decide(
    entries: &[NormalizedInterval],
    now: DateTime<Utc>,
    violations: &[Violation],
    team: Option<&TeamDrivingInfo>,
) -> Eligibility {
    let has_critical = violations.iter().any(Violation::is_critical);
    let has_major_or_worse = violations
        .iter()
        .any(|v| v.severity >= Severity::Major);

    let driving = driving_hours_since_break(entries);
    let on_duty = on_duty_hours_since_break(entries, now);

    let seat_blocks_driving = team.is_some_and(|info| !info.subject_is_active());

    let can_drive = !has_critical
        && !seat_blocks_driving
        && driving < DRIVING_LIMIT
        && on_duty < ON_DUTY_LIMIT;

    let can_be_on_duty = !has_critical && on_duty < ON_DUTY_LIMIT;

    let needs_rest =
        has_major_or_worse || driving >= DRIVING_REST_WARNING || on_duty >= ON_DUTY_REST_WARNING;

    Eligibility {
        can_drive,
        can_be_on_duty,
        needs_rest,
    }
}

/// Returns the end of the most recent qualifying 30-minute break.
#[must_use]
pub fn last_qualifying_break(entries: &[NormalizedInterval]) -> Option<DateTime<Utc>> {
    entries
        .iter()
        .rev()
        .find(|entry| {
            entry.status == DutyStatus::OffDuty
                && !entry.open
                && entry.hours >= QUALIFYING_BREAK_MIN
        })
        .map(|entry| entry.end)
}

/// Sums driving hours since the last qualifying 30-minute break.
///
/// When no qualifying break exists, all driving hours in the window
/// count.
#[must_use]
pub fn driving_hours_since_break(entries: &[NormalizedInterval]) -> Hours {
    let cutoff = last_qualifying_break(entries);

    entries
        .iter()
        .filter(|entry| entry.status == DutyStatus::Driving)
        .filter(|entry| cutoff.is_none_or(|cutoff| entry.start >= cutoff))
        .fold(Hours::ZERO, |acc, entry| acc.saturating_add(entry.hours))
}

/// Sums on-duty hours since the last 10-hour off-duty rest.
///
/// Falls back to a `now − 14h` anchor when no qualifying rest exists.
#[must_use]
pub fn on_duty_hours_since_break(entries: &[NormalizedInterval], now: DateTime<Utc>) -> Hours {
    let anchor = entries
        .iter()
        .rev()
        .find(|entry| {
            entry.status == DutyStatus::OffDuty
                && !entry.open
                && entry.hours >= QUALIFYING_REST_MIN
        })
        .map_or_else(
            || now - Duration::hours(ON_DUTY_LOOKBACK_HOURS),
            |entry| entry.end,
        );

    entries
        .iter()
        .filter(|entry| entry.status.is_on_duty() && entry.start >= anchor)
        .fold(Hours::ZERO, |acc, entry| acc.saturating_add(entry.hours))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::duty::{normalize, DutyInterval};
    use crate::team::TeamDrivingRole;
    use crate::violation::ViolationKind;

    fn at(day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, h, 0, 0).unwrap()
    }

    fn norm(intervals: &[DutyInterval], now: DateTime<Utc>) -> Vec<NormalizedInterval> {
        normalize(intervals, now).unwrap()
    }

    fn critical_violation() -> Violation {
        Violation::new(
            ViolationKind::CycleHoursExceeded,
            "over cycle",
            Severity::Critical,
            at(1, 0),
        )
    }

    #[test]
    fn test_empty_log_is_unrestricted() {
        let decision = decide(&[], at(1, 12), &[], None);
        assert_eq!(decision, Eligibility::unrestricted());
    }

    #[test]
    fn test_critical_violation_blocks_everything() {
        let violations = vec![critical_violation()];
        let decision = decide(&[], at(1, 12), &violations, None);
        assert!(!decision.can_drive);
        assert!(!decision.can_be_on_duty);
        assert!(decision.needs_rest);
    }

    #[test]
    fn test_major_violation_only_forces_rest() {
        let violations = vec![Violation::new(
            ViolationKind::DrivingOver11,
            "long stint",
            Severity::Major,
            at(1, 0),
        )];
        let decision = decide(&[], at(1, 12), &violations, None);
        assert!(decision.can_drive);
        assert!(decision.can_be_on_duty);
        assert!(decision.needs_rest);
    }

    #[test]
    fn test_inactive_team_seat_blocks_driving_only() {
        let now = at(1, 12);
        let team = TeamDrivingInfo::new("team-7", "alice", "bob")
            .with_subject_role(TeamDrivingRole::Driver2);
        // Driver 1 holds the wheel; the subject is driver 2.
        let decision = decide(&[], now, &[], Some(&team));
        assert!(!decision.can_drive);
        assert!(decision.can_be_on_duty);
        assert!(!decision.needs_rest);
    }

    #[test]
    fn test_active_team_seat_allows_driving() {
        let team = TeamDrivingInfo::new("team-7", "alice", "bob")
            .with_subject_role(TeamDrivingRole::Driver1);
        let decision = decide(&[], at(1, 12), &[], Some(&team));
        assert!(decision.can_drive);
    }

    #[test]
    fn test_driving_hours_counted_without_any_break() {
        let now = at(1, 22);
        let entries = norm(
            &[
                DutyInterval::closed(at(1, 0), at(1, 6), DutyStatus::Driving),
                DutyInterval::closed(at(1, 6), at(1, 12), DutyStatus::Driving),
            ],
            now,
        );
        assert_eq!(driving_hours_since_break(&entries), Hours::from_whole(12));
    }

    #[test]
    fn test_driving_hours_reset_by_qualifying_break() {
        let now = at(1, 22);
        let entries = norm(
            &[
                DutyInterval::closed(at(1, 0), at(1, 6), DutyStatus::Driving),
                DutyInterval::closed(at(1, 6), at(1, 7), DutyStatus::OffDuty),
                DutyInterval::closed(at(1, 7), at(1, 10), DutyStatus::Driving),
            ],
            now,
        );
        assert_eq!(last_qualifying_break(&entries), Some(at(1, 7)));
        assert_eq!(driving_hours_since_break(&entries), Hours::from_whole(3));
    }

    #[test]
    fn test_on_duty_hours_anchor_falls_back_to_lookback() {
        let now = at(2, 12);
        // 20 hours of on-duty time, but only the part inside now-14h counts.
        let entries = norm(
            &[DutyInterval::closed(at(1, 16), at(2, 12), DutyStatus::OnDutyNotDriving)],
            at(2, 13),
        );
        // Entry starts at day1 16:00; anchor is day1 22:00. Start is before
        // the anchor, so nothing is counted.
        assert_eq!(on_duty_hours_since_break(&entries, now), Hours::ZERO);
    }

    #[test]
    fn test_on_duty_hours_after_ten_hour_rest() {
        let now = at(2, 23);
        let entries = norm(
            &[
                DutyInterval::closed(at(1, 0), at(1, 8), DutyStatus::OnDutyNotDriving),
                DutyInterval::closed(at(1, 8), at(2, 8), DutyStatus::OffDuty),
                DutyInterval::closed(at(2, 8), at(2, 22), DutyStatus::Driving),
            ],
            now,
        );
        assert_eq!(on_duty_hours_since_break(&entries, now), Hours::from_whole(14));
    }

    #[test]
    fn test_eleven_driving_hours_block_driving() {
        let now = at(1, 12);
        let entries = norm(
            &[DutyInterval::closed(at(1, 0), at(1, 11), DutyStatus::Driving)],
            now,
        );
        let decision = decide(&entries, now, &[], None);
        assert!(!decision.can_drive);
        assert!(decision.can_be_on_duty);
        assert!(decision.needs_rest);
    }

    #[test]
    fn test_fourteen_on_duty_hours_block_duty() {
        let now = at(1, 15);
        let entries = norm(
            &[DutyInterval::closed(at(1, 0), at(1, 14), DutyStatus::OnDutyNotDriving)],
            now,
        );
        let decision = decide(&entries, now, &[], None);
        assert!(!decision.can_drive);
        assert!(!decision.can_be_on_duty);
        assert!(decision.needs_rest);
    }

    #[test]
    fn test_early_warning_thresholds() {
        let now = at(1, 12);
        // 10 hours driving: still allowed to drive, but rest is advised.
        let entries = norm(
            &[DutyInterval::closed(at(1, 0), at(1, 10), DutyStatus::Driving)],
            now,
        );
        let decision = decide(&entries, now, &[], None);
        assert!(decision.can_drive);
        assert!(decision.needs_rest);
    }
}
