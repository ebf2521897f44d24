//! Cycle-window computation and sleeper-berth analysis.
//!
//! Cycle-hour totals are summed over a rolling window. The window start
//! is the end of the most recent **valid restart**: a closed off-duty
//! interval of at least the restart minimum (34 hours) with no on-duty
//! activity nested inside it. Sleeper-berth time during the break is
//! allowed. When no valid restart exists, the window simply reaches back
//! `cycle_days`; a restart can never push the window start earlier than
//! that floor.
//!
//! Sleeper-berth intervals are also extracted here as
//! [`SleeperBerthPeriod`] values, with split-pair validation: two berth
//! periods separated by at most 24 hours, each at least 2 hours, totaling
//! at least 8 hours, form a qualifying split and both legs are flagged.
//! Only adjacent pairs (by start time) are considered; a chain of three
//! periods is checked pairwise, never in combination.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::duty::{DutyStatus, NormalizedInterval};
use crate::hours::Hours;
use crate::limits::CycleLimits;

/// Maximum gap between two sleeper-berth periods for a valid split.
pub const SPLIT_MAX_GAP_HOURS: i64 = 24;

/// Minimum duration of each leg of a split sleeper-berth pair.
pub const SPLIT_MIN_LEG: Hours = Hours::from_centis(2_00);

/// Minimum combined duration of a split sleeper-berth pair.
pub const SPLIT_MIN_TOTAL: Hours = Hours::from_centis(8_00);

/// A sleeper-berth rest period derived from the duty log.
///
/// Created transiently per evaluation; never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleeperBerthPeriod {
    /// When the rest began.
    pub start: DateTime<Utc>,
    /// When the rest ended. `None` while the driver is still in the
    /// berth.
    pub end: Option<DateTime<Utc>>,
    /// Exact rest duration (measured to the evaluation instant when
    /// still open).
    pub duration: Hours,
    /// `true` when the period alone satisfies the 34-hour restart
    /// minimum.
    pub is_valid_for_restart: bool,
    /// `true` when the period is one leg of a qualifying split pair.
    pub split_berth_period: bool,
}

/// Computes the start of the active cycle window.
///
/// Scans the log in reverse chronological order for a valid restart and
/// uses its end; otherwise, and as a floor in every case, the window
/// start is `now − cycle_days`.
#[must_use]
pub fn cycle_start(
    entries: &[NormalizedInterval],
    now: DateTime<Utc>,
    limits: &CycleLimits,
) -> DateTime<Utc> {
    let floor = now - Duration::days(limits.cycle_days);

    let mut start = floor;
    for entry in entries.iter().rev() {
        if entry.status == DutyStatus::OffDuty && is_valid_restart(entry, entries, limits) {
            start = entry.end;
            break;
        }
    }

    start.max(floor)
}

/// Returns `true` when a closed off-duty interval qualifies as a cycle
/// restart.
///
/// The interval must span at least the restart minimum, and no on-duty
/// interval may be strictly nested within it. Partial overlap of on-duty
/// time anywhere strictly between its endpoints disqualifies it — there
/// is no partial credit. Sleeper-berth time inside the break is allowed.
#[must_use]
pub fn is_valid_restart(
    candidate: &NormalizedInterval,
    entries: &[NormalizedInterval],
    limits: &CycleLimits,
) -> bool {
    if candidate.open || candidate.hours < limits.min_restart_hours {
        return false;
    }

    !entries.iter().any(|entry| {
        entry.status.is_on_duty() && entry.start > candidate.start && entry.end < candidate.end
    })
}

/// Extracts every sleeper-berth period from the log and validates split
/// pairs.
#[must_use]
pub fn sleeper_berth_periods(
    entries: &[NormalizedInterval],
    limits: &CycleLimits,
) -> Vec<SleeperBerthPeriod> {
    let mut periods: Vec<SleeperBerthPeriod> = entries
        .iter()
        .filter(|entry| entry.status == DutyStatus::SleeperBerth)
        .map(|entry| SleeperBerthPeriod {
            start: entry.start,
            end: if entry.open { None } else { Some(entry.end) },
            duration: entry.hours,
            is_valid_for_restart: entry.hours >= limits.min_restart_hours,
            split_berth_period: false,
        })
        .collect();

    mark_split_pairs(&mut periods);
    periods
}

/// Flags both legs of each qualifying adjacent split pair.
///
/// Periods arrive sorted by start time (the log is ordered).
fn mark_split_pairs(periods: &mut [SleeperBerthPeriod]) {
    for i in 0..periods.len().saturating_sub(1) {
        // Only the final period can be open, and it has no successor to
        // pair with from the left side.
        let Some(current_end) = periods[i].end else {
            continue;
        };

        let gap = periods[i + 1].start - current_end;
        if gap > Duration::hours(SPLIT_MAX_GAP_HOURS) {
            continue;
        }

        let first = periods[i].duration;
        let second = periods[i + 1].duration;
        let combined = first.saturating_add(second);

        if first >= SPLIT_MIN_LEG && second >= SPLIT_MIN_LEG && combined >= SPLIT_MIN_TOTAL {
            periods[i].split_berth_period = true;
            periods[i + 1].split_berth_period = true;
        }
    }
}
