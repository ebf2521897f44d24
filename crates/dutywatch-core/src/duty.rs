//! Duty statuses and duty-status intervals.
//!
//! A driver's log is an ordered sequence of [`DutyInterval`] values, one
//! per duty-status segment. The engine never mutates the caller's
//! intervals; [`normalize`] validates the sequence once at the evaluation
//! boundary and produces [`NormalizedInterval`] values with exact
//! precomputed durations, so every later stage is a pure computation with
//! no error paths.
//!
//! # Invariants
//!
//! - Intervals are sorted ascending by start time.
//! - Only the final interval may be open (`end == None`), and an open
//!   interval must start before the evaluation instant.
//! - Every closed interval satisfies `start < end`.
//!
//! Violating any invariant rejects the whole log with a [`LogError`];
//! partial evaluation could understate risk, so there is no partial
//! result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hours::Hours;

/// A driver's duty status for one log segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum DutyStatus {
    /// Off duty: free of all work responsibility.
    OffDuty,
    /// Resting in the sleeper berth.
    SleeperBerth,
    /// Driving a commercial motor vehicle.
    Driving,
    /// On duty but not driving (loading, inspections, paperwork).
    OnDutyNotDriving,
}

impl DutyStatus {
    /// Returns the wire tag for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OffDuty => "off_duty",
            Self::SleeperBerth => "sleeper_berth",
            Self::Driving => "driving",
            Self::OnDutyNotDriving => "on_duty_not_driving",
        }
    }

    /// Returns `true` for statuses that count toward on-duty totals.
    #[must_use]
    pub const fn is_on_duty(self) -> bool {
        matches!(self, Self::Driving | Self::OnDutyNotDriving)
    }
}

impl std::fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One segment of a driver's duty-status log.
///
/// Owned by the caller; the engine borrows it immutably.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyInterval {
    /// When the segment began.
    pub start: DateTime<Utc>,
    /// When the segment ended. `None` only for the still-open final
    /// segment.
    pub end: Option<DateTime<Utc>>,
    /// The duty status held during the segment.
    pub status: DutyStatus,
}

impl DutyInterval {
    /// Builds a closed interval.
    #[must_use]
    pub const fn closed(start: DateTime<Utc>, end: DateTime<Utc>, status: DutyStatus) -> Self {
        Self {
            start,
            end: Some(end),
            status,
        }
    }

    /// Builds a still-open interval.
    #[must_use]
    pub const fn open(start: DateTime<Utc>, status: DutyStatus) -> Self {
        Self {
            start,
            end: None,
            status,
        }
    }
}

/// A validated interval with its exact duration.
///
/// Produced by [`normalize`]; open intervals are measured up to the
/// evaluation instant and flagged via [`NormalizedInterval::open`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedInterval {
    /// When the segment began.
    pub start: DateTime<Utc>,
    /// When the segment ended, or the evaluation instant for an open
    /// segment.
    pub end: DateTime<Utc>,
    /// The duty status held during the segment.
    pub status: DutyStatus,
    /// Exact segment duration.
    pub hours: Hours,
    /// `true` when the source interval had no recorded end.
    pub open: bool,
}

/// Rejections produced while validating a duty log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LogError {
    /// An interval other than the final one has no end time.
    #[error("interval {index} is open but is not the final interval")]
    OpenIntervalNotLast {
        /// Zero-based position of the offending interval.
        index: usize,
    },

    /// A closed interval ends at or before its start.
    #[error("interval {index} ends at or before its start")]
    EmptyOrInverted {
        /// Zero-based position of the offending interval.
        index: usize,
    },

    /// An interval starts before the interval preceding it.
    #[error("interval {index} starts before the previous interval")]
    OutOfOrder {
        /// Zero-based position of the offending interval.
        index: usize,
    },

    /// The final open interval starts at or after the evaluation instant.
    #[error("open interval {index} starts at or after the evaluation instant")]
    OpenIntervalInFuture {
        /// Zero-based position of the offending interval.
        index: usize,
    },
}

/// Validates a duty log and computes exact durations.
///
/// Open intervals are closed at `now` for measurement purposes; the
/// caller's intervals are untouched.
///
/// # Errors
///
/// Returns the first [`LogError`] encountered; the whole log is rejected.
pub fn normalize(
    intervals: &[DutyInterval],
    now: DateTime<Utc>,
) -> Result<Vec<NormalizedInterval>, LogError> {
    let mut normalized = Vec::with_capacity(intervals.len());
    let last_index = intervals.len().saturating_sub(1);

    for (index, interval) in intervals.iter().enumerate() {
        if index > 0 && interval.start < intervals[index - 1].start {
            return Err(LogError::OutOfOrder { index });
        }

        let (end, open) = match interval.end {
            Some(end) => {
                if end <= interval.start {
                    return Err(LogError::EmptyOrInverted { index });
                }
                (end, false)
            },
            None => {
                if index != last_index {
                    return Err(LogError::OpenIntervalNotLast { index });
                }
                if interval.start >= now {
                    return Err(LogError::OpenIntervalInFuture { index });
                }
                (now, true)
            },
        };

        // Safe after the checks above; `between` only fails on end <= start.
        let hours = Hours::between(interval.start, end)
            .map_err(|_| LogError::EmptyOrInverted { index })?;

        normalized.push(NormalizedInterval {
            start: interval.start,
            end,
            status: interval.status,
            hours,
            open,
        });
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, h, 0, 0).unwrap()
    }

    #[test]
    fn test_duty_status_tags() {
        assert_eq!(DutyStatus::OffDuty.as_str(), "off_duty");
        assert_eq!(DutyStatus::SleeperBerth.as_str(), "sleeper_berth");
        assert_eq!(DutyStatus::Driving.as_str(), "driving");
        assert_eq!(DutyStatus::OnDutyNotDriving.as_str(), "on_duty_not_driving");
    }

    #[test]
    fn test_duty_status_serde_matches_wire_tags() {
        let json = serde_json::to_string(&DutyStatus::OnDutyNotDriving).unwrap();
        assert_eq!(json, "\"on_duty_not_driving\"");
        let back: DutyStatus = serde_json::from_str("\"sleeper_berth\"").unwrap();
        assert_eq!(back, DutyStatus::SleeperBerth);
    }

    #[test]
    fn test_is_on_duty() {
        assert!(DutyStatus::Driving.is_on_duty());
        assert!(DutyStatus::OnDutyNotDriving.is_on_duty());
        assert!(!DutyStatus::OffDuty.is_on_duty());
        assert!(!DutyStatus::SleeperBerth.is_on_duty());
    }

    #[test]
    fn test_normalize_computes_durations() {
        let intervals = vec![
            DutyInterval::closed(at(1, 6), at(1, 14), DutyStatus::Driving),
            DutyInterval::open(at(1, 14), DutyStatus::OffDuty),
        ];
        let normalized = normalize(&intervals, at(1, 16)).unwrap();
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].hours, Hours::from_whole(8));
        assert!(!normalized[0].open);
        assert_eq!(normalized[1].hours, Hours::from_whole(2));
        assert!(normalized[1].open);
        assert_eq!(normalized[1].end, at(1, 16));
    }

    #[test]
    fn test_normalize_rejects_open_interval_mid_log() {
        let intervals = vec![
            DutyInterval::open(at(1, 6), DutyStatus::Driving),
            DutyInterval::closed(at(1, 14), at(1, 16), DutyStatus::OffDuty),
        ];
        assert_eq!(
            normalize(&intervals, at(1, 18)),
            Err(LogError::OpenIntervalNotLast { index: 0 })
        );
    }

    #[test]
    fn test_normalize_rejects_inverted_interval() {
        let intervals = vec![DutyInterval::closed(at(1, 14), at(1, 6), DutyStatus::Driving)];
        assert_eq!(
            normalize(&intervals, at(1, 18)),
            Err(LogError::EmptyOrInverted { index: 0 })
        );
    }

    #[test]
    fn test_normalize_rejects_out_of_order() {
        let intervals = vec![
            DutyInterval::closed(at(2, 6), at(2, 8), DutyStatus::Driving),
            DutyInterval::closed(at(1, 6), at(1, 8), DutyStatus::OffDuty),
        ];
        assert_eq!(
            normalize(&intervals, at(3, 0)),
            Err(LogError::OutOfOrder { index: 1 })
        );
    }

    #[test]
    fn test_normalize_rejects_open_interval_in_future() {
        let intervals = vec![DutyInterval::open(at(2, 6), DutyStatus::Driving)];
        assert_eq!(
            normalize(&intervals, at(2, 6)),
            Err(LogError::OpenIntervalInFuture { index: 0 })
        );
    }

    #[test]
    fn test_normalize_empty_log() {
        assert_eq!(normalize(&[], at(1, 0)), Ok(vec![]));
    }
}
