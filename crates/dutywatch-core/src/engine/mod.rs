//! The HOS compliance engine façade.
//!
//! [`ComplianceEngine::evaluate`] is the single entry point: given a
//! chronological duty log, an evaluation instant, and optional
//! team-driving state, it produces an [`HOSStatus`] aggregate. The
//! computation is stateless and side-effect free; invoked twice on
//! identical input it returns identical output.
//!
//! # Data Flow
//!
//! ```text
//! intervals ──► normalize ──► cycle window ──► scoped intervals
//!                  │               │                 │
//!                  │         sleeper periods         ▼
//!                  │               │             violations
//!                  │               │            ▼          ▼
//!                  └───────────────┴──► eligibility    analytics
//!                                              │          │
//!                                              ▼          ▼
//!                                            HOSStatus aggregate
//! ```
//!
//! The registry snapshot is taken once at the top of `evaluate`, so
//! concurrent administrative rule edits can never produce a half-old,
//! half-new rule set mid-pass.
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use dutywatch_core::duty::{DutyInterval, DutyStatus};
//! use dutywatch_core::engine::ComplianceEngine;
//! use dutywatch_core::limits::CycleType;
//!
//! let engine = ComplianceEngine::new(CycleType::SeventyHourEightDay);
//! let start = Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap();
//! let now = Utc.with_ymd_and_hms(2025, 3, 1, 19, 0, 0).unwrap();
//!
//! let log = vec![DutyInterval::closed(start, end, DutyStatus::Driving)];
//! let status = engine.evaluate(&log, now, None).unwrap();
//!
//! assert!(!status.can_drive);
//! assert_eq!(status.hours_used_this_cycle.to_string(), "12.00");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::advice::{restart_recommendations, RestartRecommendations};
use crate::analytics::{compute as compute_analytics, ComplianceAnalytics};
use crate::cycle::{cycle_start, sleeper_berth_periods, SleeperBerthPeriod};
use crate::detector::detect;
use crate::duty::{normalize, DutyInterval, DutyStatus, LogError, NormalizedInterval};
use crate::eligibility::{decide, last_qualifying_break};
use crate::hours::Hours;
use crate::limits::{CycleLimits, CycleType, CycleTypeError};
use crate::rules::Registry;
use crate::team::TeamDrivingInfo;
use crate::violation::Violation;


/// Errors returned by the engine façade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The duty log is malformed; evaluation aborted with no partial
    /// result.
    #[error("invalid log data: {0}")]
    InvalidLogData(#[from] LogError),

    /// The requested cycle type is not supported.
    #[error(transparent)]
    UnsupportedCycleType(#[from] CycleTypeError),
}

/// The engine's single output aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HOSStatus {
    /// The driver may drive right now.
    pub can_drive: bool,
    /// The driver may be on duty right now.
    pub can_be_on_duty: bool,
    /// The driver should rest before limits are reached.
    pub needs_rest: bool,
    /// On-duty hours consumed within the cycle window.
    pub hours_used_this_cycle: Hours,
    /// On-duty hours remaining in the cycle window, floored at zero.
    pub hours_available: Hours,
    /// Hours since the last closed off-duty interval ended.
    pub consecutive_off_duty_hours: Hours,
    /// End of the most recent qualifying 30-minute break.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_30_min_break: Option<DateTime<Utc>>,
    /// Violations detected in this evaluation, in rule order.
    pub violations: Vec<Violation>,
    /// The cycle type evaluated against.
    pub cycle_type: CycleType,
    /// Start of the active cycle window.
    pub cycle_start: DateTime<Utc>,
    /// Sleeper-berth periods derived from the log.
    pub sleeper_berth_periods: Vec<SleeperBerthPeriod>,
    /// Team-driving state, echoed back when supplied.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub team_driving_info: Option<TeamDrivingInfo>,
    /// Compliance scorecard.
    pub analytics: ComplianceAnalytics,
    /// Restart guidance.
    pub restart_recommendations: RestartRecommendations,
}

/// The HOS compliance rule engine.
///
/// Holds the cycle configuration and the rule registry. Evaluations
/// borrow the engine immutably; registry administration requires
/// `&mut self`, so callers wanting concurrent rule edits wrap the engine
/// in their own lock and still get snapshot-consistent evaluations.
#[derive(Debug, Clone)]
pub struct ComplianceEngine {
    cycle_type: CycleType,
    limits: CycleLimits,
    registry: Registry,
}

impl ComplianceEngine {
    /// Creates an engine with the default rule set.
    #[must_use]
    pub fn new(cycle_type: CycleType) -> Self {
        Self::with_registry(cycle_type, Registry::with_defaults())
    }

    /// Creates an engine with a caller-provided registry.
    #[must_use]
    pub const fn with_registry(cycle_type: CycleType, registry: Registry) -> Self {
        Self {
            cycle_type,
            limits: cycle_type.limits(),
            registry,
        }
    }

    /// Creates an engine from a cycle-type wire tag.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnsupportedCycleType`] for an unknown tag.
    pub fn from_tag(tag: &str) -> Result<Self, EngineError> {
        Ok(Self::new(tag.parse::<CycleType>()?))
    }

    /// Returns the engine's cycle type.
    #[must_use]
    pub const fn cycle_type(&self) -> CycleType {
        self.cycle_type
    }

    /// Returns the engine's cycle limits.
    #[must_use]
    pub const fn limits(&self) -> &CycleLimits {
        &self.limits
    }

    /// Returns the rule registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the rule registry for administration.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Evaluates a driver's duty log at one instant.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidLogData`] when the log violates the
    /// interval invariants; there is no partial result.
    pub fn evaluate(
        &self,
        intervals: &[DutyInterval],
        now: DateTime<Utc>,
        team: Option<TeamDrivingInfo>,
    ) -> Result<HOSStatus, EngineError> {
        // Snapshot first: rule edits after this point don't affect this
        // pass.
        let snapshot = self.registry.snapshot();

        let entries = normalize(intervals, now)?;

        let window_start = cycle_start(&entries, now, &self.limits);
        let sleeper = sleeper_berth_periods(&entries, &self.limits);

        let scoped: Vec<NormalizedInterval> = entries
            .iter()
            .filter(|entry| entry.start >= window_start)
            .cloned()
            .collect();

        let hours_used = scoped
            .iter()
            .filter(|entry| entry.status.is_on_duty())
            .fold(Hours::ZERO, |acc, entry| acc.saturating_add(entry.hours));
        let hours_available = self
            .limits
            .cycle_hours
            .saturating_sub(hours_used)
            .max(Hours::ZERO);

        let violations: Vec<Violation> =
            detect(&snapshot, &scoped, &sleeper, &self.limits, now);

        let eligibility = decide(&scoped, now, &violations, team.as_ref());

        let analytics = compute_analytics(&entries, &violations, &self.limits, now);
        let recommendations =
            restart_recommendations(&sleeper, hours_used, &self.limits, now);

        Ok(HOSStatus {
            can_drive: eligibility.can_drive,
            can_be_on_duty: eligibility.can_be_on_duty,
            needs_rest: eligibility.needs_rest,
            hours_used_this_cycle: hours_used,
            hours_available,
            consecutive_off_duty_hours: consecutive_off_duty_hours(&entries, now),
            last_30_min_break: last_qualifying_break(&entries),
            violations,
            cycle_type: self.cycle_type,
            cycle_start: window_start,
            sleeper_berth_periods: sleeper,
            team_driving_info: team,
            analytics,
            restart_recommendations: recommendations,
        })
    }
}

/// Hours elapsed since the last closed off-duty interval ended.
///
/// Zero when the log has no closed off-duty interval, or when that
/// interval ends at or after `now`.
fn consecutive_off_duty_hours(entries: &[NormalizedInterval], now: DateTime<Utc>) -> Hours {
    entries
        .iter()
        .rev()
        .find(|entry| entry.status == DutyStatus::OffDuty && !entry.open)
        .and_then(|entry| Hours::between(entry.end, now).ok())
        .unwrap_or(Hours::ZERO)
}
