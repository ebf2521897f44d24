//! Violation records, severities, and kinds.
//!
//! A [`Violation`] is produced by the detector for each rule breach found
//! in one evaluation pass, then handed to a persistence collaborator. Its
//! `status` and resolution fields evolve only through the
//! [`workflow`](crate::workflow) state machine; the detector creates every
//! violation in [`ResolutionStatus::Pending`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hours::Hours;

/// Severity tiers for violations and rules.
///
/// # Ordering
///
/// Severities are ordered `Critical > Major > Minor` using an explicit
/// rank mapping, not enum ordinal, so comparison stays correct if
/// variants are reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Severity {
    /// Advisory finding; no immediate operational impact.
    Minor,
    /// Requires corrective action before further driving.
    Major,
    /// Requires the driver to be taken out of service.
    Critical,
}

impl Severity {
    /// Returns the numeric rank of this severity (higher is worse).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Critical => 2,
            Self::Major => 1,
            Self::Minor => 0,
        }
    }

    /// Returns the compliance-score penalty for one violation of this
    /// severity.
    #[must_use]
    pub const fn penalty_points(self) -> u32 {
        match self {
            Self::Critical => 20,
            Self::Major => 10,
            Self::Minor => 5,
        }
    }

    /// Returns the wire tag for this severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Major => "major",
            Self::Critical => "critical",
        }
    }

    /// Returns all severities in descending order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Critical, Self::Major, Self::Minor]
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// The closed set of violation kinds the detector can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ViolationKind {
    /// A continuous driving interval exceeded the 11-hour limit.
    #[serde(rename = "driving_over_11")]
    DrivingOver11,
    /// A continuous on-duty interval exceeded the 14-hour limit.
    #[serde(rename = "on_duty_over_14")]
    OnDutyOver14,
    /// More than 8 driving hours without a qualifying 30-minute break.
    #[serde(rename = "no_30_min_break")]
    No30MinBreak,
    /// On-duty hours in the cycle window exceeded the cycle limit.
    CycleHoursExceeded,
    /// An off-duty period too short to qualify as a 34-hour restart.
    #[serde(rename = "invalid_34_hour_restart")]
    Invalid34HourRestart,
    /// The first leg of a split sleeper-berth pair is under 2 hours.
    InvalidSplitBerthFirst,
    /// The second leg of a split sleeper-berth pair is under 2 hours.
    InvalidSplitBerthSecond,
}

impl ViolationKind {
    /// Returns the wire tag for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DrivingOver11 => "driving_over_11",
            Self::OnDutyOver14 => "on_duty_over_14",
            Self::No30MinBreak => "no_30_min_break",
            Self::CycleHoursExceeded => "cycle_hours_exceeded",
            Self::Invalid34HourRestart => "invalid_34_hour_restart",
            Self::InvalidSplitBerthFirst => "invalid_split_berth_first",
            Self::InvalidSplitBerthSecond => "invalid_split_berth_second",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution lifecycle states for a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ResolutionStatus {
    /// Newly detected; awaiting triage.
    #[default]
    Pending,
    /// Acknowledged and under review.
    InReview,
    /// Contested by the driver or carrier.
    Disputed,
    /// Raised to a higher authority.
    Escalated,
    /// Closed; immutable except through reopen.
    Resolved,
}

impl ResolutionStatus {
    /// Returns the wire tag for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::Disputed => "disputed",
            Self::Escalated => "escalated",
            Self::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a violation's append-only resolution log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionNote {
    /// When the action was applied.
    pub at: DateTime<Utc>,
    /// Who applied it.
    pub actor: String,
    /// The workflow action tag.
    pub action: String,
    /// Free-form note text.
    pub text: String,
}

/// A detected HOS violation with its resolution state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// What was breached.
    pub kind: ViolationKind,
    /// Human-readable description of the breach.
    pub description: String,
    /// Severity tier, taken from the breached rule.
    pub severity: Severity,
    /// When the breach occurred.
    pub occurred_at: DateTime<Utc>,
    /// How far past the limit the driver went, where measurable.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub duration_over: Option<Hours>,
    /// Current resolution state.
    pub status: ResolutionStatus,
    /// Append-only log of workflow actions.
    pub resolution_notes: Vec<ResolutionNote>,
    /// Who resolved the violation, once resolved.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resolved_by: Option<String>,
    /// When the violation was resolved, once resolved.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resolved_at: Option<DateTime<Utc>>,
    /// How many times the violation has been escalated.
    pub escalation_level: u32,
    /// Monotonic transition counter for optimistic persistence.
    pub revision: u32,
    /// Whether the breach demands immediate operational action.
    pub requires_immediate_action: bool,
    /// Operational consequence of the breach.
    pub compliance_impact: String,
}

impl Violation {
    /// Builds a new pending violation.
    #[must_use]
    pub fn new(
        kind: ViolationKind,
        description: impl Into<String>,
        severity: Severity,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            severity,
            occurred_at,
            duration_over: None,
            status: ResolutionStatus::Pending,
            resolution_notes: Vec::new(),
            resolved_by: None,
            resolved_at: None,
            escalation_level: 0,
            revision: 0,
            requires_immediate_action: false,
            compliance_impact: String::new(),
        }
    }

    /// Sets the measured excess over the limit.
    #[must_use]
    pub const fn with_duration_over(mut self, over: Hours) -> Self {
        self.duration_over = Some(over);
        self
    }

    /// Marks the violation as demanding immediate action.
    #[must_use]
    pub const fn with_immediate_action(mut self) -> Self {
        self.requires_immediate_action = true;
        self
    }

    /// Sets the operational consequence text.
    #[must_use]
    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.compliance_impact = impact.into();
        self
    }

    /// Returns `true` if the violation is critical.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_severity_rank_ordering() {
        assert!(Severity::Critical > Severity::Major);
        assert!(Severity::Major > Severity::Minor);
        assert_eq!(Severity::Critical.rank(), 2);
        assert_eq!(Severity::Minor.rank(), 0);
    }

    #[test]
    fn test_severity_penalty_points() {
        assert_eq!(Severity::Critical.penalty_points(), 20);
        assert_eq!(Severity::Major.penalty_points(), 10);
        assert_eq!(Severity::Minor.penalty_points(), 5);
    }

    #[test]
    fn test_violation_kind_tags() {
        assert_eq!(ViolationKind::DrivingOver11.as_str(), "driving_over_11");
        assert_eq!(ViolationKind::OnDutyOver14.as_str(), "on_duty_over_14");
        assert_eq!(ViolationKind::No30MinBreak.as_str(), "no_30_min_break");
        assert_eq!(
            ViolationKind::CycleHoursExceeded.as_str(),
            "cycle_hours_exceeded"
        );
        assert_eq!(
            ViolationKind::Invalid34HourRestart.as_str(),
            "invalid_34_hour_restart"
        );
    }

    #[test]
    fn test_violation_kind_serde_matches_wire_tags() {
        let kinds = [
            ViolationKind::DrivingOver11,
            ViolationKind::OnDutyOver14,
            ViolationKind::No30MinBreak,
            ViolationKind::CycleHoursExceeded,
            ViolationKind::Invalid34HourRestart,
            ViolationKind::InvalidSplitBerthFirst,
            ViolationKind::InvalidSplitBerthSecond,
        ];
        for kind in kinds {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            let back: ViolationKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn test_new_violation_is_pending() {
        let occurred = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let violation = Violation::new(
            ViolationKind::DrivingOver11,
            "drove too long",
            Severity::Major,
            occurred,
        )
        .with_duration_over(Hours::from_whole(1))
        .with_immediate_action();

        assert_eq!(violation.status, ResolutionStatus::Pending);
        assert_eq!(violation.duration_over, Some(Hours::from_whole(1)));
        assert!(violation.requires_immediate_action);
        assert_eq!(violation.escalation_level, 0);
        assert_eq!(violation.revision, 0);
        assert!(!violation.is_critical());
    }
}
