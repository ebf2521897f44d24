//! Restart recommendations.
//!
//! Advisory output only: nothing here affects violations or eligibility.
//! The recommendation tiers trigger on cycle progress — an immediate
//! restart call at 90% of the cycle limit, an advance warning at 80%, and
//! a suggested restart time once 70% is reached.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cycle::SleeperBerthPeriod;
use crate::hours::Hours;
use crate::limits::CycleLimits;

/// Cycle progress (percent) at which an immediate restart is demanded.
pub const IMMEDIATE_RESTART_PERCENT: Hours = Hours::from_centis(90_00);

/// Cycle progress (percent) at which a restart is suggested soon.
pub const RESTART_SOON_PERCENT: Hours = Hours::from_centis(80_00);

/// Cycle progress (percent) at which an optimal restart time is offered.
pub const OPTIMAL_RESTART_PERCENT: Hours = Hours::from_centis(70_00);

/// Advisory categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum AdvisoryKind {
    /// Cycle limit nearly reached; restart now.
    RestartImmediate,
    /// Cycle limit approaching; plan a restart.
    RestartSoon,
}

/// Advisory urgency tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum AdvisoryPriority {
    /// Act immediately.
    Critical,
    /// Act soon.
    High,
}

/// One restart advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartAdvisory {
    /// Advisory category.
    pub kind: AdvisoryKind,
    /// Human-readable guidance.
    pub message: String,
    /// Urgency tier.
    pub priority: AdvisoryPriority,
    /// Whether the driver must act before continuing.
    pub action_required: bool,
}

/// Ways to satisfy the sleeper-berth rest requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum BerthOptionKind {
    /// One uninterrupted berth period.
    SinglePeriod,
    /// Two qualifying berth periods.
    SplitPeriod,
}

/// A sleeper-berth rest option presented to the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleeperBerthOption {
    /// Which arrangement this option describes.
    pub kind: BerthOptionKind,
    /// Human-readable summary.
    pub description: String,
    /// Minimum hours for the arrangement to qualify.
    pub minimum_hours: Hours,
    /// Why a driver might choose this option.
    pub benefits: Vec<String>,
}

/// Restart guidance for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartRecommendations {
    /// End of the most recent restart-qualifying sleeper period.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_restart: Option<DateTime<Utc>>,
    /// Hours elapsed since that restart ended.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub time_since_restart: Option<Hours>,
    /// On-duty hours used in the current cycle window.
    pub current_cycle_hours: Hours,
    /// The cycle's hour limit.
    pub cycle_limit: Hours,
    /// Cycle usage as a percentage of the limit.
    pub cycle_progress_percent: Hours,
    /// Tiered advisories, most urgent first.
    pub advisories: Vec<RestartAdvisory>,
    /// Suggested restart start time, once progress warrants one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub optimal_restart_time: Option<DateTime<Utc>>,
    /// Rest arrangements that would satisfy the berth requirement.
    pub sleeper_berth_options: Vec<SleeperBerthOption>,
}

/// Builds restart guidance from the evaluation's sleeper periods and
/// cycle usage.
#[must_use]
pub fn restart_recommendations(
    sleeper_periods: &[SleeperBerthPeriod],
    cycle_hours_used: Hours,
    limits: &CycleLimits,
    now: DateTime<Utc>,
) -> RestartRecommendations {
    let last_restart = sleeper_periods
        .iter()
        .find(|period| period.is_valid_for_restart)
        .and_then(|period| period.end);

    let time_since_restart =
        last_restart.and_then(|ended| Hours::between(ended, now).ok());

    let progress = cycle_hours_used.percent_of(limits.cycle_hours);

    let mut advisories = Vec::new();
    if progress >= IMMEDIATE_RESTART_PERCENT {
        advisories.push(RestartAdvisory {
            kind: AdvisoryKind::RestartImmediate,
            message: "Cycle limit nearly reached - 34-hour restart required immediately"
                .to_string(),
            priority: AdvisoryPriority::Critical,
            action_required: true,
        });
    } else if progress >= RESTART_SOON_PERCENT {
        advisories.push(RestartAdvisory {
            kind: AdvisoryKind::RestartSoon,
            message: "Consider a 34-hour restart soon to reset your cycle".to_string(),
            priority: AdvisoryPriority::High,
            action_required: false,
        });
    }

    let optimal_restart_time =
        (progress >= OPTIMAL_RESTART_PERCENT).then_some(now + Duration::hours(1));

    RestartRecommendations {
        last_restart,
        time_since_restart,
        current_cycle_hours: cycle_hours_used,
        cycle_limit: limits.cycle_hours,
        cycle_progress_percent: progress,
        advisories,
        optimal_restart_time,
        sleeper_berth_options: berth_options(),
    }
}

/// The two standing berth arrangements.
fn berth_options() -> Vec<SleeperBerthOption> {
    vec![
        SleeperBerthOption {
            kind: BerthOptionKind::SinglePeriod,
            description: "Single 8+ hour sleeper berth period".to_string(),
            minimum_hours: Hours::from_whole(8),
            benefits: vec![
                "Simplest option".to_string(),
                "Full cycle reset".to_string(),
            ],
        },
        SleeperBerthOption {
            kind: BerthOptionKind::SplitPeriod,
            description: "Split sleeper berth (2+2 hours)".to_string(),
            minimum_hours: Hours::from_whole(4),
            benefits: vec![
                "More flexible".to_string(),
                "Can be split across days".to_string(),
            ],
        },
    ]
}
