//! Cycle types and their regulatory limits.
//!
//! FMCSA property-carrying limits per cycle type, as a constant table.
//! The values never change at runtime; administrative tuning happens in
//! the rule registry, not here.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hours::Hours;

/// The multi-day duty cycle a carrier operates under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[non_exhaustive]
pub enum CycleType {
    /// 70 on-duty hours in any 8 consecutive days.
    #[default]
    #[serde(rename = "70_8")]
    SeventyHourEightDay,
    /// 60 on-duty hours in any 7 consecutive days.
    #[serde(rename = "60_7")]
    SixtyHourSevenDay,
    /// 34-hour restart variant: 70/8 limits with a 34-hour minimum
    /// off-duty period required to reset the window.
    #[serde(rename = "34_hour")]
    ThirtyFourHourRestart,
}

impl CycleType {
    /// Returns the wire tag for this cycle type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SeventyHourEightDay => "70_8",
            Self::SixtyHourSevenDay => "60_7",
            Self::ThirtyFourHourRestart => "34_hour",
        }
    }

    /// Returns all cycle types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::SeventyHourEightDay,
            Self::SixtyHourSevenDay,
            Self::ThirtyFourHourRestart,
        ]
    }

    /// Returns the regulatory limits for this cycle type.
    #[must_use]
    pub const fn limits(self) -> CycleLimits {
        match self {
            Self::SeventyHourEightDay => CycleLimits {
                max_driving_hours: Hours::from_centis(11_00),
                max_on_duty_hours: Hours::from_centis(14_00),
                min_off_duty_hours: Hours::from_centis(10_00),
                min_sleeper_berth_hours: Hours::from_centis(8_00),
                cycle_hours: Hours::from_centis(70_00),
                cycle_days: 8,
                min_restart_hours: Hours::from_centis(34_00),
            },
            Self::SixtyHourSevenDay => CycleLimits {
                max_driving_hours: Hours::from_centis(11_00),
                max_on_duty_hours: Hours::from_centis(14_00),
                min_off_duty_hours: Hours::from_centis(10_00),
                min_sleeper_berth_hours: Hours::from_centis(8_00),
                cycle_hours: Hours::from_centis(60_00),
                cycle_days: 7,
                min_restart_hours: Hours::from_centis(34_00),
            },
            Self::ThirtyFourHourRestart => CycleLimits {
                max_driving_hours: Hours::from_centis(11_00),
                max_on_duty_hours: Hours::from_centis(14_00),
                min_off_duty_hours: Hours::from_centis(34_00),
                min_sleeper_berth_hours: Hours::from_centis(8_00),
                cycle_hours: Hours::from_centis(70_00),
                cycle_days: 8,
                min_restart_hours: Hours::from_centis(34_00),
            },
        }
    }
}

impl std::fmt::Display for CycleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CycleType {
    type Err = CycleTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "70_8" => Ok(Self::SeventyHourEightDay),
            "60_7" => Ok(Self::SixtyHourSevenDay),
            "34_hour" => Ok(Self::ThirtyFourHourRestart),
            other => Err(CycleTypeError::UnsupportedCycleType {
                tag: other.to_string(),
            }),
        }
    }
}

/// Errors produced when resolving a cycle type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CycleTypeError {
    /// The cycle tag is not one of the supported cycle types.
    #[error("unsupported cycle type: {tag:?} (expected 70_8, 60_7, or 34_hour)")]
    UnsupportedCycleType {
        /// The rejected tag.
        tag: String,
    },
}

/// Regulatory limits for one cycle type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleLimits {
    /// Maximum continuous driving hours.
    pub max_driving_hours: Hours,
    /// Maximum continuous on-duty hours.
    pub max_on_duty_hours: Hours,
    /// Minimum off-duty hours between shifts.
    pub min_off_duty_hours: Hours,
    /// Minimum sleeper-berth hours for a qualifying rest.
    pub min_sleeper_berth_hours: Hours,
    /// Maximum on-duty hours within the rolling cycle window.
    pub cycle_hours: Hours,
    /// Length of the rolling cycle window, in days.
    pub cycle_days: i64,
    /// Minimum consecutive off-duty hours for a valid cycle restart.
    pub min_restart_hours: Hours,
}
