//! Fixed-point hour arithmetic.
//!
//! Every hour figure in the engine is an [`Hours`] value: a signed
//! fixed-point quantity with exactly two fractional digits, backed by an
//! `i64` count of hundredths of an hour ("centihours"). Summing many
//! interval durations in binary floating point drifts; summing integers
//! does not, so compliance totals computed here are exact and reproducible
//! across runs.
//!
//! [`Hours::between`] is the only way to turn a pair of timestamps into a
//! duration. Downstream modules never do ad hoc time division; they
//! combine `Hours` values with the saturating arithmetic below.
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use dutywatch_core::hours::Hours;
//!
//! let start = Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 0).unwrap();
//!
//! let worked = Hours::between(start, end).unwrap();
//! assert_eq!(worked, Hours::from_centis(12_50));
//! assert_eq!(worked.to_string(), "12.50");
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Centihours per whole hour.
const CENTIS_PER_HOUR: i64 = 100;

/// Seconds per hour, used when rounding interval spans to centihours.
const SECONDS_PER_HOUR: i64 = 3_600;

/// Errors produced by fixed-point hour arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum HoursError {
    /// An interval whose end is at or before its start has no duration.
    #[error("invalid interval: end {end} is not after start {start}")]
    InvalidInterval {
        /// Interval start.
        start: DateTime<Utc>,
        /// Interval end (equal to or earlier than `start`).
        end: DateTime<Utc>,
    },

    /// A textual hour literal could not be parsed.
    #[error("invalid hours literal: {literal:?}")]
    InvalidLiteral {
        /// The rejected input.
        literal: String,
    },
}

/// A fixed-point quantity of hours with two fractional digits.
///
/// `Hours` is also the representation for every derived two-decimal metric
/// in the engine (compliance scores, percentages, restarts-per-week), so
/// that all compliance arithmetic stays in one exact integer domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hours(i64);

impl Hours {
    /// Zero hours.
    pub const ZERO: Self = Self(0);

    /// Builds a value from a raw centihour count.
    #[must_use]
    pub const fn from_centis(centis: i64) -> Self {
        Self(centis)
    }

    /// Builds a value from a whole number of hours.
    #[must_use]
    pub const fn from_whole(hours: i64) -> Self {
        Self(hours * CENTIS_PER_HOUR)
    }

    /// Returns the raw centihour count.
    #[must_use]
    pub const fn centis(self) -> i64 {
        self.0
    }

    /// Returns `true` if the value is exactly zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Computes the elapsed hours between two timestamps.
    ///
    /// The span is rounded to the nearest centihour (half away from zero).
    ///
    /// # Errors
    ///
    /// Returns [`HoursError::InvalidInterval`] when `end <= start`.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, HoursError> {
        if end <= start {
            return Err(HoursError::InvalidInterval { start, end });
        }
        let seconds = (end - start).num_seconds();
        let centis = (seconds.saturating_mul(CENTIS_PER_HOUR) + SECONDS_PER_HOUR / 2)
            / SECONDS_PER_HOUR;
        Ok(Self(centis))
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction. The result may be negative.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Returns the amount by which `self` exceeds `limit`, if it does.
    #[must_use]
    pub const fn excess_over(self, limit: Self) -> Option<Self> {
        if self.0 > limit.0 {
            Some(Self(self.0 - limit.0))
        } else {
            None
        }
    }

    /// Returns `self` as a percentage of `whole`, as a two-decimal value.
    ///
    /// Returns zero when `whole` is zero.
    #[must_use]
    pub fn percent_of(self, whole: Self) -> Self {
        if whole.0 == 0 {
            return Self::ZERO;
        }
        let scaled = i128::from(self.0) * 100 * i128::from(CENTIS_PER_HOUR);
        Self(round_div_i128(scaled, i128::from(whole.0)))
    }

    /// Builds a two-decimal value from a ratio of whole units.
    ///
    /// Returns zero when `denominator` is zero.
    #[must_use]
    pub fn from_ratio(numerator: i64, denominator: i64) -> Self {
        if denominator == 0 {
            return Self::ZERO;
        }
        let scaled = i128::from(numerator) * i128::from(CENTIS_PER_HOUR);
        Self(round_div_i128(scaled, i128::from(denominator)))
    }

    /// Divides the value by a count, rounding to the nearest centihour.
    ///
    /// Returns zero when `divisor` is zero.
    #[must_use]
    pub fn div_round(self, divisor: i64) -> Self {
        if divisor == 0 {
            return Self::ZERO;
        }
        Self(round_div_i128(i128::from(self.0), i128::from(divisor)))
    }
}

/// Rounds `numerator / denominator` half away from zero.
#[allow(clippy::cast_possible_truncation)] // Quotients stay within centihour range.
fn round_div_i128(numerator: i128, denominator: i128) -> i64 {
    let half = denominator.abs() / 2;
    let adjusted = if numerator >= 0 {
        numerator + half
    } else {
        numerator - half
    };
    (adjusted / denominator) as i64
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Hours {
    type Err = HoursError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reject = || HoursError::InvalidLiteral {
            literal: s.to_string(),
        };

        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole_part, frac_part) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body, ""),
        };
        if whole_part.is_empty() || frac_part.len() > 2 {
            return Err(reject());
        }
        if !whole_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(reject());
        }

        let whole: i64 = whole_part.parse().map_err(|_| reject())?;
        let frac: i64 = if frac_part.is_empty() {
            0
        } else {
            // Right-pad to two digits so "12.3" reads as 12.30.
            let padded = format!("{frac_part:0<2}");
            padded.parse().map_err(|_| reject())?
        };

        let centis = whole
            .checked_mul(CENTIS_PER_HOUR)
            .and_then(|c| c.checked_add(frac))
            .ok_or_else(reject)?;
        Ok(Self(if negative { -centis } else { centis }))
    }
}

impl Serialize for Hours {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hours {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HoursVisitor;

        impl Visitor<'_> for HoursVisitor {
            type Value = Hours;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an hours string with up to two fractional digits")
            }

            fn visit_str<E>(self, value: &str) -> Result<Hours, E>
            where
                E: de::Error,
            {
                value.parse().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(HoursVisitor)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_between_whole_hours() {
        let hours = Hours::between(at(6, 0), at(17, 0)).unwrap();
        assert_eq!(hours, Hours::from_whole(11));
    }

    #[test]
    fn test_between_rounds_to_centihours() {
        // 30 minutes is exactly 0.50h.
        assert_eq!(
            Hours::between(at(6, 0), at(6, 30)).unwrap(),
            Hours::from_centis(50)
        );
        // 10 minutes is 0.1666..h, rounding to 0.17.
        assert_eq!(
            Hours::between(at(6, 0), at(6, 10)).unwrap(),
            Hours::from_centis(17)
        );
    }

    #[test]
    fn test_between_rejects_inverted_interval() {
        let err = Hours::between(at(12, 0), at(6, 0)).unwrap_err();
        assert!(matches!(err, HoursError::InvalidInterval { .. }));
    }

    #[test]
    fn test_between_rejects_empty_interval() {
        assert!(Hours::between(at(6, 0), at(6, 0)).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Hours::from_centis(1_234).to_string(), "12.34");
        assert_eq!(Hours::from_centis(5).to_string(), "0.05");
        assert_eq!(Hours::from_centis(-150).to_string(), "-1.50");
        assert_eq!(Hours::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("12.34".parse::<Hours>().unwrap(), Hours::from_centis(1_234));
        assert_eq!("12.3".parse::<Hours>().unwrap(), Hours::from_centis(1_230));
        assert_eq!("12".parse::<Hours>().unwrap(), Hours::from_whole(12));
        assert_eq!("-0.50".parse::<Hours>().unwrap(), Hours::from_centis(-50));
        assert!("12.345".parse::<Hours>().is_err());
        assert!("".parse::<Hours>().is_err());
        assert!("1.2.3".parse::<Hours>().is_err());
        assert!("abc".parse::<Hours>().is_err());
    }

    #[test]
    fn test_excess_over() {
        let twelve = Hours::from_whole(12);
        let eleven = Hours::from_whole(11);
        assert_eq!(twelve.excess_over(eleven), Some(Hours::from_whole(1)));
        assert_eq!(eleven.excess_over(twelve), None);
        assert_eq!(eleven.excess_over(eleven), None);
    }

    #[test]
    fn test_percent_of() {
        let used = Hours::from_whole(35);
        let limit = Hours::from_whole(70);
        assert_eq!(used.percent_of(limit), Hours::from_whole(50));
        assert_eq!(used.percent_of(Hours::ZERO), Hours::ZERO);
    }

    #[test]
    fn test_from_ratio() {
        // 2 restarts over 7 days, scaled to a week: 2.00.
        assert_eq!(Hours::from_ratio(2 * 7, 7), Hours::from_whole(2));
        // 1 restart over 3 days: 7/3 = 2.33.
        assert_eq!(Hours::from_ratio(7, 3), Hours::from_centis(233));
        assert_eq!(Hours::from_ratio(5, 0), Hours::ZERO);
    }

    #[test]
    fn test_div_round() {
        assert_eq!(Hours::from_centis(1_000).div_round(3), Hours::from_centis(333));
        assert_eq!(Hours::from_centis(1_001).div_round(2), Hours::from_centis(501));
        assert_eq!(Hours::from_centis(100).div_round(0), Hours::ZERO);
    }

    #[test]
    fn test_saturating_arithmetic() {
        let max = Hours::from_centis(i64::MAX);
        assert_eq!(max.saturating_add(Hours::from_whole(1)), max);
        assert_eq!(
            Hours::from_whole(5).saturating_sub(Hours::from_whole(7)),
            Hours::from_whole(-2)
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let hours = Hours::from_centis(1_234);
        let json = serde_json::to_string(&hours).unwrap();
        assert_eq!(json, "\"12.34\"");
        let back: Hours = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hours);
    }
}
