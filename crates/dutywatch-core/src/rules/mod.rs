//! Rule registry: the source of truth for which checks run.
//!
//! The registry holds named, parameterized, independently toggleable rule
//! definitions. Administrative callers may register or update rules
//! between evaluations; each evaluation takes an immutable
//! [`RuleSnapshot`] up front so concurrent edits can never produce a
//! half-old/half-new rule set mid-pass (read-snapshot-then-evaluate).
//!
//! Registration order is significant: the detector emits violations in
//! snapshot order, which is registration order.
//!
//! # Example
//!
//! ```rust
//! use dutywatch_core::rules::{Registry, RulePatch, rule_ids};
//!
//! let mut registry = Registry::with_defaults();
//!
//! // Disable the split-berth check for this fleet.
//! registry
//!     .update(
//!         rule_ids::SLEEPER_BERTH_SPLIT,
//!         RulePatch {
//!             enabled: Some(false),
//!             ..RulePatch::default()
//!         },
//!     )
//!     .unwrap();
//!
//! let snapshot = registry.snapshot();
//! assert!(snapshot.get(rule_ids::SLEEPER_BERTH_SPLIT).is_none());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::hours::Hours;
use crate::violation::Severity;

/// Well-known rule identifiers for the default FMCSA rule set.
pub mod rule_ids {
    /// 11-hour driving limit.
    pub const DRIVING_LIMIT_11_HOURS: &str = "driving_limit_11_hours";
    /// 14-hour on-duty limit.
    pub const ON_DUTY_LIMIT_14_HOURS: &str = "on_duty_limit_14_hours";
    /// 30-minute break after 8 hours of driving.
    pub const THIRTY_MIN_BREAK_REQUIREMENT: &str = "30_min_break_requirement";
    /// Cycle-hours limit (70h/8d or 60h/7d).
    pub const CYCLE_HOURS_LIMIT: &str = "cycle_hours_limit";
    /// 34-hour restart minimum.
    pub const RESTART_34_HOUR: &str = "34_hour_restart";
    /// Split sleeper-berth validity.
    pub const SLEEPER_BERTH_SPLIT: &str = "sleeper_berth_split";
}

/// A typed rule parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ParamValue {
    /// A fixed-point hour quantity.
    Hours(Hours),
    /// A whole count (days, periods).
    Count(u32),
    /// A boolean toggle.
    Flag(bool),
}

impl ParamValue {
    /// Returns the hour quantity, if this parameter holds one.
    #[must_use]
    pub const fn as_hours(self) -> Option<Hours> {
        match self {
            Self::Hours(hours) => Some(hours),
            Self::Count(_) | Self::Flag(_) => None,
        }
    }

    /// Returns the count, if this parameter holds one.
    #[must_use]
    pub const fn as_count(self) -> Option<u32> {
        match self {
            Self::Count(count) => Some(count),
            Self::Hours(_) | Self::Flag(_) => None,
        }
    }
}

/// A named, parameterized compliance rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable rule identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What the rule enforces.
    pub description: String,
    /// Severity assigned to violations of this rule.
    pub severity: Severity,
    /// Whether the detector runs this rule.
    pub enabled: bool,
    /// Rule-specific thresholds, keyed by parameter name.
    pub parameters: BTreeMap<String, ParamValue>,
}

impl Rule {
    /// Returns an hour parameter by key, if present and hour-typed.
    #[must_use]
    pub fn param_hours(&self, key: &str) -> Option<Hours> {
        self.parameters.get(key).copied().and_then(ParamValue::as_hours)
    }

    /// Returns a count parameter by key, if present and count-typed.
    #[must_use]
    pub fn param_count(&self, key: &str) -> Option<u32> {
        self.parameters.get(key).copied().and_then(ParamValue::as_count)
    }
}

/// A partial update applied to an existing rule.
///
/// Every field is optional; absent fields leave the rule unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePatch {
    /// New display name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New severity.
    pub severity: Option<Severity>,
    /// Enable or disable the rule.
    pub enabled: Option<bool>,
    /// Replacement parameter map.
    pub parameters: Option<BTreeMap<String, ParamValue>>,
}

/// Errors produced by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// No rule with the given identifier exists.
    #[error("rule not found: {rule_id}")]
    RuleNotFound {
        /// The unknown rule identifier.
        rule_id: String,
    },
}

/// The ordered rule registry.
///
/// Backed by a `Vec` so registration order is preserved; lookups are
/// linear over a handful of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    rules: Vec<Rule>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Creates a registry preloaded with the default FMCSA rule set.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Registers a rule.
    ///
    /// A rule with the same id replaces the existing entry in place,
    /// keeping its registration position; otherwise the rule is appended.
    pub fn register(&mut self, rule: Rule) {
        debug!(rule_id = %rule.id, "registering rule");
        match self.rules.iter_mut().find(|existing| existing.id == rule.id) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Applies a partial update to an existing rule.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RuleNotFound`] for an unknown id; the
    /// registry is unchanged on failure.
    pub fn update(&mut self, rule_id: &str, patch: RulePatch) -> Result<(), RegistryError> {
        let rule = self
            .rules
            .iter_mut()
            .find(|rule| rule.id == rule_id)
            .ok_or_else(|| RegistryError::RuleNotFound {
                rule_id: rule_id.to_string(),
            })?;

        debug!(rule_id, "updating rule");
        if let Some(name) = patch.name {
            rule.name = name;
        }
        if let Some(description) = patch.description {
            rule.description = description;
        }
        if let Some(severity) = patch.severity {
            rule.severity = severity;
        }
        if let Some(enabled) = patch.enabled {
            rule.enabled = enabled;
        }
        if let Some(parameters) = patch.parameters {
            rule.parameters = parameters;
        }
        Ok(())
    }

    /// Looks up a rule by id.
    #[must_use]
    pub fn get(&self, rule_id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == rule_id)
    }

    /// Returns all rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Takes an immutable snapshot of the enabled rules, in registration
    /// order, for one evaluation pass.
    #[must_use]
    pub fn snapshot(&self) -> RuleSnapshot {
        RuleSnapshot {
            rules: self
                .rules
                .iter()
                .filter(|rule| rule.enabled)
                .cloned()
                .collect(),
        }
    }
}

/// An immutable, enabled-only copy of the registry for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSnapshot {
    rules: Vec<Rule>,
}

impl RuleSnapshot {
    /// Iterates the snapshot's rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Looks up a rule by id.
    #[must_use]
    pub fn get(&self, rule_id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == rule_id)
    }

    /// Returns the number of rules in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the snapshot holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Builds the default FMCSA rule set.
fn default_rules() -> Vec<Rule> {
    fn hours_param(key: &str, centis: i64) -> (String, ParamValue) {
        (key.to_string(), ParamValue::Hours(Hours::from_centis(centis)))
    }

    vec![
        Rule {
            id: rule_ids::DRIVING_LIMIT_11_HOURS.to_string(),
            name: "11-Hour Driving Limit".to_string(),
            description: "Maximum 11 hours of driving after 10 consecutive hours off duty"
                .to_string(),
            severity: Severity::Major,
            enabled: true,
            parameters: [hours_param("max_hours", 11_00)].into(),
        },
        Rule {
            id: rule_ids::ON_DUTY_LIMIT_14_HOURS.to_string(),
            name: "14-Hour On-Duty Limit".to_string(),
            description: "Maximum 14 hours on duty after 10 consecutive hours off duty"
                .to_string(),
            severity: Severity::Major,
            enabled: true,
            parameters: [hours_param("max_hours", 14_00)].into(),
        },
        Rule {
            id: rule_ids::THIRTY_MIN_BREAK_REQUIREMENT.to_string(),
            name: "30-Minute Break Requirement".to_string(),
            description: "Must take 30-minute break after 8 hours of driving".to_string(),
            severity: Severity::Major,
            enabled: true,
            parameters: [
                hours_param("break_threshold", 8_00),
                hours_param("min_break", 50),
            ]
            .into(),
        },
        Rule {
            id: rule_ids::CYCLE_HOURS_LIMIT.to_string(),
            name: "Cycle Hours Limit".to_string(),
            description: "Maximum hours in 70/8 or 60/7 cycle".to_string(),
            severity: Severity::Critical,
            enabled: true,
            parameters: [
                hours_param("cycle_hours", 70_00),
                ("cycle_days".to_string(), ParamValue::Count(8)),
            ]
            .into(),
        },
        Rule {
            id: rule_ids::RESTART_34_HOUR.to_string(),
            name: "34-Hour Restart".to_string(),
            description: "Minimum 34 consecutive hours off duty to restart cycle".to_string(),
            severity: Severity::Critical,
            enabled: true,
            parameters: [hours_param("min_hours", 34_00)].into(),
        },
        Rule {
            id: rule_ids::SLEEPER_BERTH_SPLIT.to_string(),
            name: "Sleeper Berth Split".to_string(),
            description: "Sleeper berth time can be split into two periods".to_string(),
            severity: Severity::Minor,
            enabled: true,
            parameters: [
                hours_param("min_first_period", 2_00),
                hours_param("min_second_period", 2_00),
            ]
            .into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_present_in_registration_order() {
        let registry = Registry::with_defaults();
        let ids: Vec<&str> = registry.rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                rule_ids::DRIVING_LIMIT_11_HOURS,
                rule_ids::ON_DUTY_LIMIT_14_HOURS,
                rule_ids::THIRTY_MIN_BREAK_REQUIREMENT,
                rule_ids::CYCLE_HOURS_LIMIT,
                rule_ids::RESTART_34_HOUR,
                rule_ids::SLEEPER_BERTH_SPLIT,
            ]
        );
    }

    #[test]
    fn test_default_parameters() {
        let registry = Registry::with_defaults();
        let driving = registry.get(rule_ids::DRIVING_LIMIT_11_HOURS).unwrap();
        assert_eq!(driving.param_hours("max_hours"), Some(Hours::from_whole(11)));
        assert_eq!(driving.severity, Severity::Major);

        let cycle = registry.get(rule_ids::CYCLE_HOURS_LIMIT).unwrap();
        assert_eq!(cycle.param_count("cycle_days"), Some(8));
        assert_eq!(cycle.severity, Severity::Critical);

        let brk = registry.get(rule_ids::THIRTY_MIN_BREAK_REQUIREMENT).unwrap();
        assert_eq!(brk.param_hours("min_break"), Some(Hours::from_centis(50)));
    }

    #[test]
    fn test_update_unknown_rule_fails_without_side_effects() {
        let mut registry = Registry::with_defaults();
        let before = registry.clone();

        let err = registry
            .update(
                "no_such_rule",
                RulePatch {
                    enabled: Some(false),
                    ..RulePatch::default()
                },
            )
            .unwrap_err();

        assert!(matches!(err, RegistryError::RuleNotFound { .. }));
        assert_eq!(registry, before);
    }

    #[test]
    fn test_update_toggles_rule() {
        let mut registry = Registry::with_defaults();
        registry
            .update(
                rule_ids::RESTART_34_HOUR,
                RulePatch {
                    enabled: Some(false),
                    ..RulePatch::default()
                },
            )
            .unwrap();

        assert!(!registry.get(rule_ids::RESTART_34_HOUR).unwrap().enabled);
        assert!(registry.snapshot().get(rule_ids::RESTART_34_HOUR).is_none());
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = Registry::with_defaults();
        let mut custom = registry.get(rule_ids::DRIVING_LIMIT_11_HOURS).unwrap().clone();
        custom.severity = Severity::Critical;
        registry.register(custom);

        // Position preserved, severity replaced.
        assert_eq!(registry.rules()[0].id, rule_ids::DRIVING_LIMIT_11_HOURS);
        assert_eq!(registry.rules()[0].severity, Severity::Critical);
        assert_eq!(registry.rules().len(), 6);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_updates() {
        let mut registry = Registry::with_defaults();
        let snapshot = registry.snapshot();

        registry
            .update(
                rule_ids::DRIVING_LIMIT_11_HOURS,
                RulePatch {
                    enabled: Some(false),
                    ..RulePatch::default()
                },
            )
            .unwrap();

        // The snapshot still carries the rule that was enabled at capture.
        assert!(snapshot.get(rule_ids::DRIVING_LIMIT_11_HOURS).is_some());
        assert_eq!(snapshot.len(), 6);
    }
}
