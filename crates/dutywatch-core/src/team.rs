//! Team-driving coordination.
//!
//! Team operations pair two drivers (plus an optional relief driver) on
//! one vehicle. Only the driver currently holding the wheel may drive;
//! the eligibility decision consumes a [`TeamDrivingInfo`] describing
//! both the active seat and the seat held by the driver being evaluated.
//!
//! [`TeamCoordinator`] is a small in-memory store for team state and
//! handoffs. It performs no I/O; persistence of team state belongs to a
//! collaborator, like everything else in this crate.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// A seat on a team-driving roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum TeamDrivingRole {
    /// Primary driver.
    #[serde(rename = "driver_1")]
    Driver1,
    /// Second driver.
    #[serde(rename = "driver_2")]
    Driver2,
    /// Relief driver.
    ReliefDriver,
}

impl TeamDrivingRole {
    /// Returns the wire tag for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Driver1 => "driver_1",
            Self::Driver2 => "driver_2",
            Self::ReliefDriver => "relief_driver",
        }
    }
}

impl std::fmt::Display for TeamDrivingRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Team-driving coordination state for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDrivingInfo {
    /// Stable team identifier.
    pub team_id: String,
    /// Driver holding the `driver_1` seat.
    pub driver_1_id: String,
    /// Driver holding the `driver_2` seat.
    pub driver_2_id: String,
    /// The seat currently allowed to drive.
    pub current_driver: TeamDrivingRole,
    /// The seat held by the driver being evaluated.
    pub subject_role: TeamDrivingRole,
    /// When the wheel last changed hands.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub handoff_time: Option<DateTime<Utc>>,
    /// Where the wheel last changed hands.
    pub handoff_location: String,
    /// Free-form coordination notes.
    pub coordination_notes: String,
}

impl TeamDrivingInfo {
    /// Builds a fresh team with driver 1 at the wheel, evaluated from the
    /// driver-1 seat.
    #[must_use]
    pub fn new(
        team_id: impl Into<String>,
        driver_1_id: impl Into<String>,
        driver_2_id: impl Into<String>,
    ) -> Self {
        Self {
            team_id: team_id.into(),
            driver_1_id: driver_1_id.into(),
            driver_2_id: driver_2_id.into(),
            current_driver: TeamDrivingRole::Driver1,
            subject_role: TeamDrivingRole::Driver1,
            handoff_time: None,
            handoff_location: String::new(),
            coordination_notes: String::new(),
        }
    }

    /// Returns a copy evaluated from the given seat.
    #[must_use]
    pub fn with_subject_role(mut self, role: TeamDrivingRole) -> Self {
        self.subject_role = role;
        self
    }

    /// Returns `true` when the evaluated driver holds the wheel.
    #[must_use]
    pub fn subject_is_active(&self) -> bool {
        self.subject_role == self.current_driver
    }
}

/// Errors produced by team coordination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TeamError {
    /// No team with the given identifier exists.
    #[error("team not found: {team_id}")]
    TeamNotFound {
        /// The unknown team identifier.
        team_id: String,
    },

    /// A team with the given identifier already exists.
    #[error("team already exists: {team_id}")]
    TeamAlreadyExists {
        /// The duplicate team identifier.
        team_id: String,
    },
}

/// In-memory coordinator for active driving teams.
#[derive(Debug, Clone, Default)]
pub struct TeamCoordinator {
    teams: HashMap<String, TeamDrivingInfo>,
}

impl TeamCoordinator {
    /// Creates an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a team with driver 1 at the wheel.
    ///
    /// # Errors
    ///
    /// Returns [`TeamError::TeamAlreadyExists`] for a duplicate id.
    pub fn create_team(
        &mut self,
        team_id: &str,
        driver_1_id: &str,
        driver_2_id: &str,
    ) -> Result<&TeamDrivingInfo, TeamError> {
        if self.teams.contains_key(team_id) {
            return Err(TeamError::TeamAlreadyExists {
                team_id: team_id.to_string(),
            });
        }

        info!(team_id, driver_1_id, driver_2_id, "creating team");
        let info = TeamDrivingInfo::new(team_id, driver_1_id, driver_2_id);
        Ok(self.teams.entry(team_id.to_string()).or_insert(info))
    }

    /// Hands the wheel to the other primary seat.
    ///
    /// The relief seat never holds the wheel through a routine handoff;
    /// handoffs alternate between driver 1 and driver 2.
    ///
    /// # Errors
    ///
    /// Returns [`TeamError::TeamNotFound`] for an unknown id.
    pub fn handoff_driving(
        &mut self,
        team_id: &str,
        now: DateTime<Utc>,
        location: &str,
        notes: &str,
    ) -> Result<TeamDrivingRole, TeamError> {
        let team = self
            .teams
            .get_mut(team_id)
            .ok_or_else(|| TeamError::TeamNotFound {
                team_id: team_id.to_string(),
            })?;

        team.current_driver = match team.current_driver {
            TeamDrivingRole::Driver1 => TeamDrivingRole::Driver2,
            TeamDrivingRole::Driver2 | TeamDrivingRole::ReliefDriver => TeamDrivingRole::Driver1,
        };
        team.handoff_time = Some(now);
        team.handoff_location = location.to_string();
        team.coordination_notes = notes.to_string();

        info!(team_id, wheel = %team.current_driver, location, "driving handoff");
        Ok(team.current_driver)
    }

    /// Returns the current state of a team, if it exists.
    #[must_use]
    pub fn team_status(&self, team_id: &str) -> Option<&TeamDrivingInfo> {
        self.teams.get(team_id)
    }
}
