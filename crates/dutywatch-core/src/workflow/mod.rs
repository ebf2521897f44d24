//! Violation resolution workflow state machine.
//!
//! Governs how a detected violation is acknowledged, disputed, escalated,
//! and resolved. Transitions are explicit per-state allow-lists; an
//! action missing from the current state's list fails with
//! [`WorkflowError::InvalidTransition`] and performs no mutation. The
//! check-and-apply is atomic over the borrowed violation; callers enforce
//! at-most-one-writer-per-violation (the `revision` counter supports
//! optimistic versioning in the persistence layer).
//!
//! # State Machine
//!
//! ```text
//!              acknowledge              resolve
//!    ┌─────────┐ ───────► ┌───────────┐ ───────► ┌──────────┐
//!    │ Pending │          │ In Review │          │ Resolved │
//!    └─────────┘ ───┐     └───────────┘          └──────────┘
//!      ▲   │        │       │      ▲                  │
//!      │   │dispute │reject │      │review            │reopen
//!      │   ▼        ▼       ▼      │                  │
//!      │  ┌──────────┐   escalate ┌───────────┐       │
//!      │  │ Disputed │ ──────────►│ Escalated │       │
//!      │  └──────────┘            └───────────┘       │
//!      └──────────────────────────────────────────────┘
//! ```
//!
//! # Valid Transitions
//!
//! | From | Action | To |
//! |------|--------|----|
//! | Pending | `acknowledge` | InReview |
//! | Pending | `dispute` | Disputed |
//! | Pending | `escalate` | Escalated |
//! | InReview | `resolve` | Resolved |
//! | InReview | `reject` | Disputed |
//! | InReview | `escalate` | Escalated |
//! | InReview | `request_info` | InReview (note only) |
//! | Disputed | `review` | InReview |
//! | Disputed | `resolve` | Resolved |
//! | Disputed | `escalate` | Escalated |
//! | Escalated | `review` | InReview |
//! | Escalated | `resolve` | Resolved |
//! | Resolved | `reopen` | Pending |
//!
//! Every `escalate` increments the violation's escalation level. Every
//! successful transition appends to the append-only resolution-notes log
//! and bumps the revision. `resolve` stamps `resolved_by`/`resolved_at`;
//! those fields change again only through `reopen`.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use dutywatch_core::violation::{ResolutionStatus, Severity, Violation, ViolationKind};
//! use dutywatch_core::workflow::{apply, Action};
//!
//! let now = Utc::now();
//! let mut violation = Violation::new(
//!     ViolationKind::DrivingOver11,
//!     "drove 12.00 hours",
//!     Severity::Major,
//!     now,
//! );
//!
//! apply(&mut violation, Action::Acknowledge, "dispatcher-9", "looking into it", now).unwrap();
//! apply(&mut violation, Action::Resolve, "safety-lead", "coached driver", now).unwrap();
//! assert_eq!(violation.status, ResolutionStatus::Resolved);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::violation::{ResolutionNote, ResolutionStatus, Violation};

/// Workflow actions that can be applied to a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Action {
    /// Take a pending violation into review.
    Acknowledge,
    /// Contest the violation.
    Dispute,
    /// Raise the violation to a higher authority.
    Escalate,
    /// Move a disputed or escalated violation back into review.
    Review,
    /// Close the violation.
    Resolve,
    /// Reject a review outcome, sending the violation to disputed.
    Reject,
    /// Ask for more information; stays in review.
    RequestInfo,
    /// Reopen a resolved violation.
    Reopen,
}

impl Action {
    /// Returns the wire tag for this action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Acknowledge => "acknowledge",
            Self::Dispute => "dispute",
            Self::Escalate => "escalate",
            Self::Review => "review",
            Self::Resolve => "resolve",
            Self::Reject => "reject",
            Self::RequestInfo => "request_info",
            Self::Reopen => "reopen",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by workflow transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum WorkflowError {
    /// The action is not in the current state's allow-list.
    #[error("action '{action}' not allowed from status '{from}'")]
    InvalidTransition {
        /// The violation's status when the action was attempted.
        from: ResolutionStatus,
        /// The rejected action.
        action: Action,
    },
}

/// Returns the actions allowed from a given status.
#[must_use]
pub const fn allowed_actions(status: ResolutionStatus) -> &'static [Action] {
    match status {
        ResolutionStatus::Pending => {
            &[Action::Acknowledge, Action::Dispute, Action::Escalate]
        },
        ResolutionStatus::InReview => &[
            Action::Resolve,
            Action::Reject,
            Action::Escalate,
            Action::RequestInfo,
        ],
        ResolutionStatus::Disputed => &[Action::Review, Action::Resolve, Action::Escalate],
        ResolutionStatus::Escalated => &[Action::Review, Action::Resolve],
        ResolutionStatus::Resolved => &[Action::Reopen],
    }
}

/// Returns the target status for an action from a given status, if the
/// transition is allowed.
#[must_use]
const fn target(status: ResolutionStatus, action: Action) -> Option<ResolutionStatus> {
    match (status, action) {
        (ResolutionStatus::Pending, Action::Acknowledge)
        | (ResolutionStatus::Disputed | ResolutionStatus::Escalated, Action::Review)
        | (ResolutionStatus::InReview, Action::RequestInfo) => Some(ResolutionStatus::InReview),
        (ResolutionStatus::Pending, Action::Dispute)
        | (ResolutionStatus::InReview, Action::Reject) => Some(ResolutionStatus::Disputed),
        (
            ResolutionStatus::Pending | ResolutionStatus::InReview | ResolutionStatus::Disputed,
            Action::Escalate,
        ) => Some(ResolutionStatus::Escalated),
        (
            ResolutionStatus::InReview | ResolutionStatus::Disputed | ResolutionStatus::Escalated,
            Action::Resolve,
        ) => Some(ResolutionStatus::Resolved),
        (ResolutionStatus::Resolved, Action::Reopen) => Some(ResolutionStatus::Pending),
        _ => None,
    }
}

/// Applies a workflow action to a violation.
///
/// On success the violation's status moves to the transition target, a
/// note is appended to the resolution log, and the revision is bumped.
/// `escalate` additionally increments the escalation level; `resolve`
/// stamps the resolver identity and time; `reopen` clears them.
///
/// # Errors
///
/// Returns [`WorkflowError::InvalidTransition`] when the action is not in
/// the current state's allow-list; the violation is untouched.
pub fn apply(
    violation: &mut Violation,
    action: Action,
    actor: &str,
    notes: &str,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    let from = violation.status;
    let to = target(from, action).ok_or(WorkflowError::InvalidTransition { from, action })?;

    violation.resolution_notes.push(ResolutionNote {
        at: now,
        actor: actor.to_string(),
        action: action.as_str().to_string(),
        text: notes.to_string(),
    });

    match action {
        Action::Escalate => {
            violation.escalation_level += 1;
        },
        Action::Resolve => {
            violation.resolved_by = Some(actor.to_string());
            violation.resolved_at = Some(now);
        },
        Action::Reopen => {
            violation.resolved_by = None;
            violation.resolved_at = None;
        },
        Action::Acknowledge
        | Action::Dispute
        | Action::Review
        | Action::Reject
        | Action::RequestInfo => {},
    }

    violation.status = to;
    violation.revision += 1;

    info!(
        kind = %violation.kind,
        %action,
        from = %from,
        to = %to,
        actor,
        "violation workflow transition"
    );
    Ok(())
}
