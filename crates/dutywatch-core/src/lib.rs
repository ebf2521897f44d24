//! Hours-of-Service compliance rule engine.
//!
//! `dutywatch-core` decides whether a commercial driver's current and
//! near-future duty activity complies with HOS regulations. Given a
//! chronological sequence of duty-status intervals and an evaluation
//! instant, the engine computes the active cycle window (including
//! 34-hour restarts and split sleeper-berth detection), runs every
//! enabled rule from a pluggable registry, and produces violations,
//! eligibility flags, compliance analytics, and restart guidance — all
//! bundled into one [`engine::HOSStatus`] aggregate.
//!
//! The engine is a pure library: no I/O, no database, no network, no
//! clock reads. Persistence, transport, notification, and export are
//! collaborator concerns; the engine consumes plain values and returns
//! plain values. Invoked twice on identical input it returns identical
//! output, so one evaluation per driver per tick can run concurrently
//! without coordination.
//!
//! # Modules
//!
//! - [`hours`] — fixed-point hour arithmetic (the foundation; no binary
//!   float anywhere in a compliance total)
//! - [`duty`] — duty statuses, intervals, and log validation
//! - [`limits`] — cycle types and their regulatory limits
//! - [`rules`] — the rule registry with snapshot semantics
//! - [`cycle`] — cycle-window computation and sleeper-berth analysis
//! - [`violation`] — violation records, kinds, and severities
//! - [`detector`] — per-rule violation checks
//! - [`eligibility`] — can-drive / can-be-on-duty / needs-rest decisions
//! - [`analytics`] — compliance scorecard aggregation
//! - [`workflow`] — the violation resolution state machine
//! - [`team`] — team-driving coordination
//! - [`advice`] — restart recommendations
//! - [`engine`] — the evaluation façade
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use dutywatch_core::duty::{DutyInterval, DutyStatus};
//! use dutywatch_core::limits::CycleType;
//! use dutywatch_core::ComplianceEngine;
//!
//! let engine = ComplianceEngine::new(CycleType::SeventyHourEightDay);
//!
//! let start = Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2025, 3, 1, 14, 0, 0).unwrap();
//! let now = Utc.with_ymd_and_hms(2025, 3, 1, 15, 0, 0).unwrap();
//! let log = vec![DutyInterval::closed(start, end, DutyStatus::Driving)];
//!
//! let status = engine.evaluate(&log, now, None).unwrap();
//! assert_eq!(status.hours_used_this_cycle.to_string(), "8.00");
//! assert!(status.can_drive);
//! ```

pub mod advice;
pub mod analytics;
pub mod cycle;
pub mod detector;
pub mod duty;
pub mod eligibility;
pub mod engine;
pub mod hours;
pub mod limits;
pub mod rules;
pub mod team;
pub mod violation;
pub mod workflow;

// Re-export the main entry points.
pub use engine::{ComplianceEngine, EngineError, HOSStatus};
pub use hours::Hours;
pub use limits::CycleType;
