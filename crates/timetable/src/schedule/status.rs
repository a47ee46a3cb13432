//! Lifecycle of a schedule entry.
//!
//! ```text
//! PENDING ──► IN_PROGRESS ──► COMPLETED
//!    │             │
//!    └──► CANCELLED ◄┘
//! ```
//!
//! Cancellation is a manager action. The PENDING → IN_PROGRESS → COMPLETED
//! moves are made by an external clock-driven job; only their legality is
//! decided here.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::Schedule;
use crate::error::InvalidTransitionError;

/// Lifecycle state of a schedule entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    /// Scheduled and not yet started
    #[default]
    Pending,
    /// The meeting window has begun
    InProgress,
    /// The meeting window has passed
    Completed,
    /// Withdrawn by a manager; the slot is free again
    Cancelled,
}

impl ScheduleStatus {
    /// Returns true if no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, ScheduleStatus::Completed | ScheduleStatus::Cancelled)
    }

    /// Returns true if a schedule in this state may move to `target`.
    pub fn can_transition_to(self, target: ScheduleStatus) -> bool {
        use ScheduleStatus::*;

        matches!(
            (self, target),
            (Pending, InProgress)
                | (Pending, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }

    /// Returns `target` if the move is legal.
    pub fn transition(
        self,
        target: ScheduleStatus,
    ) -> Result<ScheduleStatus, InvalidTransitionError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(InvalidTransitionError {
                from: self,
                to: target,
            })
        }
    }

    /// Wire name, e.g. `IN_PROGRESS`.
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "PENDING",
            ScheduleStatus::InProgress => "IN_PROGRESS",
            ScheduleStatus::Completed => "COMPLETED",
            ScheduleStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Schedule {
    /// Returns a copy of this schedule moved to `target`, leaving `self` untouched.
    pub fn transition(&self, target: ScheduleStatus) -> Result<Schedule, InvalidTransitionError> {
        let status = self.status.transition(target)?;
        Ok(Schedule {
            status,
            ..self.clone()
        })
    }
}
