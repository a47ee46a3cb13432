//! Error types for the timetable core and the scheduling service.

use thiserror::Error;

use crate::conflict::Conflict;
use crate::schedule::{DayOfWeek, ScheduleId, ScheduleStatus, SemesterWeekId, PERIODS_PER_DAY};

/// Result of a scheduling workflow.
pub type Result<T> = std::result::Result<T, ScheduleError>;

/// A malformed time slot. Callers must reject these before touching the repository.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Day number outside the ISO range 1 (Monday) to 7 (Sunday)
    #[error("day of week {value} is outside 1..=7")]
    InvalidDay { value: u8 },

    /// First period is 0 or past the last period of the day
    #[error("start period {start} is outside 1..={max}", max = PERIODS_PER_DAY)]
    StartPeriodOutOfRange { start: u8 },

    /// Slot covers zero periods
    #[error("a time slot must span at least one period")]
    EmptySpan,

    /// Slot runs past the last period of the day
    #[error("time slot ends at period {end}, after the last period {max}", max = PERIODS_PER_DAY)]
    EndPeriodOutOfRange { end: u16 },
}

/// The week grid found data that should have been rejected upstream.
///
/// Not user-correctable: it means an entry was stored without passing the
/// conflict check, or the caller handed the builder the wrong week.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// Two entries claim the same cell
    #[error("schedule {incoming} overlaps schedule {occupant} on {day} period {period}")]
    Overlap {
        day: DayOfWeek,
        period: u8,
        occupant: ScheduleId,
        incoming: ScheduleId,
    },

    /// A stored entry's slot fails validation
    #[error("schedule {schedule_id} has a malformed time slot: {source}")]
    MalformedSlot {
        schedule_id: ScheduleId,
        #[source]
        source: ValidationError,
    },

    /// Entry handed to the builder of another week
    #[error("schedule {schedule_id} belongs to week {found}, not week {expected}")]
    WrongWeek {
        schedule_id: ScheduleId,
        expected: SemesterWeekId,
        found: SemesterWeekId,
    },
}

/// A status change the lifecycle does not allow.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot move a schedule from {from} to {to}")]
pub struct InvalidTransitionError {
    /// Status the schedule currently has
    pub from: ScheduleStatus,
    /// Status that was requested
    pub to: ScheduleStatus,
}

/// Failure reading or writing stored schedules.
///
/// A failed fetch is never the same thing as an empty result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The store could not be reached or failed the read
    #[error("schedule store unavailable: {message}")]
    Unavailable { message: String },

    /// Seed data could not be read, parsed or accepted
    #[error("failed to load schedule seed: {message}")]
    Seed { message: String },

    /// No entry with this id
    #[error("schedule {id} not found")]
    NotFound { id: ScheduleId },

    /// Two entries with the same id
    #[error("schedule {id} already exists")]
    Duplicate { id: ScheduleId },
}

impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        RepositoryError::Seed {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Seed {
            message: err.to_string(),
        }
    }
}

/// Errors surfaced by the scheduling workflows.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Malformed time slot in the request
    #[error("invalid time slot: {0}")]
    Validation(#[from] ValidationError),

    /// The request collides with a stored entry
    #[error("{0}")]
    Conflict(Box<Conflict>),

    /// Stored data breaks the no-overlap invariant
    #[error("week grid is inconsistent: {0}")]
    Structural(#[from] StructuralError),

    /// Lifecycle does not allow the requested status
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError),

    /// Reading or writing stored entries failed
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Only PENDING entries can be edited
    #[error("schedule {id} is {status} and can no longer be edited")]
    NotEditable {
        id: ScheduleId,
        status: ScheduleStatus,
    },
}

impl ScheduleError {
    /// Returns true if the user can fix this by changing their input.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            ScheduleError::Validation(_)
                | ScheduleError::Conflict(_)
                | ScheduleError::InvalidTransition(_)
                | ScheduleError::NotEditable { .. }
        )
    }

    /// Returns the colliding entry if this is a conflict.
    pub fn conflict(&self) -> Option<&Conflict> {
        match self {
            ScheduleError::Conflict(conflict) => Some(&**conflict),
            _ => None,
        }
    }
}

impl From<Conflict> for ScheduleError {
    fn from(conflict: Conflict) -> Self {
        ScheduleError::Conflict(Box::new(conflict))
    }
}
