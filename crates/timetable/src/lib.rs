//! Timetable conflict detection and weekly grid layout.
//!
//! The core ([`schedule`], [`conflict`], [`grid`]) is synchronous and pure:
//! it never reads storage or logs. [`service::ScheduleService`] is the
//! caller that fetches from a [`repository::ScheduleRepository`], serializes
//! check + write per (week, day) bucket, and logs.

pub mod config;
pub mod conflict;
pub mod error;
pub mod grid;
pub mod repository;
pub mod schedule;
pub mod service;

pub use conflict::{Conflict, ConflictDetector, ConflictKind};
pub use error::{
    InvalidTransitionError, RepositoryError, ScheduleError, StructuralError, ValidationError,
};
pub use grid::{GridCell, WeekGrid, WeekGridBuilder};
pub use repository::{InMemoryScheduleRepository, ScheduleRepository};
pub use schedule::{DayOfWeek, Schedule, ScheduleRequest, ScheduleStatus, TimeSlot};
pub use service::ScheduleService;
