//! Storage seam for schedule entries.

mod memory;

pub use memory::InMemoryScheduleRepository;

use crate::error::RepositoryError;
use crate::schedule::{DayOfWeek, Schedule, ScheduleId, ScheduleRequest, SemesterWeekId};

/// Source of existing schedules for the conflict check and grid.
///
/// Fetches must report failures as [`RepositoryError`]. Returning an empty
/// list for a failed read would let every candidate through the conflict
/// check.
pub trait ScheduleRepository: Send + Sync {
    /// Gets all entries of one week on one day, in id order.
    fn fetch_by_week_and_day(
        &self,
        semester_week_id: SemesterWeekId,
        day: DayOfWeek,
    ) -> Result<Vec<Schedule>, RepositoryError>;

    /// Gets all entries of one week, in id order.
    fn fetch_by_week(&self, semester_week_id: SemesterWeekId)
        -> Result<Vec<Schedule>, RepositoryError>;

    fn get(&self, id: ScheduleId) -> Result<Option<Schedule>, RepositoryError>;

    /// Stores an accepted request as a new PENDING entry and returns it with its id.
    fn insert(&self, request: ScheduleRequest) -> Result<Schedule, RepositoryError>;

    /// Replaces a stored entry. Fails with `NotFound` if the id is unknown.
    fn update(&self, schedule: Schedule) -> Result<Schedule, RepositoryError>;

    /// Removes an entry regardless of status, returning it if it existed.
    fn delete(&self, id: ScheduleId) -> Result<Option<Schedule>, RepositoryError>;
}
