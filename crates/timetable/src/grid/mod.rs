//! Day × period layout of one semester week.
//!
//! A grid always shows the timetable of one resource (a class, a room or a
//! lecturer). Entries for different resources may legitimately share a
//! period, so a whole-week grid of every entry is not a well-formed layout.

mod types;

pub use types::{GridCell, WeekGrid};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StructuralError;
use crate::schedule::{Schedule, SemesterWeekId};

/// The resource whose week a grid shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "resource", content = "id", rename_all = "snake_case")]
pub enum GridScope {
    /// Timetable of one class/cohort.
    Class(String),
    /// Occupancy of one room.
    Room(String),
    /// Teaching load of one lecturer.
    Lecturer(String),
}

impl GridScope {
    /// Returns true if `schedule` uses the resource this scope names.
    pub fn matches(&self, schedule: &Schedule) -> bool {
        match self {
            GridScope::Class(id) => schedule.class_id == *id,
            GridScope::Room(id) => schedule.room_id == *id,
            GridScope::Lecturer(id) => schedule.lecturer_id == *id,
        }
    }
}

impl fmt::Display for GridScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridScope::Class(id) => write!(f, "class {id}"),
            GridScope::Room(id) => write!(f, "room {id}"),
            GridScope::Lecturer(id) => write!(f, "lecturer {id}"),
        }
    }
}

/// Arranges the entries of one resource's week into a [`WeekGrid`].
///
/// Live entries are placed first, in id order, and a taken cell is reported
/// as a [`StructuralError`] instead of being overwritten. With
/// [`include_cancelled`] set, cancelled entries are then placed into cells
/// that are still free; a cancelled entry that would cover a taken cell is
/// left out, since its slot may have been rebooked.
///
/// [`include_cancelled`]: WeekGridBuilder::include_cancelled
#[derive(Debug, Clone, Default)]
pub struct WeekGridBuilder {
    include_cancelled: bool,
}

impl WeekGridBuilder {
    /// Creates a builder that leaves cancelled entries out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also shows cancelled entries in cells no live entry occupies.
    pub fn include_cancelled(mut self, include: bool) -> Self {
        self.include_cancelled = include;
        self
    }

    /// Builds the grid for `semester_week_id` from the entries of one resource.
    ///
    /// Entries are placed in id order so the reported overlap is the same on every run.
    pub fn build(
        &self,
        semester_week_id: SemesterWeekId,
        schedules: &[Schedule],
    ) -> Result<WeekGrid, StructuralError> {
        let (mut cancelled, mut live): (Vec<&Schedule>, Vec<&Schedule>) =
            schedules.iter().partition(|schedule| schedule.is_cancelled());
        live.sort_by_key(|schedule| schedule.id);

        let mut grid = WeekGrid::new(semester_week_id);
        for schedule in live {
            grid.place(schedule)?;
        }

        if self.include_cancelled {
            cancelled.sort_by_key(|schedule| schedule.id);
            for schedule in cancelled {
                grid.place_if_free(schedule);
            }
        }
        Ok(grid)
    }

    /// Builds the grid of the resource named by `scope`, ignoring entries of other resources.
    pub fn build_scoped(
        &self,
        semester_week_id: SemesterWeekId,
        scope: &GridScope,
        schedules: &[Schedule],
    ) -> Result<WeekGrid, StructuralError> {
        let scoped: Vec<Schedule> = schedules
            .iter()
            .filter(|schedule| scope.matches(schedule))
            .cloned()
            .collect();
        self.build(semester_week_id, &scoped)
    }
}
