//! Cells and the 7×10 matrix produced by the grid builder.

use std::fmt;

use serde::Serialize;

use crate::error::StructuralError;
use crate::schedule::{
    DayOfWeek, Schedule, ScheduleId, SemesterWeekId, DAYS_PER_WEEK, PERIODS_PER_DAY,
};

const PERIODS: usize = PERIODS_PER_DAY as usize;

/// One (day, period) position of the week grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridCell {
    /// No entry in this period.
    Empty,
    /// First period of an entry; renders as a merged cell spanning `row_span` periods.
    Start {
        /// The entry, with its display fields.
        schedule: Box<Schedule>,
        /// Number of periods the merged cell covers.
        row_span: u8,
    },
    /// Covered by the entry that starts above it. Skipped when rendering.
    Continuation { schedule_id: ScheduleId },
}

impl GridCell {
    /// Returns true if no entry covers this cell.
    pub fn is_empty(&self) -> bool {
        matches!(self, GridCell::Empty)
    }

    /// Returns false for continuation cells, which the renderer must skip.
    pub fn is_rendered(&self) -> bool {
        !matches!(self, GridCell::Continuation { .. })
    }

    /// Id of the entry covering this cell, whether it starts here or above.
    pub fn schedule_id(&self) -> Option<ScheduleId> {
        match self {
            GridCell::Empty => None,
            GridCell::Start { schedule, .. } => Some(schedule.id),
            GridCell::Continuation { schedule_id } => Some(*schedule_id),
        }
    }
}

/// The timetable of one semester week, indexed by day and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekGrid {
    semester_week_id: SemesterWeekId,
    days: [[GridCell; PERIODS]; DAYS_PER_WEEK],
}

impl WeekGrid {
    /// Creates an all-empty grid for the given week.
    pub fn new(semester_week_id: SemesterWeekId) -> Self {
        Self {
            semester_week_id,
            days: std::array::from_fn(|_| std::array::from_fn(|_| GridCell::Empty)),
        }
    }

    /// The week this grid lays out.
    pub fn semester_week_id(&self) -> SemesterWeekId {
        self.semester_week_id
    }

    /// Returns the cell at `period` (1-based), or `None` if the period is out of range.
    pub fn cell(&self, day: DayOfWeek, period: u8) -> Option<&GridCell> {
        let index = usize::from(period).checked_sub(1)?;
        self.days[day.index()].get(index)
    }

    /// All periods of one day, first period first.
    pub fn day(&self, day: DayOfWeek) -> &[GridCell] {
        &self.days[day.index()]
    }

    /// Period-major rows as a table renderer walks them: for each period,
    /// the cells of Monday through Sunday.
    pub fn rows(&self) -> impl Iterator<Item = (u8, [&GridCell; DAYS_PER_WEEK])> + '_ {
        (0..PERIODS).map(move |p| {
            let row = std::array::from_fn(|d| &self.days[d][p]);
            (p as u8 + 1, row)
        })
    }

    /// Schedules placed in the grid, in day then period order.
    pub fn schedules(&self) -> impl Iterator<Item = &Schedule> {
        self.days.iter().flatten().filter_map(|cell| match cell {
            GridCell::Start { schedule, .. } => Some(schedule.as_ref()),
            _ => None,
        })
    }

    /// Returns true if no cell is occupied.
    pub fn is_empty(&self) -> bool {
        self.days.iter().flatten().all(GridCell::is_empty)
    }

    /// Places one entry. Fails without touching the grid if any target cell is taken.
    pub(crate) fn place(&mut self, schedule: &Schedule) -> Result<(), StructuralError> {
        if schedule.semester_week_id != self.semester_week_id {
            return Err(StructuralError::WrongWeek {
                schedule_id: schedule.id,
                expected: self.semester_week_id,
                found: schedule.semester_week_id,
            });
        }
        schedule
            .timeslot
            .validate()
            .map_err(|source| StructuralError::MalformedSlot {
                schedule_id: schedule.id,
                source,
            })?;

        let slot = schedule.timeslot;
        let column = &self.days[slot.day_of_week.index()];

        for period in slot.periods() {
            if let Some(occupant) = column[usize::from(period) - 1].schedule_id() {
                return Err(StructuralError::Overlap {
                    day: slot.day_of_week,
                    period,
                    occupant,
                    incoming: schedule.id,
                });
            }
        }

        self.fill(schedule);
        Ok(())
    }

    /// Places an entry only if it is well formed, of this week, and every
    /// target cell is free. Returns whether it was placed.
    pub(crate) fn place_if_free(&mut self, schedule: &Schedule) -> bool {
        if schedule.semester_week_id != self.semester_week_id
            || schedule.timeslot.validate().is_err()
        {
            return false;
        }

        let slot = schedule.timeslot;
        let column = &self.days[slot.day_of_week.index()];
        let free = slot
            .periods()
            .all(|period| column[usize::from(period) - 1].is_empty());
        if free {
            self.fill(schedule);
        }
        free
    }

    /// Writes the start and continuation cells of a validated entry.
    fn fill(&mut self, schedule: &Schedule) {
        let slot = schedule.timeslot;
        let column = &mut self.days[slot.day_of_week.index()];

        let first = usize::from(slot.start_period) - 1;
        column[first] = GridCell::Start {
            schedule: Box::new(schedule.clone()),
            row_span: slot.total_period,
        };
        for cell in &mut column[first + 1..usize::from(slot.end_period())] {
            *cell = GridCell::Continuation {
                schedule_id: schedule.id,
            };
        }
    }
}

const COLUMN_WIDTH: usize = 14;

impl fmt::Display for WeekGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Week {}", self.semester_week_id)?;
        write!(f, "{:>6}", "Period")?;
        for day in DayOfWeek::ALL {
            write!(f, " | {:<COLUMN_WIDTH$}", day.short_label())?;
        }
        writeln!(f)?;

        for (period, row) in self.rows() {
            write!(f, "{period:>6}")?;
            for cell in row {
                let text = match cell {
                    GridCell::Empty => String::new(),
                    GridCell::Start { schedule, row_span } => {
                        let name = if schedule.details.subject_name.is_empty() {
                            format!("#{}", schedule.id)
                        } else {
                            schedule.details.subject_name.clone()
                        };
                        format!("{name} x{row_span}")
                    }
                    GridCell::Continuation { .. } => "'".to_string(),
                };
                let text: String = text.chars().take(COLUMN_WIDTH).collect();
                write!(f, " | {text:<COLUMN_WIDTH$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
