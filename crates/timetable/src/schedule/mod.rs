//! Schedule entries, their time slots and their lifecycle.

mod status;
mod timeslot;
mod types;

pub use status::ScheduleStatus;
pub use timeslot::TimeSlot;
pub use types::{
    DayOfWeek, Schedule, ScheduleDetails, ScheduleId, ScheduleRequest, SemesterWeekId,
    DAYS_PER_WEEK, PERIODS_PER_DAY,
};
