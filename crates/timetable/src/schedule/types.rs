//! Schedule records and the values they are built from.

use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::status::ScheduleStatus;
use super::timeslot::TimeSlot;
use crate::error::ValidationError;

/// Stable id of a stored schedule entry.
pub type ScheduleId = i64;
/// Id of one dated week of a semester.
pub type SemesterWeekId = i64;

/// Number of teaching periods in one day.
pub const PERIODS_PER_DAY: u8 = 10;

/// Number of days covered by a week grid.
pub const DAYS_PER_WEEK: usize = 7;

/// Day of the week in ISO numbering (1 = Monday, 7 = Sunday).
///
/// This is the only encoding used inside the crate. Forms and legacy grid
/// code use other numberings; convert with [`DayOfWeek::from_form_code`] and
/// [`DayOfWeek::from_sunday_zero`] at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DayOfWeek {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
    Sunday = 7,
}

impl DayOfWeek {
    /// Every day, Monday first.
    pub const ALL: [DayOfWeek; DAYS_PER_WEEK] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Parses an ISO day number (1 = Monday ... 7 = Sunday).
    pub fn from_iso(value: u8) -> Result<Self, ValidationError> {
        match value {
            1..=7 => Ok(Self::ALL[usize::from(value) - 1]),
            _ => Err(ValidationError::InvalidDay { value }),
        }
    }

    /// Parses the code used by creation forms (2 = Monday ... 8 = Sunday).
    pub fn from_form_code(code: u8) -> Result<Self, ValidationError> {
        match code {
            2..=8 => Ok(Self::ALL[usize::from(code) - 2]),
            _ => Err(ValidationError::InvalidDay { value: code }),
        }
    }

    /// Parses a Sunday-based index (0 = Sunday ... 6 = Saturday).
    pub fn from_sunday_zero(value: u8) -> Result<Self, ValidationError> {
        match value {
            0 => Ok(DayOfWeek::Sunday),
            1..=6 => Self::from_iso(value),
            _ => Err(ValidationError::InvalidDay { value }),
        }
    }

    /// ISO number of the day (1 = Monday ... 7 = Sunday).
    pub fn iso(self) -> u8 {
        self as u8
    }

    /// Code used by creation forms (2 = Monday ... 8 = Sunday).
    pub fn form_code(self) -> u8 {
        self as u8 + 1
    }

    /// Sunday-based index (0 = Sunday ... 6 = Saturday).
    pub fn sunday_zero(self) -> u8 {
        self as u8 % 7
    }

    /// Zero-based column of this day in a week grid.
    pub fn index(self) -> usize {
        self as usize - 1
    }

    /// Full English name of the day.
    pub fn label(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    /// Three-letter abbreviation, e.g. `Mon`.
    pub fn short_label(self) -> &'static str {
        &self.label()[..3]
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_iso(value)
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> Self {
        day.iso()
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl From<DayOfWeek> for Weekday {
    fn from(day: DayOfWeek) -> Self {
        match day {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Denormalized names shown to users. Never consulted by conflict logic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleDetails {
    pub subject_name: String,
    pub room_name: String,
    pub lecturer_name: String,
    pub class_name: String,
    /// Group number of the course the section belongs to
    pub course_group: Option<u32>,
    /// Section number within the group
    pub section_number: Option<u32>,
    /// Human-readable week, e.g. "Week 36 (02/09 - 08/09)"
    pub week_label: String,
}

/// A proposed meeting, as submitted for creation or as the new state of an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    /// Subject being taught
    pub course_id: i64,
    /// Group/section of the course meeting in this slot
    pub course_section_id: i64,
    /// Room the meeting takes place in
    pub room_id: String,
    /// Lecturer teaching the meeting
    pub lecturer_id: String,
    /// Class (cohort) attending the meeting
    pub class_id: String,
    /// Week the meeting belongs to
    pub semester_week_id: SemesterWeekId,
    /// Day and periods of the meeting
    pub timeslot: TimeSlot,
    /// Display names, not used for conflict checks
    #[serde(default)]
    pub details: ScheduleDetails,
}

/// The scheduled meeting of a course section in a room during one semester week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Unique, stable id assigned by the repository
    pub id: ScheduleId,
    /// Subject being taught
    pub course_id: i64,
    /// Group/section of the course meeting in this slot
    pub course_section_id: i64,
    /// Room the meeting takes place in
    pub room_id: String,
    /// Lecturer teaching the meeting
    pub lecturer_id: String,
    /// Class (cohort) attending the meeting
    pub class_id: String,
    /// Week this entry applies to; each week has its own entries
    pub semester_week_id: SemesterWeekId,
    /// Day and periods of the meeting
    pub timeslot: TimeSlot,
    /// Lifecycle state
    #[serde(default)]
    pub status: ScheduleStatus,
    /// Display names, not used for conflict checks
    #[serde(default)]
    pub details: ScheduleDetails,
}

impl Schedule {
    /// Creates a freshly scheduled (PENDING) entry from an accepted request.
    pub fn from_request(id: ScheduleId, request: ScheduleRequest) -> Self {
        Self {
            id,
            course_id: request.course_id,
            course_section_id: request.course_section_id,
            room_id: request.room_id,
            lecturer_id: request.lecturer_id,
            class_id: request.class_id,
            semester_week_id: request.semester_week_id,
            timeslot: request.timeslot,
            status: ScheduleStatus::Pending,
            details: request.details,
        }
    }

    /// Returns this entry in request form, e.g. to re-check it after an edit.
    pub fn to_request(&self) -> ScheduleRequest {
        ScheduleRequest {
            course_id: self.course_id,
            course_section_id: self.course_section_id,
            room_id: self.room_id.clone(),
            lecturer_id: self.lecturer_id.clone(),
            class_id: self.class_id.clone(),
            semester_week_id: self.semester_week_id,
            timeslot: self.timeslot,
            details: self.details.clone(),
        }
    }

    /// Replaces everything but the id and status with the edited request.
    pub fn with_request(&self, request: ScheduleRequest) -> Self {
        Self {
            status: self.status,
            ..Self::from_request(self.id, request)
        }
    }

    /// Returns true if the entry was cancelled and no longer holds its slot.
    pub fn is_cancelled(&self) -> bool {
        self.status == ScheduleStatus::Cancelled
    }

    /// Day the entry meets on.
    pub fn day_of_week(&self) -> DayOfWeek {
        self.timeslot.day_of_week
    }
}
