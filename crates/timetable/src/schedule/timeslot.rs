//! Day and period range of a schedule entry.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::types::{DayOfWeek, PERIODS_PER_DAY};
use crate::error::ValidationError;

/// A contiguous run of periods on one day.
///
/// `end_period = start_period + total_period - 1`, inclusive. The day is
/// always in domain once a `TimeSlot` exists (out-of-range day numbers are
/// rejected when the value is parsed); the period range must still be
/// checked with [`TimeSlot::validate`] for values built field by field or
/// deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub day_of_week: DayOfWeek,
    pub start_period: u8,
    pub total_period: u8,
}

impl TimeSlot {
    /// Builds a validated slot from a raw ISO day number.
    pub fn new(
        day_of_week: u8,
        start_period: u8,
        total_period: u8,
    ) -> Result<Self, ValidationError> {
        Self::on(DayOfWeek::from_iso(day_of_week)?, start_period, total_period)
    }

    /// Builds a validated slot on the given day.
    pub fn on(
        day_of_week: DayOfWeek,
        start_period: u8,
        total_period: u8,
    ) -> Result<Self, ValidationError> {
        let slot = Self {
            day_of_week,
            start_period,
            total_period,
        };
        slot.validate()?;
        Ok(slot)
    }

    /// Checks that the slot starts within the day, covers at least one
    /// period and ends no later than the last period.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=PERIODS_PER_DAY).contains(&self.start_period) {
            return Err(ValidationError::StartPeriodOutOfRange {
                start: self.start_period,
            });
        }
        if self.total_period < 1 {
            return Err(ValidationError::EmptySpan);
        }

        let end = u16::from(self.start_period) + u16::from(self.total_period) - 1;
        if end > u16::from(PERIODS_PER_DAY) {
            return Err(ValidationError::EndPeriodOutOfRange { end });
        }

        Ok(())
    }

    /// Last period covered by this slot (inclusive). Only meaningful for valid slots.
    pub fn end_period(&self) -> u8 {
        self.start_period
            .saturating_add(self.total_period)
            .saturating_sub(1)
    }

    /// Periods covered by this slot, first to last.
    pub fn periods(&self) -> RangeInclusive<u8> {
        self.start_period..=self.end_period()
    }

    /// True when both slots are on the same day and share at least one period.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.day_of_week == other.day_of_week
            && self.start_period.max(other.start_period)
                <= self.end_period().min(other.end_period())
    }

    /// True when the slots are on the same day and one starts right after the other ends.
    pub fn is_adjacent_to(&self, other: &TimeSlot) -> bool {
        self.day_of_week == other.day_of_week
            && (u16::from(self.end_period()) + 1 == u16::from(other.start_period)
                || u16::from(other.end_period()) + 1 == u16::from(self.start_period))
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total_period == 1 {
            write!(f, "{} period {}", self.day_of_week, self.start_period)
        } else {
            write!(
                f,
                "{} periods {}-{}",
                self.day_of_week,
                self.start_period,
                self.end_period()
            )
        }
    }
}
