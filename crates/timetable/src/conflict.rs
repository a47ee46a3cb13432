//! Resource-overlap detection for proposed schedule entries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::schedule::{Schedule, ScheduleId, ScheduleRequest};

/// A resource two overlapping entries both claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Same room
    Room,
    /// Same lecturer
    Lecturer,
    /// Same class (cohort)
    Class,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictKind::Room => "room",
            ConflictKind::Lecturer => "lecturer",
            ConflictKind::Class => "class",
        })
    }
}

/// An existing entry the candidate collides with, and what they share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// The stored entry, with display fields for the error message
    pub existing: Schedule,
    /// Shared resources, in room, lecturer, class order
    pub kinds: Vec<ConflictKind>,
}

impl Conflict {
    /// Returns true if the collision includes the given resource.
    pub fn involves(&self, kind: ConflictKind) -> bool {
        self.kinds.contains(&kind)
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let existing = &self.existing;
        write!(f, "conflicts with schedule {}", existing.id)?;
        if !existing.details.subject_name.is_empty() {
            write!(f, " ({})", existing.details.subject_name)?;
        }
        write!(f, " on {}, sharing", existing.timeslot)?;

        for (i, kind) in self.kinds.iter().enumerate() {
            let separator = if i == 0 { " " } else { ", " };
            match kind {
                ConflictKind::Room => write!(f, "{separator}room {}", existing.room_id)?,
                ConflictKind::Lecturer => {
                    write!(f, "{separator}lecturer {}", existing.lecturer_id)?
                }
                ConflictKind::Class => write!(f, "{separator}class {}", existing.class_id)?,
            }
        }
        Ok(())
    }
}

/// Decides whether a candidate entry collides with the entries already stored
/// for its semester week.
///
/// Pure over its inputs: the caller fetches `existing` and is responsible for
/// making check + write atomic per (week, day) bucket.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Returns the colliding entry with the smallest id, or `None` if the
    /// candidate is clear.
    ///
    /// Cancelled entries, entries of other weeks or days, and the entry named
    /// by `exclude_id` (the one being edited) are ignored.
    pub fn check(
        candidate: &ScheduleRequest,
        existing: &[Schedule],
        exclude_id: Option<ScheduleId>,
    ) -> Result<Option<Conflict>, ValidationError> {
        Ok(Self::conflicts(candidate, existing, exclude_id)?
            .into_iter()
            .next())
    }

    /// Returns every colliding entry, ordered by id.
    pub fn conflicts(
        candidate: &ScheduleRequest,
        existing: &[Schedule],
        exclude_id: Option<ScheduleId>,
    ) -> Result<Vec<Conflict>, ValidationError> {
        candidate.timeslot.validate()?;

        let mut conflicts: Vec<Conflict> = existing
            .iter()
            .filter(|entry| !entry.is_cancelled())
            .filter(|entry| Some(entry.id) != exclude_id)
            .filter(|entry| entry.semester_week_id == candidate.semester_week_id)
            .filter(|entry| entry.timeslot.day_of_week == candidate.timeslot.day_of_week)
            .filter(|entry| candidate.timeslot.overlaps(&entry.timeslot))
            .filter_map(|entry| {
                let kinds = shared_resources(candidate, entry);
                (!kinds.is_empty()).then(|| Conflict {
                    existing: entry.clone(),
                    kinds,
                })
            })
            .collect();

        conflicts.sort_by_key(|conflict| conflict.existing.id);
        Ok(conflicts)
    }
}

fn shared_resources(candidate: &ScheduleRequest, entry: &Schedule) -> Vec<ConflictKind> {
    let mut kinds = Vec::with_capacity(3);
    if entry.room_id == candidate.room_id {
        kinds.push(ConflictKind::Room);
    }
    if entry.lecturer_id == candidate.lecturer_id {
        kinds.push(ConflictKind::Lecturer);
    }
    if entry.class_id == candidate.class_id {
        kinds.push(ConflictKind::Class);
    }
    kinds
}
