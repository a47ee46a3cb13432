//! Per-bucket locks that make check + write atomic.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::schedule::{DayOfWeek, Schedule, ScheduleRequest, SemesterWeekId};

/// Entries can only collide within the same week and day, so that pair is
/// the unit of mutual exclusion.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct BucketKey {
    /// Week of the entries in this bucket
    pub semester_week_id: SemesterWeekId,
    /// Day of the entries in this bucket
    pub day: DayOfWeek,
}

impl BucketKey {
    /// Bucket a proposed entry would land in.
    pub fn of_request(request: &ScheduleRequest) -> Self {
        Self {
            semester_week_id: request.semester_week_id,
            day: request.timeslot.day_of_week,
        }
    }

    /// Bucket a stored entry currently lives in.
    pub fn of_schedule(schedule: &Schedule) -> Self {
        Self {
            semester_week_id: schedule.semester_week_id,
            day: schedule.day_of_week(),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "week {} {}", self.semester_week_id, self.day)
    }
}

/// Guards for all buckets of one operation; released on drop.
pub struct BucketGuards {
    _guards: Vec<OwnedMutexGuard<()>>,
}

/// Lazily created async mutex per bucket.
#[derive(Default)]
pub struct BucketLocks {
    locks: DashMap<BucketKey, Arc<Mutex<()>>>,
}

impl BucketLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets or creates the lock for the given bucket.
    pub fn get(&self, key: BucketKey) -> Arc<Mutex<()>> {
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Locks every distinct bucket in `keys`, always in ascending key order so
    /// two operations spanning the same pair of buckets cannot deadlock.
    pub async fn acquire(&self, keys: &[BucketKey]) -> BucketGuards {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            let lock = self.get(key);
            guards.push(lock.lock_owned().await);
        }
        BucketGuards { _guards: guards }
    }

    /// Number of buckets that have been locked at least once.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns true if no bucket has been locked yet.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
