use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;

use super::ScheduleRepository;
use crate::error::RepositoryError;
use crate::schedule::{DayOfWeek, Schedule, ScheduleId, ScheduleRequest, SemesterWeekId};

/// Thread-safe in-memory schedule store.
///
/// Uses DashMap for concurrent access without external locking. Ids are
/// handed out from a counter that starts after the largest seeded id.
pub struct InMemoryScheduleRepository {
    entries: DashMap<ScheduleId, Schedule>,
    next_id: AtomicI64,
}

impl InMemoryScheduleRepository {
    /// Creates an empty repository whose first id is 1.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Creates a repository holding the given entries.
    pub fn from_schedules(schedules: Vec<Schedule>) -> Result<Self, RepositoryError> {
        let repository = Self::new();
        let mut max_id = 0;

        for schedule in schedules {
            let id = schedule.id;
            if repository.entries.insert(id, schedule).is_some() {
                return Err(RepositoryError::Duplicate { id });
            }
            max_id = max_id.max(id);
        }

        let next_id = max_id.checked_add(1).ok_or_else(|| RepositoryError::Seed {
            message: format!("schedule id {max_id} leaves no room for new ids"),
        })?;
        repository.next_id.store(next_id, Ordering::Relaxed);
        Ok(repository)
    }

    /// Loads entries from a JSON array of schedules.
    pub fn load_seed(path: &Path) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path)?;
        let schedules: Vec<Schedule> = serde_json::from_str(&content)?;
        Self::from_schedules(schedules)
    }

    /// Returns the number of stored entries, cancelled ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn collect_sorted(&self, keep: impl Fn(&Schedule) -> bool) -> Vec<Schedule> {
        let mut schedules: Vec<Schedule> = self
            .entries
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        schedules.sort_by_key(|schedule| schedule.id);
        schedules
    }
}

impl Default for InMemoryScheduleRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleRepository for InMemoryScheduleRepository {
    fn fetch_by_week_and_day(
        &self,
        semester_week_id: SemesterWeekId,
        day: DayOfWeek,
    ) -> Result<Vec<Schedule>, RepositoryError> {
        Ok(self.collect_sorted(|schedule| {
            schedule.semester_week_id == semester_week_id && schedule.day_of_week() == day
        }))
    }

    fn fetch_by_week(
        &self,
        semester_week_id: SemesterWeekId,
    ) -> Result<Vec<Schedule>, RepositoryError> {
        Ok(self.collect_sorted(|schedule| schedule.semester_week_id == semester_week_id))
    }

    fn get(&self, id: ScheduleId) -> Result<Option<Schedule>, RepositoryError> {
        Ok(self.entries.get(&id).map(|entry| entry.value().clone()))
    }

    fn insert(&self, request: ScheduleRequest) -> Result<Schedule, RepositoryError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let schedule = Schedule::from_request(id, request);
        self.entries.insert(id, schedule.clone());
        Ok(schedule)
    }

    fn update(&self, schedule: Schedule) -> Result<Schedule, RepositoryError> {
        match self.entries.get_mut(&schedule.id) {
            Some(mut entry) => {
                *entry = schedule.clone();
                Ok(schedule)
            }
            None => Err(RepositoryError::NotFound { id: schedule.id }),
        }
    }

    fn delete(&self, id: ScheduleId) -> Result<Option<Schedule>, RepositoryError> {
        Ok(self.entries.remove(&id).map(|(_, schedule)| schedule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{ScheduleDetails, TimeSlot};
    use std::io::Write;

    fn request(week: SemesterWeekId, day: DayOfWeek) -> ScheduleRequest {
        ScheduleRequest {
            course_id: 1,
            course_section_id: 1,
            room_id: "2B11".to_string(),
            lecturer_id: "L1".to_string(),
            class_id: "C1".to_string(),
            semester_week_id: week,
            timeslot: TimeSlot::on(day, 1, 2).unwrap(),
            details: ScheduleDetails::default(),
        }
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let repo = InMemoryScheduleRepository::new();
        let a = repo.insert(request(36, DayOfWeek::Monday)).unwrap();
        let b = repo.insert(request(36, DayOfWeek::Monday)).unwrap();

        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn test_fetch_scopes_by_week_and_day() {
        let repo = InMemoryScheduleRepository::new();
        repo.insert(request(36, DayOfWeek::Monday)).unwrap();
        repo.insert(request(36, DayOfWeek::Tuesday)).unwrap();
        repo.insert(request(37, DayOfWeek::Monday)).unwrap();

        let monday = repo.fetch_by_week_and_day(36, DayOfWeek::Monday).unwrap();
        assert_eq!(monday.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1]);

        let week = repo.fetch_by_week(36).unwrap();
        assert_eq!(week.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_seeded_ids_continue_after_max() {
        let seeded = vec![
            Schedule::from_request(4, request(36, DayOfWeek::Monday)),
            Schedule::from_request(9, request(36, DayOfWeek::Friday)),
        ];
        let repo = InMemoryScheduleRepository::from_schedules(seeded).unwrap();

        assert_eq!(repo.insert(request(36, DayOfWeek::Sunday)).unwrap().id, 10);
    }

    #[test]
    fn test_seed_at_max_id_is_rejected() {
        let seeded = vec![Schedule::from_request(i64::MAX, request(36, DayOfWeek::Monday))];
        assert!(matches!(
            InMemoryScheduleRepository::from_schedules(seeded),
            Err(RepositoryError::Seed { .. })
        ));
    }

    #[test]
    fn test_duplicate_seed_ids_are_rejected() {
        let seeded = vec![
            Schedule::from_request(4, request(36, DayOfWeek::Monday)),
            Schedule::from_request(4, request(36, DayOfWeek::Friday)),
        ];
        assert!(matches!(
            InMemoryScheduleRepository::from_schedules(seeded),
            Err(RepositoryError::Duplicate { id: 4 })
        ));
    }

    #[test]
    fn test_update_and_delete() {
        let repo = InMemoryScheduleRepository::new();
        let mut schedule = repo.insert(request(36, DayOfWeek::Monday)).unwrap();
        schedule.room_id = "2B99".to_string();

        assert_eq!(repo.update(schedule.clone()).unwrap().room_id, "2B99");
        assert_eq!(repo.get(schedule.id).unwrap(), Some(schedule.clone()));
        assert_eq!(repo.delete(schedule.id).unwrap(), Some(schedule.clone()));
        assert_eq!(repo.delete(schedule.id).unwrap(), None);
        assert_eq!(
            repo.update(schedule),
            Err(RepositoryError::NotFound { id: 1 })
        );
    }

    #[test]
    fn test_load_seed_file() {
        let schedules = vec![Schedule::from_request(3, request(36, DayOfWeek::Monday))];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&schedules).unwrap().as_bytes())
            .unwrap();

        let repo = InMemoryScheduleRepository::load_seed(file.path()).unwrap();
        assert_eq!(repo.get(3).unwrap(), Some(schedules[0].clone()));
    }

    #[test]
    fn test_load_seed_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[{\"id\": 1}]").unwrap();

        assert!(matches!(
            InMemoryScheduleRepository::load_seed(file.path()),
            Err(RepositoryError::Seed { .. })
        ));
    }
}
