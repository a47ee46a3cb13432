//! Scheduling workflows on top of the pure core.
//!
//! [`ScheduleService`] is the caller the core expects: it validates input
//! before any repository access, fetches the existing entries of the
//! candidate's bucket, runs the conflict check and writes, all while holding
//! that bucket's lock.

mod locks;

pub use locks::{BucketGuards, BucketKey, BucketLocks};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::conflict::{Conflict, ConflictDetector};
use crate::error::{RepositoryError, Result, ScheduleError};
use crate::grid::{GridScope, WeekGrid, WeekGridBuilder};
use crate::repository::ScheduleRepository;
use crate::schedule::{Schedule, ScheduleId, ScheduleRequest, ScheduleStatus, SemesterWeekId};

/// Validates, checks and stores schedule entries against a repository.
pub struct ScheduleService<R> {
    repository: Arc<R>,
    locks: BucketLocks,
    grid_builder: WeekGridBuilder,
}

impl<R: ScheduleRepository> ScheduleService<R> {
    /// Creates a service over `repository` with a default grid builder.
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            locks: BucketLocks::new(),
            grid_builder: WeekGridBuilder::new(),
        }
    }

    /// Replaces the builder used by [`build_week_grid`](Self::build_week_grid).
    pub fn with_grid_builder(mut self, grid_builder: WeekGridBuilder) -> Self {
        self.grid_builder = grid_builder;
        self
    }

    /// The underlying repository.
    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Checks a candidate against the stored entries of its week and day.
    ///
    /// `exclude_id` names the entry being edited so an unchanged edit is not
    /// reported as colliding with itself. This takes no lock; use
    /// [`create`](Self::create) or [`update`](Self::update) to write.
    pub fn check_conflict(
        &self,
        candidate: &ScheduleRequest,
        exclude_id: Option<ScheduleId>,
    ) -> Result<Option<Conflict>> {
        candidate.timeslot.validate()?;

        let existing = self
            .repository
            .fetch_by_week_and_day(candidate.semester_week_id, candidate.timeslot.day_of_week)?;
        debug!(
            "Checking {} against {} entries of week {}",
            candidate.timeslot,
            existing.len(),
            candidate.semester_week_id
        );

        Ok(ConflictDetector::check(candidate, &existing, exclude_id)?)
    }

    /// Creates a PENDING entry if it collides with nothing.
    pub async fn create(&self, request: ScheduleRequest) -> Result<Schedule> {
        request.timeslot.validate()?;

        let bucket = BucketKey::of_request(&request);
        let _guards = self.locks.acquire(&[bucket]).await;

        if let Some(conflict) = self.check_conflict(&request, None)? {
            warn!("Rejected new schedule in {}: {}", bucket, conflict);
            return Err(conflict.into());
        }

        let schedule = self.repository.insert(request)?;
        info!(
            "Created schedule {} for week {} on {}",
            schedule.id, schedule.semester_week_id, schedule.timeslot
        );
        Ok(schedule)
    }

    /// Replaces the room, people or time of a PENDING entry.
    pub async fn update(&self, id: ScheduleId, request: ScheduleRequest) -> Result<Schedule> {
        request.timeslot.validate()?;

        let target = BucketKey::of_request(&request);
        let (current, _guards) = self.lock_existing(id, Some(target)).await?;

        if current.status != ScheduleStatus::Pending {
            return Err(ScheduleError::NotEditable {
                id,
                status: current.status,
            });
        }

        if let Some(conflict) = self.check_conflict(&request, Some(id))? {
            warn!("Rejected edit of schedule {}: {}", id, conflict);
            return Err(conflict.into());
        }

        let updated = self.repository.update(current.with_request(request))?;
        info!("Updated schedule {} to {}", id, updated.timeslot);
        Ok(updated)
    }

    /// Moves an entry to `target` if the lifecycle allows it.
    pub async fn transition(&self, id: ScheduleId, target: ScheduleStatus) -> Result<Schedule> {
        let (current, _guards) = self.lock_existing(id, None).await?;

        let next = current.transition(target)?;
        let saved = self.repository.update(next)?;
        info!("Schedule {} moved from {} to {}", id, current.status, saved.status);
        Ok(saved)
    }

    /// Cancels a PENDING or IN_PROGRESS entry, freeing its slot.
    pub async fn cancel(&self, id: ScheduleId) -> Result<Schedule> {
        self.transition(id, ScheduleStatus::Cancelled).await
    }

    /// Removes an entry whatever its status.
    pub async fn delete(&self, id: ScheduleId) -> Result<Schedule> {
        let (_, _guards) = self.lock_existing(id, None).await?;

        let removed = self
            .repository
            .delete(id)?
            .ok_or(RepositoryError::NotFound { id })?;
        info!("Deleted schedule {} ({})", id, removed.status);
        Ok(removed)
    }

    /// Lays out one week of the resource named by `scope`.
    ///
    /// Entries of different resources may share a period, so the grid is
    /// always built for a single class, room or lecturer.
    pub fn build_week_grid(
        &self,
        semester_week_id: SemesterWeekId,
        scope: &GridScope,
    ) -> Result<WeekGrid> {
        let schedules = self.repository.fetch_by_week(semester_week_id)?;
        debug!(
            "Building grid of {} for week {} from {} entries",
            scope,
            semester_week_id,
            schedules.len()
        );
        Ok(self
            .grid_builder
            .build_scoped(semester_week_id, scope, &schedules)?)
    }

    fn fetch_existing(&self, id: ScheduleId) -> Result<Schedule> {
        Ok(self
            .repository
            .get(id)?
            .ok_or(RepositoryError::NotFound { id })?)
    }

    /// Locks the bucket an entry currently lives in (plus `extra`) and
    /// returns the entry as read under that lock.
    ///
    /// Retries if a concurrent edit moved the entry to another bucket while
    /// we were waiting.
    async fn lock_existing(
        &self,
        id: ScheduleId,
        extra: Option<BucketKey>,
    ) -> Result<(Schedule, BucketGuards)> {
        loop {
            let home = BucketKey::of_schedule(&self.fetch_existing(id)?);
            let mut keys = vec![home];
            keys.extend(extra);

            let guards = self.locks.acquire(&keys).await;
            let locked = self.fetch_existing(id)?;
            if BucketKey::of_schedule(&locked) == home {
                return Ok((locked, guards));
            }
            debug!("Schedule {} left {} while waiting for its lock, retrying", id, home);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::ConflictKind;
    use crate::grid::GridCell;
    use crate::repository::InMemoryScheduleRepository;
    use crate::schedule::{DayOfWeek, ScheduleDetails, TimeSlot};
    use std::time::Duration;

    fn request(
        room: &str,
        lecturer: &str,
        day: DayOfWeek,
        start: u8,
        total: u8,
    ) -> ScheduleRequest {
        ScheduleRequest {
            course_id: 7,
            course_section_id: 1,
            room_id: room.to_string(),
            lecturer_id: lecturer.to_string(),
            class_id: format!("{room}-{lecturer}"),
            semester_week_id: 36,
            timeslot: TimeSlot::on(day, start, total).unwrap(),
            details: ScheduleDetails::default(),
        }
    }

    fn service() -> ScheduleService<InMemoryScheduleRepository> {
        ScheduleService::new(Arc::new(InMemoryScheduleRepository::new()))
    }

    /// Repository whose reads always fail.
    struct UnavailableRepository;

    impl ScheduleRepository for UnavailableRepository {
        fn fetch_by_week_and_day(
            &self,
            _: SemesterWeekId,
            _: DayOfWeek,
        ) -> std::result::Result<Vec<Schedule>, RepositoryError> {
            Err(RepositoryError::Unavailable {
                message: "connection refused".to_string(),
            })
        }

        fn fetch_by_week(
            &self,
            _: SemesterWeekId,
        ) -> std::result::Result<Vec<Schedule>, RepositoryError> {
            Err(RepositoryError::Unavailable {
                message: "connection refused".to_string(),
            })
        }

        fn get(&self, _: ScheduleId) -> std::result::Result<Option<Schedule>, RepositoryError> {
            Ok(None)
        }

        fn insert(&self, _: ScheduleRequest) -> std::result::Result<Schedule, RepositoryError> {
            panic!("insert reached after a failed fetch")
        }

        fn update(&self, schedule: Schedule) -> std::result::Result<Schedule, RepositoryError> {
            Err(RepositoryError::NotFound { id: schedule.id })
        }

        fn delete(&self, _: ScheduleId) -> std::result::Result<Option<Schedule>, RepositoryError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_create_then_conflict() {
        let service = service();
        let first = service
            .create(request("2B11", "L1", DayOfWeek::Monday, 1, 3))
            .await
            .unwrap();
        assert_eq!(first.status, ScheduleStatus::Pending);

        let err = service
            .create(request("2B11", "L2", DayOfWeek::Monday, 2, 3))
            .await
            .unwrap_err();
        let conflict = err.conflict().expect("room conflict");
        assert_eq!(conflict.existing.id, first.id);
        assert_eq!(conflict.kinds, vec![ConflictKind::Room]);
        assert!(err.is_user_correctable());
        assert_eq!(service.repository().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_slot_fails_before_repository() {
        let service = ScheduleService::new(Arc::new(UnavailableRepository));
        let mut candidate = request("2B11", "L1", DayOfWeek::Monday, 1, 3);
        candidate.timeslot.start_period = 0;

        assert!(matches!(
            service.create(candidate.clone()).await,
            Err(ScheduleError::Validation(_))
        ));
        assert!(matches!(
            service.check_conflict(&candidate, None),
            Err(ScheduleError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_an_empty_week() {
        let service = ScheduleService::new(Arc::new(UnavailableRepository));

        let err = service
            .create(request("2B11", "L1", DayOfWeek::Monday, 1, 3))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::Repository(RepositoryError::Unavailable { .. })
        ));
        assert!(matches!(
            service.build_week_grid(36, &GridScope::Room("2B11".to_string())),
            Err(ScheduleError::Repository(_))
        ));
    }

    #[tokio::test]
    async fn test_unchanged_edit_is_allowed() {
        let service = service();
        let created = service
            .create(request("2B11", "L1", DayOfWeek::Monday, 1, 3))
            .await
            .unwrap();

        let updated = service.update(created.id, created.to_request()).await.unwrap();
        assert_eq!(updated, created);
    }

    #[tokio::test]
    async fn test_edit_into_conflict_is_rejected() {
        let service = service();
        service
            .create(request("2B11", "L1", DayOfWeek::Tuesday, 1, 3))
            .await
            .unwrap();
        let other = service
            .create(request("2B99", "L1", DayOfWeek::Monday, 1, 3))
            .await
            .unwrap();

        let moved = request("2B99", "L1", DayOfWeek::Tuesday, 3, 2);
        let err = service.update(other.id, moved).await.unwrap_err();
        assert!(err.conflict().unwrap().involves(ConflictKind::Lecturer));

        let unchanged = service.repository().get(other.id).unwrap().unwrap();
        assert_eq!(unchanged.day_of_week(), DayOfWeek::Monday);
    }

    #[tokio::test]
    async fn test_only_pending_entries_are_editable() {
        let service = service();
        let created = service
            .create(request("2B11", "L1", DayOfWeek::Monday, 1, 3))
            .await
            .unwrap();
        service
            .transition(created.id, ScheduleStatus::InProgress)
            .await
            .unwrap();

        let err = service
            .update(created.id, request("2B11", "L1", DayOfWeek::Monday, 4, 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::NotEditable {
                status: ScheduleStatus::InProgress,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_cancel_frees_the_slot() {
        let service = service();
        let created = service
            .create(request("2B11", "L1", DayOfWeek::Monday, 1, 3))
            .await
            .unwrap();

        let cancelled = service.cancel(created.id).await.unwrap();
        assert_eq!(cancelled.status, ScheduleStatus::Cancelled);

        service
            .create(request("2B11", "L1", DayOfWeek::Monday, 1, 3))
            .await
            .unwrap();

        let err = service.cancel(created.id).await.unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_delete_ignores_status() {
        let service = service();
        let created = service
            .create(request("2B11", "L1", DayOfWeek::Monday, 1, 3))
            .await
            .unwrap();
        service
            .transition(created.id, ScheduleStatus::InProgress)
            .await
            .unwrap();
        service
            .transition(created.id, ScheduleStatus::Completed)
            .await
            .unwrap();

        let removed = service.delete(created.id).await.unwrap();
        assert_eq!(removed.status, ScheduleStatus::Completed);
        assert!(matches!(
            service.delete(created.id).await,
            Err(ScheduleError::Repository(RepositoryError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_week_grid() {
        let service = service();
        let created = service
            .create(request("2B11", "L1", DayOfWeek::Wednesday, 3, 3))
            .await
            .unwrap();

        let grid = service
            .build_week_grid(36, &GridScope::Room("2B11".to_string()))
            .unwrap();
        assert!(matches!(
            grid.cell(DayOfWeek::Wednesday, 3),
            Some(GridCell::Start { row_span: 3, .. })
        ));
        assert_eq!(
            grid.cell(DayOfWeek::Wednesday, 5).and_then(GridCell::schedule_id),
            Some(created.id)
        );
    }

    #[test]
    fn test_demo_seed_and_candidate() {
        let demos = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
        let repository = InMemoryScheduleRepository::load_seed(&demos.join("week36.json")).unwrap();
        let service = ScheduleService::new(Arc::new(repository));

        let content = std::fs::read_to_string(demos.join("candidate.json")).unwrap();
        let candidate: ScheduleRequest = serde_json::from_str(&content).unwrap();
        let conflict = service.check_conflict(&candidate, None).unwrap().unwrap();
        assert_eq!(conflict.existing.id, 1);
        assert_eq!(conflict.existing.details.subject_name, "Databases");

        let room = GridScope::Room("2B11".to_string());
        let grid = service.build_week_grid(36, &room).unwrap();
        assert_eq!(grid.schedules().map(|s| s.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_parallel_classes_each_get_a_grid() {
        let service = service();
        let a = service
            .create(request("2B11", "L1", DayOfWeek::Monday, 1, 3))
            .await
            .unwrap();
        let b = service
            .create(request("2B12", "L2", DayOfWeek::Monday, 1, 3))
            .await
            .unwrap();

        for (schedule, scope) in [
            (&a, GridScope::Class(a.class_id.clone())),
            (&b, GridScope::Room(b.room_id.clone())),
            (&b, GridScope::Lecturer(b.lecturer_id.clone())),
        ] {
            let grid = service.build_week_grid(36, &scope).unwrap();
            assert_eq!(
                grid.schedules().map(|s| s.id).collect::<Vec<_>>(),
                vec![schedule.id],
                "{scope}"
            );
        }
    }

    #[tokio::test]
    async fn test_rebooked_slot_with_cancelled_shown() {
        let service = ScheduleService::new(Arc::new(InMemoryScheduleRepository::new()))
            .with_grid_builder(WeekGridBuilder::new().include_cancelled(true));
        let first = service
            .create(request("2B11", "L1", DayOfWeek::Monday, 1, 3))
            .await
            .unwrap();
        service.cancel(first.id).await.unwrap();
        let rebooked = service
            .create(request("2B11", "L1", DayOfWeek::Monday, 1, 3))
            .await
            .unwrap();

        let grid = service
            .build_week_grid(36, &GridScope::Room("2B11".to_string()))
            .unwrap();
        assert_eq!(
            grid.cell(DayOfWeek::Monday, 1).and_then(GridCell::schedule_id),
            Some(rebooked.id)
        );
        assert_eq!(grid.schedules().count(), 1);
    }

    #[tokio::test]
    async fn test_transition_follows_entry_moved_by_edit() {
        let service = Arc::new(service());
        let created = service
            .create(request("2B11", "L1", DayOfWeek::Monday, 1, 3))
            .await
            .unwrap();
        let id = created.id;
        let monday = BucketKey::of_schedule(&created);
        let held = service.locks.acquire(&[monday]).await;

        let edit = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .update(id, request("2B11", "L1", DayOfWeek::Tuesday, 1, 3))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let start = {
            let service = service.clone();
            tokio::spawn(async move {
                service.transition(id, ScheduleStatus::InProgress).await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!edit.is_finished());
        assert!(!start.is_finished());

        drop(held);
        let edited = edit.await.unwrap().unwrap();
        assert_eq!(edited.day_of_week(), DayOfWeek::Tuesday);

        let started = start.await.unwrap().unwrap();
        assert_eq!(started.status, ScheduleStatus::InProgress);
        assert_eq!(started.day_of_week(), DayOfWeek::Tuesday);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_admit_one() {
        let service = Arc::new(service());

        let attempts: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .create(request("2B11", &format!("L{i}"), DayOfWeek::Monday, 1, 2))
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert!(err.conflict().is_some()),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(service.repository().len(), 1);
    }
}
