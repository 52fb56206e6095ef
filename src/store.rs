//! Store accessors backing the scheduling engine.
//!
//! `AvailabilityStore` is read-only over approved leave; `AssignmentStore`
//! reads and writes persisted assignments. Methods take `&self` so one
//! store can serve concurrent reconciliations; the engine serializes
//! same-worker requests separately via its per-worker scopes.

use crate::model::{
    Assignment, AssignmentId, CrewRole, JobId, LeaveStatus, ScheduleBook, ScheduleDate, TimeRange,
    UnavailabilityRecord, WorkerId,
};
use crate::report::CrewDirectory;
use crate::scheduler::SchedError;
use chrono::{NaiveDate, NaiveTime};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Read-only view over approved leave / call-out records.
pub trait AvailabilityStore {
    /// All approved records for `worker` intersecting `dates`.
    fn find_unavailability(
        &self,
        worker: &WorkerId,
        dates: &[NaiveDate],
    ) -> Result<Vec<UnavailabilityRecord>, SchedError>;
}

/// Read/write access to persisted assignments and schedule dates.
pub trait AssignmentStore {
    /// Assignments for `worker` on `dates`, excluding `exclude_job` so a job
    /// is never in conflict with itself.
    fn find_assignments(
        &self,
        worker: &WorkerId,
        dates: &[NaiveDate],
        exclude_job: Option<&JobId>,
    ) -> Result<Vec<Assignment>, SchedError>;

    /// The crew currently assigned to (job, date).
    fn assignments_for(&self, job: &JobId, date: NaiveDate)
        -> Result<Vec<Assignment>, SchedError>;

    /// Per-worker date sets currently persisted for `job`.
    fn current_dates(
        &self,
        job: &JobId,
    ) -> Result<BTreeMap<WorkerId, BTreeSet<NaiveDate>>, SchedError>;

    /// Creates or updates the assignment keyed by (worker, job, date).
    /// The first assignment on an empty (job, date) becomes lead-for-day.
    fn upsert_assignment(
        &self,
        worker: &WorkerId,
        job: &JobId,
        date: NaiveDate,
        range: TimeRange,
        role: Option<CrewRole>,
    ) -> Result<Assignment, SchedError>;

    /// Deletes the assignment keyed by (worker, job, date) and returns it.
    /// Lead promotion is the caller's responsibility.
    fn remove_assignment(
        &self,
        worker: &WorkerId,
        job: &JobId,
        date: NaiveDate,
    ) -> Result<Option<Assignment>, SchedError>;

    /// Narrows an existing assignment's window. A window of zero or negative
    /// duration is `SchedError::EmptyRange`; the caller must remove the row
    /// instead of clipping it.
    fn clip_assignment(
        &self,
        id: &AssignmentId,
        new_start: NaiveTime,
        new_end: NaiveTime,
    ) -> Result<Assignment, SchedError>;

    fn set_lead(&self, id: &AssignmentId, lead: bool) -> Result<(), SchedError>;

    /// Creates the (job, date) schedule entry if absent.
    fn ensure_schedule_date(
        &self,
        job: &JobId,
        date: NaiveDate,
        range: TimeRange,
        est_hours: f64,
    ) -> Result<(), SchedError>;

    /// Drops the (job, date) schedule entry once its crew is empty.
    fn remove_schedule_date(&self, job: &JobId, date: NaiveDate) -> Result<(), SchedError>;
}

/// In-memory store over a [`ScheduleBook`], suitable for tests and for the
/// CLI's load-mutate-save flow around [`crate::storage::JsonStorage`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    book: RwLock<ScheduleBook>,
}

impl MemoryStore {
    pub fn new(book: ScheduleBook) -> Self {
        Self {
            book: RwLock::new(book),
        }
    }

    /// Clones the current book, e.g. for saving to disk.
    pub fn snapshot(&self) -> Result<ScheduleBook, SchedError> {
        Ok(self.read()?.clone())
    }

    pub fn into_book(self) -> ScheduleBook {
        self.book
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ScheduleBook>, SchedError> {
        self.book
            .read()
            .map_err(|_| SchedError::StoreUnavailable("schedule book lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ScheduleBook>, SchedError> {
        self.book
            .write()
            .map_err(|_| SchedError::StoreUnavailable("schedule book lock poisoned".into()))
    }
}

impl AvailabilityStore for MemoryStore {
    fn find_unavailability(
        &self,
        worker: &WorkerId,
        dates: &[NaiveDate],
    ) -> Result<Vec<UnavailabilityRecord>, SchedError> {
        let book = self.read()?;
        Ok(book
            .unavailability
            .iter()
            .filter(|r| {
                &r.worker == worker
                    && r.status == LeaveStatus::Approved
                    && dates.contains(&r.date)
            })
            .cloned()
            .collect())
    }
}

impl AssignmentStore for MemoryStore {
    fn find_assignments(
        &self,
        worker: &WorkerId,
        dates: &[NaiveDate],
        exclude_job: Option<&JobId>,
    ) -> Result<Vec<Assignment>, SchedError> {
        let book = self.read()?;
        let mut out: Vec<Assignment> = book
            .assignments
            .iter()
            .filter(|a| {
                &a.worker == worker
                    && dates.contains(&a.date)
                    && exclude_job.map_or(true, |j| &a.job != j)
            })
            .cloned()
            .collect();
        out.sort_by_key(|a| (a.date, a.range.start));
        Ok(out)
    }

    fn assignments_for(
        &self,
        job: &JobId,
        date: NaiveDate,
    ) -> Result<Vec<Assignment>, SchedError> {
        let book = self.read()?;
        let mut out: Vec<Assignment> = book
            .assignments
            .iter()
            .filter(|a| &a.job == job && a.date == date)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.worker.cmp(&b.worker));
        Ok(out)
    }

    fn current_dates(
        &self,
        job: &JobId,
    ) -> Result<BTreeMap<WorkerId, BTreeSet<NaiveDate>>, SchedError> {
        let book = self.read()?;
        let mut out: BTreeMap<WorkerId, BTreeSet<NaiveDate>> = BTreeMap::new();
        for a in book.assignments.iter().filter(|a| &a.job == job) {
            out.entry(a.worker.clone()).or_default().insert(a.date);
        }
        Ok(out)
    }

    fn upsert_assignment(
        &self,
        worker: &WorkerId,
        job: &JobId,
        date: NaiveDate,
        range: TimeRange,
        role: Option<CrewRole>,
    ) -> Result<Assignment, SchedError> {
        let mut book = self.write()?;
        if let Some(existing) = book
            .assignments
            .iter_mut()
            .find(|a| &a.worker == worker && &a.job == job && a.date == date)
        {
            existing.range = range;
            if role.is_some() {
                existing.role = role;
            }
            return Ok(existing.clone());
        }
        let first_on_day = !book
            .assignments
            .iter()
            .any(|a| &a.job == job && a.date == date);
        let assignment = Assignment {
            id: AssignmentId::random(),
            worker: worker.clone(),
            job: job.clone(),
            date,
            range,
            role,
            lead_for_day: first_on_day,
        };
        book.assignments.push(assignment.clone());
        Ok(assignment)
    }

    fn remove_assignment(
        &self,
        worker: &WorkerId,
        job: &JobId,
        date: NaiveDate,
    ) -> Result<Option<Assignment>, SchedError> {
        let mut book = self.write()?;
        let pos = book
            .assignments
            .iter()
            .position(|a| &a.worker == worker && &a.job == job && a.date == date);
        Ok(pos.map(|i| book.assignments.remove(i)))
    }

    fn clip_assignment(
        &self,
        id: &AssignmentId,
        new_start: NaiveTime,
        new_end: NaiveTime,
    ) -> Result<Assignment, SchedError> {
        let range = TimeRange::new(new_start, new_end)
            .map_err(|_| SchedError::EmptyRange(id.as_str().to_string()))?;
        let mut book = self.write()?;
        let assignment = book
            .find_assignment_mut(id)
            .ok_or_else(|| SchedError::UnknownAssignment(id.as_str().to_string()))?;
        assignment.range = range;
        Ok(assignment.clone())
    }

    fn set_lead(&self, id: &AssignmentId, lead: bool) -> Result<(), SchedError> {
        let mut book = self.write()?;
        let assignment = book
            .find_assignment_mut(id)
            .ok_or_else(|| SchedError::UnknownAssignment(id.as_str().to_string()))?;
        assignment.lead_for_day = lead;
        Ok(())
    }

    fn ensure_schedule_date(
        &self,
        job: &JobId,
        date: NaiveDate,
        range: TimeRange,
        est_hours: f64,
    ) -> Result<(), SchedError> {
        let mut book = self.write()?;
        if book
            .schedule_dates
            .iter()
            .any(|d| &d.job == job && d.date == date)
        {
            return Ok(());
        }
        book.schedule_dates.push(ScheduleDate {
            job: job.clone(),
            date,
            range,
            est_hours,
        });
        Ok(())
    }

    fn remove_schedule_date(&self, job: &JobId, date: NaiveDate) -> Result<(), SchedError> {
        let mut book = self.write()?;
        book.schedule_dates
            .retain(|d| !(&d.job == job && d.date == date));
        Ok(())
    }
}

impl CrewDirectory for MemoryStore {
    fn worker_name(&self, id: &WorkerId) -> String {
        self.read()
            .ok()
            .and_then(|book| book.find_worker_by_id(id).map(|w| w.display_name.clone()))
            .unwrap_or_else(|| id.as_str().to_string())
    }

    fn job_label(&self, id: &JobId) -> String {
        self.read()
            .ok()
            .and_then(|book| book.find_job(id).map(|j| j.label()))
            .unwrap_or_else(|| id.as_str().to_string())
    }
}
