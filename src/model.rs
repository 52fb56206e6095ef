use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Strong identifier for a worker
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strong identifier for a job (work order)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strong identifier for a persisted assignment row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(String);

impl AssignmentId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Crew member (directory data only, never used for correctness decisions)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub handle: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<CrewRole>,
}

impl Worker {
    pub fn new<H: Into<String>, D: Into<String>>(handle: H, display_name: D) -> Self {
        Self {
            id: WorkerId::random(),
            handle: handle.into(),
            display_name: display_name.into(),
            role: None,
        }
    }
}

/// Role of a worker within a crew
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrewRole {
    Technician,
    Apprentice,
    Custom(String),
}

/// Work order descriptive fields, used for human-readable conflict messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub number: String,
    pub description: String,
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub status: String,
}

impl Job {
    pub fn new<N: Into<String>, D: Into<String>>(number: N, description: D) -> Self {
        Self {
            id: JobId::random(),
            number: number.into(),
            description: description.into(),
            customer: String::new(),
            address: String::new(),
            status: String::new(),
        }
    }

    /// Short label for conflict messages, e.g. "#1042 Panel upgrade".
    pub fn label(&self) -> String {
        format!("#{} {}", self.number, self.description)
    }
}

/// Same-day time window, half-open `[start, end)`.
///
/// Cross-midnight windows are not supported: `end` must be strictly after
/// `start` on the same calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    /// Builds a range, validating that `end > start`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, String> {
        if end <= start {
            return Err("time range end must be after start".to_string());
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Duration in whole minutes.
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Duration in fractional hours.
    pub fn hours(&self) -> f64 {
        self.duration_minutes() as f64 / 60.0
    }

    /// True if `other` lies entirely within `self`.
    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// One job's planned work on one calendar date.
///
/// Created when the first worker is assigned to (job, date); carries the
/// default window and the per-day estimate shared by the whole crew.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDate {
    pub job: JobId,
    pub date: NaiveDate,
    pub range: TimeRange,
    pub est_hours: f64,
}

/// Atomic unit of crew scheduling: one worker, one job, one date, one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub worker: WorkerId,
    pub job: JobId,
    pub date: NaiveDate,
    pub range: TimeRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<CrewRole>,
    #[serde(default)]
    pub lead_for_day: bool,
}

/// Closed set of leave categories; adding one is a compile-time decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveCategory {
    Vacation,
    Sick,
    Personal,
    Bereavement,
    JuryDuty,
}

impl fmt::Display for LeaveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LeaveCategory::Vacation => "vacation",
            LeaveCategory::Sick => "sick",
            LeaveCategory::Personal => "personal",
            LeaveCategory::Bereavement => "bereavement",
            LeaveCategory::JuryDuty => "jury duty",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Denied,
}

/// Approved leave / call-out for a worker on a date.
///
/// Read-only from the engine's perspective; `window: None` means all-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnavailabilityRecord {
    pub worker: WorkerId,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeRange>,
    pub category: LeaveCategory,
    pub status: LeaveStatus,
}

impl UnavailabilityRecord {
    pub fn all_day(worker: WorkerId, date: NaiveDate, category: LeaveCategory) -> Self {
        Self {
            worker,
            date,
            window: None,
            category,
            status: LeaveStatus::Approved,
        }
    }

    pub fn timed(
        worker: WorkerId,
        date: NaiveDate,
        window: TimeRange,
        category: LeaveCategory,
    ) -> Self {
        Self {
            worker,
            date,
            window: Some(window),
            category,
            status: LeaveStatus::Approved,
        }
    }
}

/// Complete persisted schedule state
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScheduleBook {
    pub workers: Vec<Worker>,
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub schedule_dates: Vec<ScheduleDate>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub unavailability: Vec<UnavailabilityRecord>,
}

impl ScheduleBook {
    pub fn find_worker_by_handle<'a>(&'a self, handle: &str) -> Option<&'a Worker> {
        self.workers.iter().find(|w| w.handle == handle)
    }
    pub fn find_worker_by_id<'a>(&'a self, id: &WorkerId) -> Option<&'a Worker> {
        self.workers.iter().find(|w| &w.id == id)
    }
    pub fn find_job<'a>(&'a self, id: &JobId) -> Option<&'a Job> {
        self.jobs.iter().find(|j| &j.id == id)
    }
    pub fn find_assignment<'a>(&'a self, id: &AssignmentId) -> Option<&'a Assignment> {
        self.assignments.iter().find(|a| &a.id == id)
    }
    pub fn find_assignment_mut(&mut self, id: &AssignmentId) -> Option<&mut Assignment> {
        self.assignments.iter_mut().find(|a| &a.id == id)
    }
}
