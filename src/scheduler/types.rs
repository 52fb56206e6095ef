use crate::model::{AssignmentId, CrewRole, JobId, LeaveCategory, TimeRange, WorkerId};
use crate::scheduler::locks::CancelToken;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid time range: end must be after start (same-day windows only)")]
    InvalidRange,
    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("clip would leave an empty window on assignment {0}")]
    EmptyRange(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("unknown job: {0}")]
    UnknownJob(String),
    #[error("unknown worker: {0}")]
    UnknownWorker(String),
    #[error("unknown assignment: {0}")]
    UnknownAssignment(String),
    #[error("request cancelled during conflict checking")]
    Cancelled,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Conflict against approved leave. Never overridable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HardBlock {
    pub worker: WorkerId,
    pub date: NaiveDate,
    pub category: LeaveCategory,
    /// `None` for an all-day record, otherwise the blocked window.
    pub window: Option<TimeRange>,
}

impl HardBlock {
    pub fn is_all_day(&self) -> bool {
        self.window.is_none()
    }
}

/// Conflict against another job's assignment. Overridable by explicit
/// confirmation; resolved by clipping the pre-existing window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoftOverlap {
    pub assignment: AssignmentId,
    pub worker: WorkerId,
    pub date: NaiveDate,
    pub job: JobId,
    pub job_label: String,
    pub existing: TimeRange,
    pub overlap: TimeRange,
    pub proposed: TimeRange,
}

/// Classified conflicts for one candidate crew change. Transient: lives for
/// the duration of a single check or reconciliation call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConflictReport {
    pub hard_blocks: Vec<HardBlock>,
    pub soft_overlaps: Vec<SoftOverlap>,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.hard_blocks.is_empty() && self.soft_overlaps.is_empty()
    }
    pub fn has_hard_blocks(&self) -> bool {
        !self.hard_blocks.is_empty()
    }
}

/// Outcome of resolving one soft overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Resolution {
    /// The pre-existing assignment was narrowed to its non-overlapping side.
    Clipped {
        assignment: AssignmentId,
        worker: WorkerId,
        date: NaiveDate,
        new_range: TimeRange,
    },
    /// The pre-existing assignment sat fully inside the proposed window and
    /// was removed outright.
    Removed {
        assignment: AssignmentId,
        worker: WorkerId,
        date: NaiveDate,
    },
    /// The pre-existing window strictly contains the proposed one on both
    /// sides; splitting into two rows is unsupported, so the row is left
    /// untouched and the conflict surfaced.
    Unresolved {
        assignment: AssignmentId,
        worker: WorkerId,
        date: NaiveDate,
        existing: TimeRange,
        proposed: TimeRange,
    },
}

/// Desired crew state for one job: per worker, the dates they should work.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub job: JobId,
    pub desired: BTreeMap<WorkerId, BTreeSet<NaiveDate>>,
    pub range: TimeRange,
    pub role: Option<CrewRole>,
    pub override_conflicts: bool,
    pub cancel: Option<CancelToken>,
}

impl ReconcileRequest {
    pub fn new(job: JobId, range: TimeRange) -> Self {
        Self {
            job,
            desired: BTreeMap::new(),
            range,
            role: None,
            override_conflicts: false,
            cancel: None,
        }
    }

    pub fn with_worker(
        mut self,
        worker: WorkerId,
        dates: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        self.desired.insert(worker, dates.into_iter().collect());
        self
    }

    pub fn with_override(mut self) -> Self {
        self.override_conflicts = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconcileStatus {
    /// Hard blocks present; nothing was written.
    Blocked,
    /// Soft overlaps present and no override confirmation; nothing was
    /// written. The caller re-submits with `override_conflicts = true`.
    AwaitingOverride,
    Applied,
    /// One or more sub-operations failed or were skipped during apply;
    /// completed mutations are kept (no rollback).
    PartiallyApplied,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrewChange {
    pub worker: WorkerId,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadPromotion {
    pub job: JobId,
    pub worker: WorkerId,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OpKind {
    Add,
    Remove,
}

/// A sub-operation that did not complete during apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedOp {
    pub worker: WorkerId,
    pub date: NaiveDate,
    pub op: OpKind,
    pub reason: String,
}

/// Structured summary of one reconciliation call.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationResult {
    pub status: ReconcileStatus,
    pub hard_blocks: Vec<HardBlock>,
    pub soft_overlaps: Vec<SoftOverlap>,
    pub resolutions: Vec<Resolution>,
    pub added: Vec<CrewChange>,
    pub removed: Vec<CrewChange>,
    pub lead_promotions: Vec<LeadPromotion>,
    pub failed: Vec<FailedOp>,
    /// Formatted day delta for single-worker edits, e.g. "+2 days, -1 day".
    pub delta: Option<String>,
}

impl ReconciliationResult {
    pub(super) fn with_status(status: ReconcileStatus) -> Self {
        Self {
            status,
            hard_blocks: Vec::new(),
            soft_overlaps: Vec::new(),
            resolutions: Vec::new(),
            added: Vec::new(),
            removed: Vec::new(),
            lead_promotions: Vec::new(),
            failed: Vec::new(),
            delta: None,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.status == ReconcileStatus::Applied
    }
}
