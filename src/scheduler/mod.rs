mod conflicts;
mod locks;
mod reconcile;
mod resolve;
mod types;

pub use locks::{CancelToken, WorkerLocks};
pub use types::{
    ConflictReport, CrewChange, FailedOp, HardBlock, LeadPromotion, OpKind, ReconcileRequest,
    ReconcileStatus, ReconciliationResult, Resolution, SchedError, SoftOverlap,
};

use crate::model::{JobId, TimeRange, WorkerId};
use crate::report::CrewDirectory;
use crate::store::{AssignmentStore, AvailabilityStore};
use chrono::NaiveDate;

/// Crew scheduling engine over a pair of store accessors.
///
/// One instance can serve concurrent reconciliation requests for different
/// jobs; requests touching the same worker serialize on the engine's
/// per-worker scopes for the whole detect-resolve-write span.
#[derive(Debug)]
pub struct CrewScheduler<S> {
    store: S,
    locks: WorkerLocks,
}

impl<S> CrewScheduler<S>
where
    S: AvailabilityStore + AssignmentStore + CrewDirectory,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: WorkerLocks::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Read-only conflict query: classifies hard blocks and soft overlaps
    /// for the candidate workers and dates against `range`, excluding
    /// `exclude_job` from comparison. Never mutates state.
    pub fn check_conflicts(
        &self,
        workers: &[WorkerId],
        dates: &[NaiveDate],
        range: &TimeRange,
        exclude_job: &JobId,
    ) -> Result<ConflictReport, SchedError> {
        conflicts::detect_conflicts(&self.store, workers, dates, range, exclude_job)
    }

    /// Reconciles the desired crew state for one job against what is
    /// persisted. See [`ReconciliationResult`] for the outcome contract.
    pub fn reconcile_crew(
        &self,
        req: &ReconcileRequest,
    ) -> Result<ReconciliationResult, SchedError> {
        reconcile::reconcile_crew(self, req)
    }
}
