use super::conflicts::detect_conflicts;
use super::resolve::resolve;
use super::types::{
    ConflictReport, CrewChange, FailedOp, LeadPromotion, OpKind, ReconcileRequest,
    ReconcileStatus, ReconciliationResult, Resolution, SchedError,
};
use super::CrewScheduler;
use crate::model::{Assignment, JobId, WorkerId};
use crate::report::{format_delta, CrewDirectory};
use crate::store::{AssignmentStore, AvailabilityStore};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Diff-and-apply: converts the desired crew state for one job into
/// persisted assignments with minimal, conflict-safe mutation.
///
/// Flow: diff -> conflict checking -> (blocked | awaiting override |
/// resolve + apply). Hard blocks and pending overrides return before any
/// mutation. Store failures during apply abort the remaining
/// sub-operations and are reported as data; nothing is rolled back.
pub(super) fn reconcile_crew<S>(
    engine: &CrewScheduler<S>,
    req: &ReconcileRequest,
) -> Result<ReconciliationResult, SchedError>
where
    S: AvailabilityStore + AssignmentStore + CrewDirectory,
{
    let store = &engine.store;

    // First pass only discovers which workers the request touches; the
    // authoritative diff is recomputed once their scopes are held.
    let mut touched: BTreeSet<WorkerId> = store.current_dates(&req.job)?.into_keys().collect();
    touched.extend(req.desired.keys().cloned());
    let touched: Vec<WorkerId> = touched.into_iter().collect();

    let _scopes = engine.locks.hold_all(&touched);

    if is_cancelled(req) {
        return Err(SchedError::Cancelled);
    }

    let current = store.current_dates(&req.job)?;
    let (additions, removals) = diff(&req.desired, &current);

    debug!(
        job = req.job.as_str(),
        add = additions.values().map(BTreeSet::len).sum::<usize>(),
        remove = removals.values().map(BTreeSet::len).sum::<usize>(),
        "crew diff computed"
    );

    // Removals never need conflict checking.
    let mut report = ConflictReport::default();
    for (worker, dates) in &additions {
        let dates: Vec<NaiveDate> = dates.iter().copied().collect();
        let partial =
            detect_conflicts(store, std::slice::from_ref(worker), &dates, &req.range, &req.job)?;
        report.hard_blocks.extend(partial.hard_blocks);
        report.soft_overlaps.extend(partial.soft_overlaps);
    }

    if report.has_hard_blocks() {
        // All-or-nothing: the caller must change workers or dates.
        let mut result = ReconciliationResult::with_status(ReconcileStatus::Blocked);
        result.hard_blocks = report.hard_blocks;
        result.soft_overlaps = report.soft_overlaps;
        return Ok(result);
    }

    if !report.soft_overlaps.is_empty() && !req.override_conflicts {
        let mut result = ReconciliationResult::with_status(ReconcileStatus::AwaitingOverride);
        result.soft_overlaps = report.soft_overlaps;
        return Ok(result);
    }

    // Last checkpoint: once apply starts the request runs to completion.
    if is_cancelled(req) {
        return Err(SchedError::Cancelled);
    }

    let mut result = ReconciliationResult::with_status(ReconcileStatus::Applied);
    let mut unresolved: BTreeSet<(WorkerId, NaiveDate)> = BTreeSet::new();

    if !report.soft_overlaps.is_empty() {
        let (resolutions, promotions) = resolve(store, &report.soft_overlaps)?;
        for resolution in &resolutions {
            if let Resolution::Unresolved { worker, date, .. } = resolution {
                unresolved.insert((worker.clone(), *date));
            }
        }
        result.resolutions = resolutions;
        result.lead_promotions.extend(promotions);
        result.soft_overlaps = report.soft_overlaps;
    }

    let mut pending: Vec<(OpKind, WorkerId, NaiveDate)> = Vec::new();
    for (worker, dates) in &additions {
        for date in dates {
            pending.push((OpKind::Add, worker.clone(), *date));
        }
    }
    for (worker, dates) in &removals {
        for date in dates {
            pending.push((OpKind::Remove, worker.clone(), *date));
        }
    }

    let mut aborted = false;
    for (index, (op, worker, date)) in pending.iter().enumerate() {
        if aborted {
            result.failed.push(FailedOp {
                worker: worker.clone(),
                date: *date,
                op: *op,
                reason: "skipped after prior failure".to_string(),
            });
            continue;
        }
        let outcome = match op {
            OpKind::Add => {
                if unresolved.contains(&(worker.clone(), *date)) {
                    result.failed.push(FailedOp {
                        worker: worker.clone(),
                        date: *date,
                        op: *op,
                        reason: "unresolved overlap: existing shift encloses proposed window"
                            .to_string(),
                    });
                    continue;
                }
                apply_add(engine, req, worker, *date).map(|()| {
                    result.added.push(CrewChange {
                        worker: worker.clone(),
                        date: *date,
                    });
                })
            }
            OpKind::Remove => {
                remove_and_promote(store, worker, &req.job, *date).map(|(removed, promotion)| {
                    if removed.is_some() {
                        result.removed.push(CrewChange {
                            worker: worker.clone(),
                            date: *date,
                        });
                    }
                    result.lead_promotions.extend(promotion);
                })
            }
        };
        if let Err(err) = outcome {
            debug!(
                op = ?op,
                worker = worker.as_str(),
                date = %date,
                remaining = pending.len() - index - 1,
                "apply sub-operation failed, aborting the rest"
            );
            result.failed.push(FailedOp {
                worker: worker.clone(),
                date: *date,
                op: *op,
                reason: err.to_string(),
            });
            aborted = true;
        }
    }

    if !result.failed.is_empty() {
        result.status = ReconcileStatus::PartiallyApplied;
    }

    if touched.len() == 1 {
        result.delta = Some(format_delta(result.added.len(), result.removed.len()));
    }

    Ok(result)
}

fn is_cancelled(req: &ReconcileRequest) -> bool {
    req.cancel.as_ref().map_or(false, |t| t.is_cancelled())
}

/// Per worker: dates to add are desired minus current, dates to remove are
/// current minus desired. A worker absent from one side contributes all of
/// its dates to the other.
fn diff(
    desired: &BTreeMap<WorkerId, BTreeSet<NaiveDate>>,
    current: &BTreeMap<WorkerId, BTreeSet<NaiveDate>>,
) -> (
    BTreeMap<WorkerId, BTreeSet<NaiveDate>>,
    BTreeMap<WorkerId, BTreeSet<NaiveDate>>,
) {
    let empty = BTreeSet::new();
    let mut additions: BTreeMap<WorkerId, BTreeSet<NaiveDate>> = BTreeMap::new();
    let mut removals: BTreeMap<WorkerId, BTreeSet<NaiveDate>> = BTreeMap::new();

    for (worker, want) in desired {
        let have = current.get(worker).unwrap_or(&empty);
        let add: BTreeSet<NaiveDate> = want.difference(have).copied().collect();
        if !add.is_empty() {
            additions.insert(worker.clone(), add);
        }
    }
    for (worker, have) in current {
        let want = desired.get(worker).unwrap_or(&empty);
        let remove: BTreeSet<NaiveDate> = have.difference(want).copied().collect();
        if !remove.is_empty() {
            removals.insert(worker.clone(), remove);
        }
    }

    (additions, removals)
}

fn apply_add<S>(
    engine: &CrewScheduler<S>,
    req: &ReconcileRequest,
    worker: &WorkerId,
    date: NaiveDate,
) -> Result<(), SchedError>
where
    S: AvailabilityStore + AssignmentStore + CrewDirectory,
{
    let store = &engine.store;
    store.ensure_schedule_date(&req.job, date, req.range, req.range.hours())?;
    store.upsert_assignment(worker, &req.job, date, req.range, req.role.clone())?;
    Ok(())
}

/// Removes (worker, job, date) and keeps the lead-for-day invariant: when
/// the removed row was lead and crew remains, the remaining assignment with
/// the earliest worker id is promoted; when no crew remains the (job, date)
/// schedule entry is dropped.
pub(super) fn remove_and_promote<S: AssignmentStore>(
    store: &S,
    worker: &WorkerId,
    job: &JobId,
    date: NaiveDate,
) -> Result<(Option<Assignment>, Option<LeadPromotion>), SchedError> {
    let Some(removed) = store.remove_assignment(worker, job, date)? else {
        return Ok((None, None));
    };

    let remaining = store.assignments_for(job, date)?;
    if remaining.is_empty() {
        store.remove_schedule_date(job, date)?;
        return Ok((Some(removed), None));
    }

    if !removed.lead_for_day || remaining.iter().any(|a| a.lead_for_day) {
        return Ok((Some(removed), None));
    }

    // assignments_for returns the crew ordered by worker id.
    let next = &remaining[0];
    store.set_lead(&next.id, true)?;
    Ok((
        Some(removed),
        Some(LeadPromotion {
            job: job.clone(),
            worker: next.worker.clone(),
            date,
        }),
    ))
}
