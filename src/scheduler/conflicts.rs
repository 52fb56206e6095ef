use super::types::{ConflictReport, HardBlock, SchedError, SoftOverlap};
use crate::interval::overlap_window;
use crate::model::{JobId, TimeRange, WorkerId};
use crate::report::CrewDirectory;
use crate::store::{AssignmentStore, AvailabilityStore};
use chrono::NaiveDate;

/// Classifies conflicts for every candidate (worker, date) pair.
///
/// Query-and-classify only: approved leave intersecting the proposed window
/// (or all-day) becomes a hard block; other jobs' assignments with positive
/// overlap become soft overlaps. Never mutates state. A pair can produce
/// both kinds at once; hard blocks take precedence in the reconciler.
pub(super) fn detect_conflicts<S>(
    store: &S,
    workers: &[WorkerId],
    dates: &[NaiveDate],
    proposed: &TimeRange,
    exclude_job: &JobId,
) -> Result<ConflictReport, SchedError>
where
    S: AvailabilityStore + AssignmentStore + CrewDirectory,
{
    let mut report = ConflictReport::default();

    for worker in workers {
        for record in store.find_unavailability(worker, dates)? {
            let blocked = match &record.window {
                None => true,
                Some(window) => overlap_window(window, proposed).is_some(),
            };
            if blocked {
                report.hard_blocks.push(HardBlock {
                    worker: worker.clone(),
                    date: record.date,
                    category: record.category,
                    window: record.window,
                });
            }
        }

        for assignment in store.find_assignments(worker, dates, Some(exclude_job))? {
            if let Some(window) = overlap_window(&assignment.range, proposed) {
                report.soft_overlaps.push(SoftOverlap {
                    assignment: assignment.id.clone(),
                    worker: worker.clone(),
                    date: assignment.date,
                    job_label: store.job_label(&assignment.job),
                    job: assignment.job,
                    existing: assignment.range,
                    overlap: window,
                    proposed: *proposed,
                });
            }
        }
    }

    Ok(report)
}
