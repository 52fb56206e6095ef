use super::reconcile::remove_and_promote;
use super::types::{LeadPromotion, Resolution, SchedError, SoftOverlap};
use crate::store::AssignmentStore;
use tracing::warn;

/// Mutates the pre-existing side of each confirmed soft overlap so the
/// proposed window can be written without double-booking.
///
/// Overlaps are handled per assignment, grouped by worker. Three cases:
/// the existing window extends past the proposed one on a single side and
/// is clipped to that remainder; the existing window sits fully inside the
/// proposed one and is removed; the existing window strictly contains the
/// proposed one on both sides, which would require splitting one row into
/// two and is left unresolved for the caller.
pub(super) fn resolve<S: AssignmentStore>(
    store: &S,
    overlaps: &[SoftOverlap],
) -> Result<(Vec<Resolution>, Vec<LeadPromotion>), SchedError> {
    let mut ordered: Vec<&SoftOverlap> = overlaps.iter().collect();
    ordered.sort_by(|a, b| {
        (&a.worker, a.date, a.assignment.as_str()).cmp(&(&b.worker, b.date, b.assignment.as_str()))
    });

    let mut resolutions = Vec::new();
    let mut promotions = Vec::new();

    for overlap in ordered {
        let existing = overlap.existing;
        let proposed = overlap.proposed;

        if proposed.contains(&existing) {
            // A clip here would produce an empty window; drop the row.
            let (_, promotion) =
                remove_and_promote(store, &overlap.worker, &overlap.job, overlap.date)?;
            promotions.extend(promotion);
            resolutions.push(Resolution::Removed {
                assignment: overlap.assignment.clone(),
                worker: overlap.worker.clone(),
                date: overlap.date,
            });
        } else if existing.start < proposed.start && proposed.end < existing.end {
            // Splitting one assignment into two disjoint remainders is
            // unsupported; surface instead of silently dropping time.
            warn!(
                worker = overlap.worker.as_str(),
                date = %overlap.date,
                existing = %existing,
                proposed = %proposed,
                "unresolved conflict: existing shift encloses proposed window"
            );
            resolutions.push(Resolution::Unresolved {
                assignment: overlap.assignment.clone(),
                worker: overlap.worker.clone(),
                date: overlap.date,
                existing,
                proposed,
            });
        } else if existing.start < proposed.start {
            // Overlapped on the right; keep the early remainder.
            let clipped =
                store.clip_assignment(&overlap.assignment, existing.start, proposed.start)?;
            resolutions.push(Resolution::Clipped {
                assignment: overlap.assignment.clone(),
                worker: overlap.worker.clone(),
                date: overlap.date,
                new_range: clipped.range,
            });
        } else {
            // Overlapped on the left; keep the late remainder.
            let clipped = store.clip_assignment(&overlap.assignment, proposed.end, existing.end)?;
            resolutions.push(Resolution::Clipped {
                assignment: overlap.assignment.clone(),
                worker: overlap.worker.clone(),
                date: overlap.date,
                new_range: clipped.range,
            });
        }
    }

    Ok((resolutions, promotions))
}
