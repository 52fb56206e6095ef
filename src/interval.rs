//! Pure interval helpers: date-range expansion and time-window overlap.
//!
//! All time windows are half-open `[start, end)` on a single calendar date;
//! touching endpoints do not overlap.

use crate::model::TimeRange;
use crate::scheduler::SchedError;
use chrono::{Duration, NaiveDate, NaiveTime};

/// Expands `[start, end]` into an ordered list of calendar dates, both
/// endpoints included. `start == end` yields a single date.
pub fn expand_date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, SchedError> {
    if start > end {
        return Err(SchedError::InvalidDateRange { start, end });
    }
    let mut out = Vec::new();
    let mut current = start;
    while current <= end {
        out.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(out)
}

/// Positive overlap between two same-day windows, or zero when disjoint.
pub fn overlap_hours(a: &TimeRange, b: &TimeRange) -> Duration {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    if start < end {
        end - start
    } else {
        Duration::zero()
    }
}

/// The concrete overlapping window of two same-day windows, if any.
pub fn overlap_window(a: &TimeRange, b: &TimeRange) -> Option<TimeRange> {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    if start < end {
        Some(TimeRange { start, end })
    } else {
        None
    }
}

/// Fractional hours spanned by `[start, end)`.
///
/// Spanning past midnight is not supported: `end <= start` is rejected
/// rather than interpreted as a rollover into the next day.
pub fn hours_from_range(start: NaiveTime, end: NaiveTime) -> Result<f64, SchedError> {
    let range = TimeRange::new(start, end).map_err(|_| SchedError::InvalidRange)?;
    Ok(range.hours())
}
