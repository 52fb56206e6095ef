use crate::model::{
    Assignment, CrewRole, LeaveCategory, ScheduleBook, TimeRange, UnavailabilityRecord, Worker,
};
use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveTime};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;

/// Worker import from CSV: header `handle,display_name[,role]`
pub fn import_workers_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Worker>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let handle = rec.get(0).context("missing handle")?.trim();
        let display = rec.get(1).context("missing display_name")?.trim();
        if handle.is_empty() || display.is_empty() {
            bail!("invalid worker row (empty)");
        }
        let mut worker = Worker::new(handle.to_string(), display.to_string());
        if let Some(role) = rec.get(2) {
            let role = role.trim();
            if !role.is_empty() {
                worker.role = Some(parse_role(role));
            }
        }
        out.push(worker);
    }
    Ok(out)
}

fn parse_role(s: &str) -> CrewRole {
    match s.to_ascii_lowercase().as_str() {
        "technician" | "tech" => CrewRole::Technician,
        "apprentice" => CrewRole::Apprentice,
        _ => CrewRole::Custom(s.to_string()),
    }
}

/// Approved-leave import from CSV: header `handle,date,start,end,category`.
/// Empty `start`/`end` mean an all-day record; empty `category` defaults to
/// vacation. Worker handles must already exist in the book.
pub fn import_leave_csv<P: AsRef<Path>>(
    path: P,
    book: &ScheduleBook,
) -> anyhow::Result<Vec<UnavailabilityRecord>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let handle = rec.get(0).context("missing handle")?.trim();
        let worker = book
            .find_worker_by_handle(handle)
            .with_context(|| format!("unknown worker handle: {handle}"))?;
        let date = rec.get(1).context("missing date")?.trim();
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .with_context(|| format!("invalid date: {date}"))?;

        let start = rec.get(2).map(str::trim).unwrap_or_default();
        let end = rec.get(3).map(str::trim).unwrap_or_default();
        let window = match (start.is_empty(), end.is_empty()) {
            (true, true) => None,
            (false, false) => {
                let range = TimeRange::new(parse_time(start)?, parse_time(end)?)
                    .map_err(anyhow::Error::msg)?;
                Some(range)
            }
            _ => bail!("leave row for {handle} must give both start and end, or neither"),
        };

        let category = rec.get(4).map(str::trim).unwrap_or_default();
        let category = if category.is_empty() {
            LeaveCategory::Vacation
        } else {
            parse_category(category)
                .with_context(|| format!("invalid leave category for handle {handle}"))?
        };

        out.push(match window {
            None => UnavailabilityRecord::all_day(worker.id.clone(), date, category),
            Some(window) => UnavailabilityRecord::timed(worker.id.clone(), date, window, category),
        });
    }
    Ok(out)
}

fn parse_category(s: &str) -> anyhow::Result<LeaveCategory> {
    match s.to_ascii_lowercase().as_str() {
        "vacation" | "pto" => Ok(LeaveCategory::Vacation),
        "sick" => Ok(LeaveCategory::Sick),
        "personal" => Ok(LeaveCategory::Personal),
        "bereavement" => Ok(LeaveCategory::Bereavement),
        "jury" | "jury_duty" => Ok(LeaveCategory::JuryDuty),
        _ => bail!("expected one of vacation, sick, personal, bereavement, jury"),
    }
}

/// Parses a wall-clock time, `HH:MM` or `HH:MM:SS`.
pub fn parse_time(raw: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .with_context(|| format!("invalid time: {raw}"))
}

/// JSON export of the schedule book (pretty-printed)
pub fn export_book_json<P: AsRef<Path>>(path: P, book: &ScheduleBook) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(book)?;
    fs::write(path, s)?;
    Ok(())
}

/// Assignment export as CSV: header `id,worker,job,date,start,end,lead`
pub fn export_assignments_csv<P: AsRef<Path>>(path: P, book: &ScheduleBook) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["id", "worker", "job", "date", "start", "end", "lead"])?;
    for a in sorted_assignments(book) {
        let worker = book
            .find_worker_by_id(&a.worker)
            .map(|p| p.handle.as_str())
            .unwrap_or_else(|| a.worker.as_str());
        let job = book
            .find_job(&a.job)
            .map(|j| j.number.as_str())
            .unwrap_or_else(|| a.job.as_str());
        let date = a.date.to_string();
        let start = a.range.start.format("%H:%M").to_string();
        let end = a.range.end.format("%H:%M").to_string();
        w.write_record([
            a.id.as_str(),
            worker,
            job,
            date.as_str(),
            start.as_str(),
            end.as_str(),
            if a.lead_for_day { "yes" } else { "" },
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn assignment_sort_key(a: &Assignment) -> (NaiveDate, NaiveTime, String) {
    (a.date, a.range.start, a.worker.as_str().to_string())
}

/// Sorts assignments chronologically for listings and exports.
pub fn sorted_assignments(book: &ScheduleBook) -> Vec<&Assignment> {
    let mut out: Vec<&Assignment> = book.assignments.iter().collect();
    out.sort_by_key(|a| assignment_sort_key(a));
    out
}
