#![forbid(unsafe_code)]
use chrono::{Duration, NaiveDate, NaiveTime};
use crewsched::interval::{expand_date_range, hours_from_range, overlap_hours, overlap_window};
use crewsched::{
    Assignment, AssignmentId, CrewScheduler, Job, JobId, LeaveCategory, LeaveStatus, MemoryStore,
    SchedError, ScheduleBook, TimeRange, UnavailabilityRecord, Worker, WorkerId,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn t(h: u32, min: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, min, 0).unwrap()
}

fn range(a: (u32, u32), b: (u32, u32)) -> TimeRange {
    TimeRange::new(t(a.0, a.1), t(b.0, b.1)).unwrap()
}

fn worker(handle: &str) -> Worker {
    Worker {
        id: WorkerId::new(format!("w-{handle}")),
        handle: handle.to_string(),
        display_name: handle.to_string(),
        role: None,
    }
}

fn job(id: &str, number: &str, description: &str) -> Job {
    let mut j = Job::new(number, description);
    j.id = JobId::new(id);
    j
}

fn assignment(w: &Worker, j: &JobId, date: NaiveDate, r: TimeRange) -> Assignment {
    Assignment {
        id: AssignmentId::random(),
        worker: w.id.clone(),
        job: j.clone(),
        date,
        range: r,
        role: None,
        lead_for_day: false,
    }
}

#[test]
fn expand_date_range_is_inclusive() {
    let dates = expand_date_range(d(2024, 1, 1), d(2024, 1, 3)).unwrap();
    assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)]);
}

#[test]
fn expand_date_range_single_day() {
    let dates = expand_date_range(d(2024, 1, 1), d(2024, 1, 1)).unwrap();
    assert_eq!(dates, vec![d(2024, 1, 1)]);
}

#[test]
fn expand_date_range_rejects_reversed_bounds() {
    let err = expand_date_range(d(2024, 1, 2), d(2024, 1, 1)).unwrap_err();
    assert!(matches!(err, SchedError::InvalidDateRange { .. }));
}

#[test]
fn overlap_of_disjoint_windows_is_zero() {
    assert_eq!(
        overlap_hours(&range((7, 0), (9, 0)), &range((10, 0), (12, 0))),
        Duration::zero()
    );
}

#[test]
fn touching_endpoints_do_not_overlap() {
    let a = range((7, 0), (13, 0));
    let b = range((13, 0), (17, 0));
    assert_eq!(overlap_hours(&a, &b), Duration::zero());
    assert!(overlap_window(&a, &b).is_none());
}

#[test]
fn partial_overlap_is_measured() {
    let a = range((8, 0), (16, 0));
    let b = range((12, 0), (18, 0));
    assert_eq!(overlap_hours(&a, &b), Duration::hours(4));
    assert_eq!(overlap_window(&a, &b).unwrap(), range((12, 0), (16, 0)));
}

#[test]
fn hours_from_range_rejects_cross_midnight() {
    assert_eq!(hours_from_range(t(8, 0), t(16, 0)).unwrap(), 8.0);
    assert!(matches!(
        hours_from_range(t(16, 0), t(8, 0)),
        Err(SchedError::InvalidRange)
    ));
    assert!(matches!(
        hours_from_range(t(8, 0), t(8, 0)),
        Err(SchedError::InvalidRange)
    ));
}

#[test]
fn time_range_requires_positive_duration() {
    assert!(TimeRange::new(t(9, 0), t(9, 0)).is_err());
    assert!(TimeRange::new(t(9, 0), t(8, 0)).is_err());
}

#[test]
fn detector_reports_soft_overlap_with_window_and_label() {
    let alice = worker("alice");
    let j1 = job("J1", "1001", "Panel upgrade");
    let j2 = job("J2", "1002", "Rewire basement");
    let date = d(2024, 3, 4);

    let mut book = ScheduleBook::default();
    book.assignments
        .push(assignment(&alice, &j1.id, date, range((8, 0), (16, 0))));
    book.workers.push(alice.clone());
    book.jobs.push(j1);
    let j2_id = j2.id.clone();
    book.jobs.push(j2);

    let engine = CrewScheduler::new(MemoryStore::new(book));
    let report = engine
        .check_conflicts(&[alice.id], &[date], &range((12, 0), (18, 0)), &j2_id)
        .unwrap();

    assert!(report.hard_blocks.is_empty());
    assert_eq!(report.soft_overlaps.len(), 1);
    let overlap = &report.soft_overlaps[0];
    assert_eq!(overlap.overlap, range((12, 0), (16, 0)));
    assert_eq!(overlap.overlap.hours(), 4.0);
    assert_eq!(overlap.proposed, range((12, 0), (18, 0)));
    assert_eq!(overlap.job_label, "#1001 Panel upgrade");
}

#[test]
fn detector_reports_all_day_leave_as_hard_block() {
    let bob = worker("bob");
    let j1 = job("J1", "1001", "Panel upgrade");
    let date = d(2024, 3, 4);

    let mut book = ScheduleBook::default();
    book.unavailability.push(UnavailabilityRecord::all_day(
        bob.id.clone(),
        date,
        LeaveCategory::Vacation,
    ));
    book.workers.push(bob.clone());

    let engine = CrewScheduler::new(MemoryStore::new(book));
    let report = engine
        .check_conflicts(&[bob.id], &[date], &range((8, 0), (16, 0)), &j1.id)
        .unwrap();

    assert_eq!(report.hard_blocks.len(), 1);
    assert!(report.hard_blocks[0].is_all_day());
    assert_eq!(report.hard_blocks[0].category, LeaveCategory::Vacation);
}

#[test]
fn detector_ignores_leave_outside_the_proposed_window() {
    let bob = worker("bob");
    let j1 = job("J1", "1001", "Panel upgrade");
    let date = d(2024, 3, 4);

    let mut book = ScheduleBook::default();
    book.unavailability.push(UnavailabilityRecord::timed(
        bob.id.clone(),
        date,
        range((6, 0), (8, 0)),
        LeaveCategory::Personal,
    ));
    book.workers.push(bob.clone());

    let engine = CrewScheduler::new(MemoryStore::new(book));
    let report = engine
        .check_conflicts(&[bob.id], &[date], &range((8, 0), (16, 0)), &j1.id)
        .unwrap();
    assert!(report.is_empty());
}

#[test]
fn detector_ignores_pending_leave() {
    let bob = worker("bob");
    let j1 = job("J1", "1001", "Panel upgrade");
    let date = d(2024, 3, 4);

    let mut book = ScheduleBook::default();
    book.unavailability.push(UnavailabilityRecord {
        worker: bob.id.clone(),
        date,
        window: None,
        category: LeaveCategory::Sick,
        status: LeaveStatus::Pending,
    });
    book.workers.push(bob.clone());

    let engine = CrewScheduler::new(MemoryStore::new(book));
    let report = engine
        .check_conflicts(&[bob.id], &[date], &range((8, 0), (16, 0)), &j1.id)
        .unwrap();
    assert!(report.is_empty());
}

#[test]
fn detector_never_conflicts_a_job_with_itself() {
    let alice = worker("alice");
    let j1 = job("J1", "1001", "Panel upgrade");
    let date = d(2024, 3, 4);

    let mut book = ScheduleBook::default();
    book.assignments
        .push(assignment(&alice, &j1.id, date, range((8, 0), (16, 0))));
    book.workers.push(alice.clone());

    let engine = CrewScheduler::new(MemoryStore::new(book));
    let report = engine
        .check_conflicts(&[alice.id], &[date], &range((8, 0), (16, 0)), &j1.id)
        .unwrap();
    assert!(report.is_empty());
}

#[test]
fn hard_block_and_soft_overlap_can_coexist() {
    let alice = worker("alice");
    let j1 = job("J1", "1001", "Panel upgrade");
    let j2 = job("J2", "1002", "Rewire basement");
    let date = d(2024, 3, 4);

    let mut book = ScheduleBook::default();
    book.assignments
        .push(assignment(&alice, &j1.id, date, range((8, 0), (16, 0))));
    book.unavailability.push(UnavailabilityRecord::all_day(
        alice.id.clone(),
        date,
        LeaveCategory::JuryDuty,
    ));
    book.workers.push(alice.clone());
    book.jobs.push(j1);

    let engine = CrewScheduler::new(MemoryStore::new(book));
    let report = engine
        .check_conflicts(&[alice.id], &[date], &range((12, 0), (18, 0)), &j2.id)
        .unwrap();

    assert!(report.has_hard_blocks());
    assert_eq!(report.soft_overlaps.len(), 1);
}
