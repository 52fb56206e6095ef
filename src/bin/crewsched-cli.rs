#![forbid(unsafe_code)]
use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use crewsched::{
    io,
    model::{Job, JobId, ScheduleBook, TimeRange, WorkerId},
    report::{describe_hard_block, describe_soft_overlap},
    scheduler::{CrewScheduler, ReconcileRequest, ReconcileStatus},
    storage::{JsonStorage, Storage},
    MemoryStore,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// Crew scheduling CLI for field-service jobs (file-backed, no database)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Enable logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// JSON schedule book file
    #[arg(long, global = true, default_value = "schedule.json")]
    book: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import workers from a CSV (`handle,display_name[,role]`)
    ImportWorkers {
        #[arg(long)]
        csv: String,
    },

    /// Import approved leave from a CSV (`handle,date,start,end,category`)
    ImportLeave {
        #[arg(long)]
        csv: String,
    },

    /// Register a job (work order)
    AddJob {
        /// Explicit job id (random when omitted)
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        number: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "")]
        customer: String,
        #[arg(long, default_value = "")]
        address: String,
    },

    /// Check conflicts for a candidate crew without mutating anything
    Check {
        /// Job id or number to exclude from comparison
        #[arg(long)]
        job: String,
        /// list "handle1,handle2,..."
        #[arg(long)]
        workers: String,
        /// First date, YYYY-MM-DD
        #[arg(long)]
        start_date: String,
        /// Last date (inclusive), YYYY-MM-DD
        #[arg(long)]
        end_date: String,
        /// Shift start, HH:MM
        #[arg(long)]
        start: String,
        /// Shift end, HH:MM
        #[arg(long)]
        end: String,
        /// Conflict report CSV (optional)
        #[arg(long)]
        report: Option<String>,
    },

    /// Reconcile a job's crew: the listed workers over the date range become
    /// the desired state; everyone else is removed from the job
    Reconcile {
        #[arg(long)]
        job: String,
        /// list "handle1,handle2,..."
        #[arg(long)]
        workers: String,
        #[arg(long)]
        start_date: String,
        #[arg(long)]
        end_date: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Confirm clipping of overlapping assignments on other jobs
        #[arg(long)]
        override_conflicts: bool,
    },

    /// Remove one worker from a job entirely (lead promotion included)
    RemoveWorker {
        #[arg(long)]
        job: String,
        #[arg(long)]
        worker: String,
    },

    /// List assignments, optionally for a single job
    List {
        #[arg(long)]
        job: Option<String>,
    },

    /// Export the book (JSON) and/or assignments (CSV)
    Export {
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.book)?;
    let book = storage.load().unwrap_or_default();

    let code = match cli.cmd {
        Commands::ImportWorkers { csv } => {
            let mut book = book;
            let workers = io::import_workers_csv(csv)?;
            println!("imported {} worker(s)", workers.len());
            book.workers.extend(workers);
            storage.save(&book)?;
            0
        }
        Commands::ImportLeave { csv } => {
            let mut book = book;
            let records = io::import_leave_csv(csv, &book)?;
            println!("imported {} leave record(s)", records.len());
            book.unavailability.extend(records);
            storage.save(&book)?;
            0
        }
        Commands::AddJob {
            id,
            number,
            description,
            customer,
            address,
        } => {
            let mut book = book;
            let mut job = Job::new(number, description);
            if let Some(id) = id {
                job.id = JobId::new(id);
            }
            job.customer = customer;
            job.address = address;
            println!("added job {} ({})", job.label(), job.id.as_str());
            book.jobs.push(job);
            storage.save(&book)?;
            0
        }
        Commands::Check {
            job,
            workers,
            start_date,
            end_date,
            start,
            end,
            report,
        } => {
            let job = resolve_job(&book, &job)?;
            let workers = resolve_workers(&book, &workers)?;
            let dates = parse_dates(&start_date, &end_date)?;
            let range = parse_range(&start, &end)?;

            let engine = CrewScheduler::new(MemoryStore::new(book));
            let found = engine.check_conflicts(&workers, &dates, &range, &job)?;
            if found.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!(
                    "Found {} hard block(s), {} overlap(s)",
                    found.hard_blocks.len(),
                    found.soft_overlaps.len()
                );
                for block in &found.hard_blocks {
                    println!("HARD  {}", describe_hard_block(block, engine.store()));
                }
                for overlap in &found.soft_overlaps {
                    println!("SOFT  {}", describe_soft_overlap(overlap, engine.store()));
                }
                if let Some(path) = report {
                    let mut w = csv::Writer::from_path(path)?;
                    w.write_record(["kind", "worker", "date", "detail"])?;
                    for block in &found.hard_blocks {
                        let date = block.date.to_string();
                        let detail = describe_hard_block(block, engine.store());
                        w.write_record([
                            "hard",
                            block.worker.as_str(),
                            date.as_str(),
                            detail.as_str(),
                        ])?;
                    }
                    for overlap in &found.soft_overlaps {
                        let date = overlap.date.to_string();
                        let detail = describe_soft_overlap(overlap, engine.store());
                        w.write_record([
                            "soft",
                            overlap.worker.as_str(),
                            date.as_str(),
                            detail.as_str(),
                        ])?;
                    }
                    w.flush()?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Reconcile {
            job,
            workers,
            start_date,
            end_date,
            start,
            end,
            override_conflicts,
        } => {
            let job = resolve_job(&book, &job)?;
            let workers = resolve_workers(&book, &workers)?;
            let dates = parse_dates(&start_date, &end_date)?;
            let range = parse_range(&start, &end)?;

            let mut req = ReconcileRequest::new(job, range);
            for worker in workers {
                req = req.with_worker(worker, dates.iter().copied());
            }
            if override_conflicts {
                req = req.with_override();
            }
            run_reconcile(&storage, book, &req)?
        }
        Commands::RemoveWorker { job, worker } => {
            let job = resolve_job(&book, &job)?;
            let worker = resolve_workers(&book, &worker)?
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("no worker given"))?;

            // Desired state = current crew minus the worker.
            let engine = CrewScheduler::new(MemoryStore::new(book));
            let current = {
                use crewsched::AssignmentStore;
                engine.store().current_dates(&job)?
            };
            let mut req = ReconcileRequest::new(job, default_range());
            for (w, dates) in current {
                if w != worker {
                    req = req.with_worker(w, dates);
                }
            }
            let book = engine.into_store().into_book();
            run_reconcile(&storage, book, &req)?
        }
        Commands::List { job } => {
            let filter = match job {
                Some(s) => Some(resolve_job(&book, &s)?),
                None => None,
            };
            for a in io::sorted_assignments(&book) {
                if filter.as_ref().map_or(false, |j| &a.job != j) {
                    continue;
                }
                let worker = book
                    .find_worker_by_id(&a.worker)
                    .map(|w| w.handle.as_str())
                    .unwrap_or_else(|| a.worker.as_str());
                let job = book
                    .find_job(&a.job)
                    .map(|j| j.label())
                    .unwrap_or_else(|| a.job.as_str().to_string());
                println!(
                    "{} | {} | {} | {}{}",
                    a.date,
                    a.range,
                    worker,
                    job,
                    if a.lead_for_day { " | lead" } else { "" }
                );
            }
            0
        }
        Commands::Export { out_json, out_csv } => {
            if let Some(path) = out_json {
                io::export_book_json(path, &book)?;
            }
            if let Some(path) = out_csv {
                io::export_assignments_csv(path, &book)?;
            }
            0
        }
    };

    std::process::exit(code);
}

fn run_reconcile(storage: &JsonStorage, book: ScheduleBook, req: &ReconcileRequest) -> Result<i32> {
    let engine = CrewScheduler::new(MemoryStore::new(book));
    let result = engine.reconcile_crew(req)?;

    let code = match result.status {
        ReconcileStatus::Blocked => {
            eprintln!("BLOCKED: {} hard block(s)", result.hard_blocks.len());
            for block in &result.hard_blocks {
                println!("HARD  {}", describe_hard_block(block, engine.store()));
            }
            2
        }
        ReconcileStatus::AwaitingOverride => {
            eprintln!(
                "AWAITING OVERRIDE: {} overlap(s); re-run with --override-conflicts",
                result.soft_overlaps.len()
            );
            for overlap in &result.soft_overlaps {
                println!("SOFT  {}", describe_soft_overlap(overlap, engine.store()));
            }
            2
        }
        ReconcileStatus::Applied | ReconcileStatus::PartiallyApplied => {
            println!(
                "{}: +{} assignment(s), -{} assignment(s)",
                if result.status == ReconcileStatus::Applied {
                    "APPLIED"
                } else {
                    "PARTIAL"
                },
                result.added.len(),
                result.removed.len()
            );
            if let Some(delta) = &result.delta {
                println!("delta: {delta}");
            }
            for promo in &result.lead_promotions {
                println!("lead: {} on {}", promo.worker.as_str(), promo.date);
            }
            for failed in &result.failed {
                eprintln!(
                    "failed {:?} {} {}: {}",
                    failed.op,
                    failed.worker.as_str(),
                    failed.date,
                    failed.reason
                );
            }
            let book = engine.into_store().into_book();
            storage.save(&book)?;
            if result.failed.is_empty() {
                0
            } else {
                2
            }
        }
    };
    Ok(code)
}

fn resolve_job(book: &ScheduleBook, reference: &str) -> Result<JobId> {
    book.jobs
        .iter()
        .find(|j| j.id.as_str() == reference || j.number == reference)
        .map(|j| j.id.clone())
        .ok_or_else(|| anyhow!("unknown job: {}", reference))
}

fn resolve_workers(book: &ScheduleBook, list: &str) -> Result<Vec<WorkerId>> {
    let mut out = Vec::new();
    for handle in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let worker = book
            .find_worker_by_handle(handle)
            .ok_or_else(|| anyhow!("unknown worker: {}", handle))?;
        out.push(worker.id.clone());
    }
    if out.is_empty() {
        bail!("no workers given");
    }
    Ok(out)
}

fn parse_dates(start: &str, end: &str) -> Result<Vec<NaiveDate>> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")?;
    let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")?;
    Ok(crewsched::interval::expand_date_range(start, end)?)
}

fn parse_range(start: &str, end: &str) -> Result<TimeRange> {
    TimeRange::new(io::parse_time(start)?, io::parse_time(end)?).map_err(anyhow::Error::msg)
}

fn default_range() -> TimeRange {
    // Window is irrelevant for a pure-removal request; nothing is added.
    TimeRange {
        start: chrono::NaiveTime::MIN,
        end: chrono::NaiveTime::MIN + chrono::Duration::seconds(86_399),
    }
}
