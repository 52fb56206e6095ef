use crate::model::{JobId, WorkerId};
use crate::scheduler::{ConflictReport, HardBlock, SoftOverlap};

/// Resolves identifiers to display strings for report formatting.
/// Lookup results never feed correctness decisions.
pub trait CrewDirectory {
    fn worker_name(&self, id: &WorkerId) -> String;
    fn job_label(&self, id: &JobId) -> String;
}

/// Formats a day-count delta for a single-worker edit, e.g. "+2 days, -1 day".
pub fn format_delta(added: usize, removed: usize) -> String {
    let mut parts = Vec::new();
    if added > 0 {
        parts.push(format!("+{} {}", added, days(added)));
    }
    if removed > 0 {
        parts.push(format!("-{} {}", removed, days(removed)));
    }
    if parts.is_empty() {
        "no changes".to_string()
    } else {
        parts.join(", ")
    }
}

fn days(n: usize) -> &'static str {
    if n == 1 {
        "day"
    } else {
        "days"
    }
}

pub fn describe_hard_block(block: &HardBlock, directory: &dyn CrewDirectory) -> String {
    let name = directory.worker_name(&block.worker);
    match &block.window {
        None => format!(
            "{name} has approved {} (all day) on {}",
            block.category, block.date
        ),
        Some(window) => format!(
            "{name} has approved {} ({window}) on {}",
            block.category, block.date
        ),
    }
}

pub fn describe_soft_overlap(overlap: &SoftOverlap, directory: &dyn CrewDirectory) -> String {
    let name = directory.worker_name(&overlap.worker);
    format!(
        "{name} already works {} {} on {}; proposed {} overlaps {} ({:.1}h)",
        overlap.job_label,
        overlap.existing,
        overlap.date,
        overlap.proposed,
        overlap.overlap,
        overlap.overlap.hours()
    )
}

/// One line per conflict, hard blocks first.
pub fn describe_report(report: &ConflictReport, directory: &dyn CrewDirectory) -> Vec<String> {
    let mut lines = Vec::new();
    for block in &report.hard_blocks {
        lines.push(describe_hard_block(block, directory));
    }
    for overlap in &report.soft_overlaps {
        lines.push(describe_soft_overlap(overlap, directory));
    }
    lines
}
