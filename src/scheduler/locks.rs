//! Per-worker exclusion scopes and request cancellation.
//!
//! Conflict detection and apply are not atomic with respect to each other,
//! so every reconciliation holds its workers' scopes for the whole
//! detect-resolve-write span. Scopes are striped: each worker hashes onto
//! one of a fixed set of mutexes, and stripes are always acquired in index
//! order so two requests can never deadlock against each other.

use crate::model::WorkerId;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const DEFAULT_STRIPES: usize = 61;

#[derive(Debug)]
pub struct WorkerLocks {
    stripes: Box<[Mutex<()>]>,
}

impl Default for WorkerLocks {
    fn default() -> Self {
        Self::with_stripes(DEFAULT_STRIPES)
    }
}

impl WorkerLocks {
    pub fn with_stripes(n: usize) -> Self {
        let stripes = (0..n.max(1)).map(|_| Mutex::new(())).collect::<Vec<_>>();
        Self {
            stripes: stripes.into_boxed_slice(),
        }
    }

    fn stripe_of(&self, worker: &WorkerId) -> usize {
        let mut hasher = DefaultHasher::new();
        worker.as_str().hash(&mut hasher);
        (hasher.finish() as usize) % self.stripes.len()
    }

    /// Acquires the exclusion scope of every given worker, in stripe order,
    /// and returns the guards. Two workers on the same stripe share a guard.
    pub fn hold_all<'a>(&'a self, workers: &[WorkerId]) -> Vec<MutexGuard<'a, ()>> {
        let mut indexes: Vec<usize> = workers.iter().map(|w| self.stripe_of(w)).collect();
        indexes.sort_unstable();
        indexes.dedup();
        indexes
            .into_iter()
            .map(|i| {
                self.stripes[i]
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
            })
            .collect()
    }
}

/// Cooperative cancellation flag, honored only while conflict checking.
/// Once apply has begun the request runs to completion and reports what it
/// did instead of aborting mid-mutation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
