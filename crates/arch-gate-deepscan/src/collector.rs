//! Run-scoped shared state: collected warnings and progress.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use arch_gate_core::DeepscanWarning;

/// Synchronized accumulator of warnings for one check run.
#[derive(Debug, Default)]
pub struct ViolationCollector {
    warnings: Mutex<Vec<DeepscanWarning>>,
}

impl ViolationCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one warning.
    pub fn record(&self, warning: DeepscanWarning) {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(warning);
    }

    /// Returns the number of warnings recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains every recorded warning.
    #[must_use]
    pub fn take(&self) -> Vec<DeepscanWarning> {
        std::mem::take(&mut *self.warnings.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Counts finished components out of a known total.
#[derive(Debug)]
pub struct Progress {
    done: AtomicUsize,
    total: usize,
}

impl Progress {
    /// Creates a counter for `total` units of work.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
        }
    }

    /// Marks one unit done and returns the new count.
    pub fn advance(&self) -> usize {
        self.done.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Units done so far.
    #[must_use]
    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    /// Total units.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }
}
