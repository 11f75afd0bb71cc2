//! Engine-agnostic metrics collection for loading and editing statistics.
//!
//! Feature-gated and runtime-toggled to ensure zero overhead when disabled.
//!
//! # Usage
//!
//! ```ignore
//! use globe_core::metrics::{LoaderMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! // Record a finished background pass:
//! metrics.record_pass(&stats, &index);
//! ```

use std::collections::VecDeque;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;
use std::sync::atomic::AtomicBool;

use crate::compartments::CompartmentIndex;
use crate::constants::NUM_COMPARTMENTS;

/// Runtime toggle for metrics collection.
/// Set to false to disable metrics gathering at runtime.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
    #[cfg(feature = "metrics")]
    {
        COLLECT_METRICS.load(Ordering::Relaxed)
    }
    #[cfg(not(feature = "metrics"))]
    {
        false
    }
}

/// Rolling window for storing recent values (e.g., timing history).
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    /// Create a new rolling window with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Push a new value, evicting the oldest if at capacity.
    pub fn push(&mut self, value: T) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get the most recent value.
    pub fn last(&self) -> Option<&T> {
        self.buffer.back()
    }
}

impl RollingWindow<u64> {
    pub fn sum(&self) -> u64 {
        self.buffer.iter().sum()
    }

    /// Compute the average of all values.
    pub fn average(&self) -> f64 {
        if self.buffer.is_empty() {
            0.0
        } else {
            self.sum() as f64 / self.buffer.len() as f64
        }
    }

    /// Get min and max values.
    pub fn min_max(&self) -> Option<(u64, u64)> {
        let min = *self.buffer.iter().min()?;
        let max = *self.buffer.iter().max()?;
        Some((min, max))
    }
}

impl Default for RollingWindow<u64> {
    fn default() -> Self {
        Self::new(32)
    }
}

/// Figures reported by one background pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Records read from the cursor and bucketed.
    pub scanned: usize,
    /// Records that could not be read and were skipped.
    pub skipped: usize,
    /// Wall time of the pass in microseconds.
    pub elapsed_us: u64,
}

/// Loader statistics accumulated across background passes.
#[derive(Debug, Clone)]
pub struct LoaderMetrics {
    /// Rolling window of pass durations in microseconds.
    pub pass_timings: RollingWindow<u64>,
    /// Points per compartment after the most recent pass.
    pub occupancy: [usize; NUM_COMPARTMENTS],
    /// Records scanned by the most recent pass.
    pub last_scanned: usize,
    /// Records skipped across all passes.
    pub total_skipped: usize,
    /// Passes completed this session.
    pub passes_completed: u64,
    /// Passes that failed to open the store.
    pub passes_failed: u64,
}

impl Default for LoaderMetrics {
    fn default() -> Self {
        Self {
            pass_timings: RollingWindow::default(),
            occupancy: [0; NUM_COMPARTMENTS],
            last_scanned: 0,
            total_skipped: 0,
            passes_completed: 0,
            passes_failed: 0,
        }
    }
}

impl LoaderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished pass and the index it produced.
    pub fn record_pass(&mut self, stats: &PassStats, index: &CompartmentIndex) {
        if !is_enabled() {
            return;
        }
        self.pass_timings.push(stats.elapsed_us);
        self.occupancy = index.occupancy();
        self.last_scanned = stats.scanned;
        self.total_skipped += stats.skipped;
        self.passes_completed += 1;
    }

    /// Record a pass that could not start.
    pub fn record_failure(&mut self) {
        if is_enabled() {
            self.passes_failed += 1;
        }
    }

    /// Fullest compartment as `(index, count)`.
    pub fn busiest_compartment(&self) -> Option<(usize, usize)> {
        self.occupancy
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, n)| n > 0)
            .max_by_key(|&(_, n)| n)
    }

    /// Get average pass timing in microseconds.
    pub fn avg_pass_timing_us(&self) -> f64 {
        self.pass_timings.average()
    }
}
