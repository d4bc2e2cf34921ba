//! Metrics collection for janitor operations

use rumormill_service::DecaySummary;
use std::time::Duration;

/// Running totals across janitor sweeps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JanitorMetrics {
    /// Total sweep iterations completed
    pub sweep_count: usize,

    /// Active rumors examined
    pub processed: usize,

    /// Rumors whose believability dropped
    pub decayed: usize,

    /// Rumors marked expired
    pub expired: usize,

    /// Rumors that could not be updated
    pub errors: usize,

    /// Sweeps that failed outright
    pub failed_sweeps: usize,

    /// Total time spent sweeping
    pub total_runtime: Duration,
}

impl JanitorMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one decay pass into the totals
    pub fn record_decay(&mut self, summary: &DecaySummary) {
        self.processed += summary.processed;
        self.decayed += summary.decayed;
        self.expired += summary.expired;
        self.errors += summary.errors;
    }

    /// Record a sweep cycle completion
    pub fn record_sweep(&mut self, elapsed: Duration) {
        self.sweep_count += 1;
        self.total_runtime += elapsed;
    }

    /// Record a sweep that could not run
    pub fn record_failure(&mut self) {
        self.failed_sweeps += 1;
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Janitor Metrics Summary".to_string(),
            "======================".to_string(),
            format!("Sweep cycles: {}", self.sweep_count),
            format!("Failed sweeps: {}", self.failed_sweeps),
            format!("Total runtime: {}ms", self.total_runtime.as_millis()),
            String::new(),
            format!("Rumors processed: {}", self.processed),
            format!("Rumors decayed: {}", self.decayed),
            format!("Rumors expired: {}", self.expired),
            format!("Errors: {}", self.errors),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_decay_accumulates() {
        let mut metrics = JanitorMetrics::new();
        let summary = DecaySummary {
            processed: 4,
            decayed: 3,
            expired: 1,
            errors: 0,
        };
        metrics.record_decay(&summary);
        metrics.record_decay(&summary);
        metrics.record_sweep(Duration::from_millis(5));

        assert_eq!(metrics.processed, 8);
        assert_eq!(metrics.decayed, 6);
        assert_eq!(metrics.expired, 2);
        assert_eq!(metrics.sweep_count, 1);
        assert_eq!(metrics.total_runtime, Duration::from_millis(5));
    }

    #[test]
    fn test_reset() {
        let mut metrics = JanitorMetrics::new();
        metrics.record_sweep(Duration::from_secs(1));
        metrics.record_failure();
        metrics.reset();
        assert_eq!(metrics, JanitorMetrics::default());
    }

    #[test]
    fn test_summary() {
        let mut metrics = JanitorMetrics::new();
        metrics.record_decay(&DecaySummary {
            processed: 2,
            decayed: 2,
            expired: 1,
            errors: 1,
        });
        let summary = metrics.summary();
        assert!(summary.contains("Rumors expired: 1"));
        assert!(summary.contains("Errors: 1"));
    }
}
