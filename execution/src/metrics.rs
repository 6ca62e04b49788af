// Execution Metrics
// Per-orchestrator counters updated after every execution attempt,
// including failures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accumulated strategy execution metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    /// Completed execute() calls (one per call, regardless of retries)
    pub execution_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    /// Non-hold successful results forwarded downstream
    pub signals_generated: u64,
    /// Running mean wall-clock duration of execute() calls, retries included
    pub average_execution_time_ms: f64,
    /// success_count / execution_count
    pub success_rate: f64,
    pub last_execution_at: Option<DateTime<Utc>>,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful execution of `duration_ms` wall-clock time.
    pub fn record_success(&mut self, duration_ms: u64, generated_signal: bool, now: DateTime<Utc>) {
        self.execution_count += 1;
        self.success_count += 1;
        if generated_signal {
            self.signals_generated += 1;
        }
        self.update_derived(duration_ms, now);
    }

    /// Record a failed execution of `duration_ms` wall-clock time.
    pub fn record_error(&mut self, duration_ms: u64, now: DateTime<Utc>) {
        self.execution_count += 1;
        self.error_count += 1;
        self.update_derived(duration_ms, now);
    }

    fn update_derived(&mut self, duration_ms: u64, now: DateTime<Utc>) {
        let n = self.execution_count as f64;
        self.average_execution_time_ms += (duration_ms as f64 - self.average_execution_time_ms) / n;
        self.success_rate = self.success_count as f64 / n;
        self.last_execution_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_and_average_track_all_calls() {
        let mut metrics = ExecutionMetrics::new();
        let now = Utc::now();
        metrics.record_success(100, true, now);
        metrics.record_error(300, now);
        metrics.record_success(200, false, now);

        assert_eq!(metrics.execution_count, 3);
        assert_eq!(metrics.success_count, 2);
        assert_eq!(metrics.error_count, 1);
        assert_eq!(metrics.signals_generated, 1);
        assert!((metrics.average_execution_time_ms - 200.0).abs() < 1e-9);
        assert!((metrics.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!(metrics.last_execution_at.is_some());
    }
}
