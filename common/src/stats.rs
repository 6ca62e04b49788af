// Processing Statistics
// Monotonically accumulating pipeline counters, reset only by explicit
// operator action

use crate::signal::StandardSignal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Accumulated pipeline statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Signals that reached the dispatcher (successful + failed)
    pub total: u64,
    /// Signals forwarded to the sink
    pub successful: u64,
    /// Signals dropped at dispatch time (expired or invalid)
    pub failed: u64,
    /// Signals rejected by admission control
    pub filtered: u64,
    /// Successful signals keyed by source name
    pub by_source: HashMap<String, u64>,
    /// Successful signals keyed by action name
    pub by_action: HashMap<String, u64>,
    /// Running average confidence over successful signals
    pub avg_confidence: f64,
    /// Running average strength over successful signals
    pub avg_strength: f64,
    /// Wall-clock duration of the most recent batch, in milliseconds
    pub last_batch_ms: u64,
    /// Last time any signal touched the pipeline
    pub last_activity: Option<DateTime<Utc>>,
    /// Last time a non-empty batch completed
    pub last_processed: Option<DateTime<Utc>>,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a signal that passed dispatch checks and was forwarded.
    pub fn record_success(&mut self, signal: &StandardSignal, now: DateTime<Utc>) {
        self.total += 1;
        self.successful += 1;
        *self
            .by_source
            .entry(signal.source.as_str().to_string())
            .or_insert(0) += 1;
        *self
            .by_action
            .entry(signal.action.as_str().to_string())
            .or_insert(0) += 1;

        // Incremental mean over all successful signals
        let n = self.successful as f64;
        self.avg_confidence += (signal.confidence - self.avg_confidence) / n;
        self.avg_strength += (signal.strength - self.avg_strength) / n;
        self.last_activity = Some(now);
    }

    /// Record a signal dropped at dispatch time (expired or invalid).
    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.total += 1;
        self.failed += 1;
        self.last_activity = Some(now);
    }

    /// Record a signal rejected by admission control.
    pub fn record_filtered(&mut self, now: DateTime<Utc>) {
        self.filtered += 1;
        self.last_activity = Some(now);
    }

    /// Record the completion of a non-empty batch.
    pub fn record_batch(&mut self, duration_ms: u64, now: DateTime<Utc>) {
        self.last_batch_ms = duration_ms;
        self.last_processed = Some(now);
    }

    /// Explicit operator reset; counters are never reset implicitly.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
