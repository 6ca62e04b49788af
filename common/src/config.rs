// Pipeline Configuration
// Tunable admission, queue, and dispatch parameters

use serde::{Deserialize, Serialize};

/// Configuration for signal admission, queueing, and batch dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Maximum signals drained per dispatch tick
    pub batch_size: usize,
    /// Rolling per-minute cap on admitted signals
    pub max_signals_per_minute: u32,
    /// Maximum time a signal may wait in the queue before it is treated
    /// as expired at dispatch time
    pub signal_expiration_ms: i64,
    /// Quality gate: minimum confidence to enter the queue
    pub min_confidence: f64,
    /// Quality gate: minimum strength to enter the queue
    pub min_strength: f64,
    /// Maximum high-risk signals admitted per risk window
    pub max_high_risk_signals: u32,
    /// Length of the rolling high-risk window, in milliseconds
    pub risk_timeout_ms: i64,
    /// Period of the batch dispatch tick, in milliseconds
    pub dispatch_interval_ms: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_signals_per_minute: 60,
            signal_expiration_ms: 300_000,
            min_confidence: 0.2,
            min_strength: 0.1,
            max_high_risk_signals: 5,
            risk_timeout_ms: 60_000,
            dispatch_interval_ms: 1_000,
        }
    }
}
