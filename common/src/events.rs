// Pipeline Events
// Published over an in-process broadcast channel; the serialized `event`
// tag names are the public contract and must not change

use crate::signal::{SignalAction, SignalSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification emitted by the pipeline and the orchestrator.
///
/// Serialized form is internally tagged, e.g.
/// `{"event":"signal-processed","signal_id":...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum PipelineEvent {
    /// A signal passed dispatch checks and was included in a batch
    SignalProcessed {
        signal_id: String,
        source: SignalSource,
        action: SignalAction,
        symbol: String,
        timestamp: DateTime<Utc>,
    },
    /// A signal was dropped at dispatch time
    SignalError {
        signal_id: String,
        symbol: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    /// A non-empty batch finished
    BatchProcessed {
        processed: usize,
        failed: usize,
        duration_ms: u64,
        /// Set when the single sink call for the batch failed
        sink_error: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// A strategy execution completed successfully
    StrategyExecuted {
        bot_id: String,
        action: SignalAction,
        confidence: f64,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    /// A strategy execution failed after exhausting retries
    StrategyExecutionError {
        bot_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// The active strategy unit was replaced
    HotSwapComplete {
        bot_id: String,
        strategy_type: String,
        version: String,
        timestamp: DateTime<Utc>,
    },
    /// The active strategy configuration was updated in place
    ConfigUpdated {
        bot_id: String,
        strategy_type: String,
        timestamp: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_tags_are_the_wire_contract() {
        let event = PipelineEvent::SignalProcessed {
            signal_id: "aether_0_0".to_string(),
            source: SignalSource::Aether,
            action: SignalAction::Buy,
            symbol: "BTCUSDT".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "signal-processed");

        let event = PipelineEvent::HotSwapComplete {
            bot_id: "bot-1".to_string(),
            strategy_type: "momentum".to_string(),
            version: "2".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "hot-swap-complete");

        let event = PipelineEvent::StrategyExecutionError {
            bot_id: "bot-1".to_string(),
            error: "timeout".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "strategy-execution-error");
    }
}
