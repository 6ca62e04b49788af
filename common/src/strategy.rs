// Strategy Result
// Outcome of one strategy unit execution; consumed by the orchestrator's
// metrics and fed back into the normalizer as a strategy-sourced signal

use crate::signal::SignalAction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result reported by a strategy unit for a single execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyResult {
    pub success: bool,
    pub action: SignalAction,
    /// Confidence in the decision, 0.0 to 1.0
    pub confidence: f64,
    pub reason: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Populated when `success` is false
    pub error: Option<String>,
}

impl StrategyResult {
    /// A successful result with no extra metadata
    pub fn ok(action: SignalAction, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            success: true,
            action,
            confidence,
            reason: reason.into(),
            metadata: HashMap::new(),
            error: None,
        }
    }

    /// A failed result carrying the unit's error message
    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            action: SignalAction::Hold,
            confidence: 0.0,
            reason: error.clone(),
            metadata: HashMap::new(),
            error: Some(error),
        }
    }
}
