// Strategy Seam
// Interfaces between the orchestrator and its external collaborators:
// the strategy unit, the loader, and the downstream result sink

use chrono::{DateTime, Utc};
use common::StrategyResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Shared context handed to the strategy unit on each execution
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub bot_id: String,
    pub symbol: String,
    pub price: Option<Decimal>,
    /// Soft deadline hint, mirrors the orchestrator's execution budget.
    /// Units are expected to stop work within it; the orchestrator cannot
    /// forcibly cancel a call that ignores it.
    pub deadline_ms: u64,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Result of validating a (merged) strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ConfigValidation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

/// A pluggable strategy implementation.
///
/// Exactly one unit is active per orchestrator; replaced atomically by
/// hot-swap.
#[async_trait::async_trait]
pub trait StrategyUnit: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &str;

    /// Run one execution against the shared context.
    async fn execute(&self, ctx: &ExecutionContext) -> anyhow::Result<StrategyResult>;

    /// Validate a candidate configuration before it is applied.
    fn validate_config(&self, params: &serde_json::Value) -> ConfigValidation;
}

/// Identifies a loaded strategy unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyVersion {
    pub id: Uuid,
    pub strategy_type: String,
    pub version: String,
    pub config: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// A unit/version pair produced by the loader
pub struct LoadedStrategy {
    pub unit: Arc<dyn StrategyUnit>,
    pub version: StrategyVersion,
}

/// External strategy loader, used at initialization and for hot-swap.
///
/// The orchestrator only ever holds this interface, never a concrete
/// strategy type.
#[async_trait::async_trait]
pub trait StrategyFactory: Send + Sync {
    async fn load(
        &self,
        strategy_type: &str,
        config: &serde_json::Value,
    ) -> anyhow::Result<LoadedStrategy>;
}

/// Downstream consumer of successful strategy results; the feedback edge
/// into the signal normalizer lives behind this trait.
#[async_trait::async_trait]
pub trait ResultSink: Send + Sync {
    async fn deliver(&self, result: &StrategyResult) -> anyhow::Result<()>;
}
