// Strategy Orchestrator
// Executes exactly one strategy unit at a time with bounded retries, a
// hard timeout, single-flight protection, and zero-downtime hot-swap

use crate::errors::ExecutorError;
use crate::metrics::ExecutionMetrics;
use crate::strategy::{
    ExecutionContext, ResultSink, StrategyFactory, StrategyUnit, StrategyVersion,
};
use anyhow::Context;
use chrono::Utc;
use common::{PipelineEvent, SignalAction, StrategyResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Retry and timeout budget for strategy executions
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Attempts per execute() call, at least 1
    pub retry_attempts: u32,
    /// Hard per-attempt budget, in milliseconds
    pub max_execution_time_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            max_execution_time_ms: 5_000,
        }
    }
}

struct ActiveStrategy {
    unit: Arc<dyn StrategyUnit>,
    version: StrategyVersion,
}

/// Runs a pluggable strategy unit against a shared context.
///
/// Single-flight: a second `execute` while one is in progress is rejected
/// immediately, never queued. Timing out an attempt drops the unit's future;
/// work the unit has spawned elsewhere is not reclaimed, so units are
/// expected to honor the `deadline_ms` hint in the context.
pub struct StrategyOrchestrator {
    bot_id: String,
    config: OrchestratorConfig,
    factory: Arc<dyn StrategyFactory>,
    sink: Option<Arc<dyn ResultSink>>,
    active: RwLock<ActiveStrategy>,
    executing: AtomicBool,
    metrics: Mutex<ExecutionMetrics>,
    events: broadcast::Sender<PipelineEvent>,
}

impl StrategyOrchestrator {
    /// Load the initial strategy and build the orchestrator.
    ///
    /// A loader failure here is fatal: with no strategy at all there is
    /// nothing to orchestrate, so startup aborts.
    pub async fn new(
        bot_id: impl Into<String>,
        strategy_type: &str,
        strategy_config: serde_json::Value,
        factory: Arc<dyn StrategyFactory>,
        sink: Option<Arc<dyn ResultSink>>,
        config: OrchestratorConfig,
    ) -> anyhow::Result<Self> {
        let bot_id = bot_id.into();
        let mut loaded = factory
            .load(strategy_type, &strategy_config)
            .await
            .with_context(|| format!("failed to load initial strategy '{strategy_type}'"))?;
        loaded.version.is_active = true;
        info!(
            bot_id = %bot_id,
            strategy = loaded.unit.name(),
            version = %loaded.version.version,
            "strategy loaded"
        );

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            bot_id,
            config,
            factory,
            sink,
            active: RwLock::new(ActiveStrategy {
                unit: loaded.unit,
                version: loaded.version,
            }),
            executing: AtomicBool::new(false),
            metrics: Mutex::new(ExecutionMetrics::new()),
            events,
        })
    }

    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    pub fn metrics(&self) -> ExecutionMetrics {
        self.metrics.lock().expect("metrics lock poisoned").clone()
    }

    pub fn active_version(&self) -> StrategyVersion {
        self.active
            .read()
            .expect("active strategy lock poisoned")
            .version
            .clone()
    }

    /// Execute the active strategy once, with retries and a per-attempt
    /// timeout. Metrics count one execution per call, not per attempt.
    pub async fn execute(
        &self,
        ctx: &ExecutionContext,
    ) -> Result<StrategyResult, ExecutorError> {
        // Single-flight guard; rejected calls touch neither metrics nor
        // the active unit
        if self
            .executing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(bot_id = %self.bot_id, "concurrent execution rejected");
            return Err(ExecutorError::ConcurrentExecution);
        }

        let unit = {
            self.active
                .read()
                .expect("active strategy lock poisoned")
                .unit
                .clone()
        };
        let attempts = self.config.retry_attempts.max(1);
        let budget = Duration::from_millis(self.config.max_execution_time_ms);
        let started = Instant::now();

        let mut outcome: Result<StrategyResult, ExecutorError> =
            Err(ExecutorError::Strategy("no attempt made".to_string()));
        for attempt in 1..=attempts {
            let attempt_result = match tokio::time::timeout(budget, unit.execute(ctx)).await {
                Err(_) => Err(ExecutorError::Timeout(self.config.max_execution_time_ms)),
                Ok(Err(e)) => Err(ExecutorError::Strategy(e.to_string())),
                Ok(Ok(result)) if !result.success => Err(ExecutorError::Strategy(
                    result
                        .error
                        .clone()
                        .unwrap_or_else(|| "strategy reported failure".to_string()),
                )),
                Ok(Ok(result)) => Ok(result),
            };

            match attempt_result {
                Ok(result) => {
                    // Forward downstream; a sink failure is an execution
                    // failure even though the strategy itself succeeded
                    if let Some(sink) = &self.sink {
                        if let Err(e) = sink.deliver(&result).await {
                            outcome = Err(ExecutorError::Sink(e.to_string()));
                            break;
                        }
                    }
                    outcome = Ok(result);
                    break;
                }
                Err(e) => {
                    if attempt < attempts {
                        warn!(
                            bot_id = %self.bot_id,
                            attempt,
                            error = %e,
                            "strategy attempt failed, retrying"
                        );
                    }
                    outcome = Err(e);
                }
            }
        }

        // Wall-clock duration of the whole call, retries included
        let duration_ms = started.elapsed().as_millis() as u64;
        let now = Utc::now();
        {
            let mut metrics = self.metrics.lock().expect("metrics lock poisoned");
            match &outcome {
                Ok(result) => metrics.record_success(
                    duration_ms,
                    result.action != SignalAction::Hold,
                    now,
                ),
                Err(_) => metrics.record_error(duration_ms, now),
            }
        }

        match &outcome {
            Ok(result) => {
                self.emit(PipelineEvent::StrategyExecuted {
                    bot_id: self.bot_id.clone(),
                    action: result.action,
                    confidence: result.confidence,
                    reason: result.reason.clone(),
                    timestamp: now,
                });
            }
            Err(e) => {
                self.emit(PipelineEvent::StrategyExecutionError {
                    bot_id: self.bot_id.clone(),
                    error: e.to_string(),
                    timestamp: now,
                });
            }
        }

        self.executing.store(false, Ordering::SeqCst);
        outcome
    }

    /// Replace the active strategy unit without restarting the
    /// orchestrator.
    ///
    /// A swap requested while an execution is in flight is rejected; the
    /// replacement itself happens under the write lock, so the unit/version
    /// pair can never be observed half-updated.
    pub async fn hot_swap(
        &self,
        strategy_type: &str,
        strategy_config: serde_json::Value,
    ) -> Result<StrategyVersion, ExecutorError> {
        if self.executing.load(Ordering::SeqCst) {
            return Err(ExecutorError::SwapInProgress);
        }

        let mut loaded = self
            .factory
            .load(strategy_type, &strategy_config)
            .await
            .map_err(|e| ExecutorError::Load(e.to_string()))?;
        loaded.version.is_active = true;

        let version = loaded.version.clone();
        {
            let mut active = self.active.write().expect("active strategy lock poisoned");
            active.version.is_active = false;
            info!(
                bot_id = %self.bot_id,
                old = %active.version.version,
                new = %version.version,
                strategy_type,
                "hot-swapping strategy"
            );
            *active = ActiveStrategy {
                unit: loaded.unit,
                version: loaded.version,
            };
        }

        self.emit(PipelineEvent::HotSwapComplete {
            bot_id: self.bot_id.clone(),
            strategy_type: strategy_type.to_string(),
            version: version.version.clone(),
            timestamp: Utc::now(),
        });
        Ok(version)
    }

    /// Merge `patch` over the active configuration and apply it if the
    /// unit's validator accepts the result. An invalid merge is rejected
    /// without mutating state.
    pub async fn update_strategy_config(
        &self,
        patch: &serde_json::Value,
    ) -> Result<StrategyVersion, ExecutorError> {
        if self.executing.load(Ordering::SeqCst) {
            return Err(ExecutorError::SwapInProgress);
        }

        // Merge, validate, and apply under one write-lock scope so a swap
        // cannot slide in between validation and the write. Validation is
        // synchronous, so no lock is held across an await.
        let version = {
            let mut active = self.active.write().expect("active strategy lock poisoned");
            let merged = merge_config(&active.version.config, patch);
            let validation = active.unit.validate_config(&merged);
            if !validation.valid {
                return Err(ExecutorError::ConfigValidation(validation.errors));
            }
            active.version.config = merged;
            active.version.clone()
        };
        info!(bot_id = %self.bot_id, strategy_type = %version.strategy_type, "strategy config updated");

        self.emit(PipelineEvent::ConfigUpdated {
            bot_id: self.bot_id.clone(),
            strategy_type: version.strategy_type.clone(),
            timestamp: Utc::now(),
        });
        Ok(version)
    }

    fn emit(&self, event: PipelineEvent) {
        let _ = self.events.send(event);
    }
}

/// Shallow merge of `patch` object keys over `base`; non-object inputs are
/// replaced wholesale.
fn merge_config(base: &serde_json::Value, patch: &serde_json::Value) -> serde_json::Value {
    match (base.as_object(), patch.as_object()) {
        (Some(base_map), Some(patch_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in patch_map {
                merged.insert(key.clone(), value.clone());
            }
            serde_json::Value::Object(merged)
        }
        _ => patch.clone(),
    }
}
