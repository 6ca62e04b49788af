// Signal Orchestration Service
// Wires the signal pipeline and the strategy orchestrator together with
// explicit construction; no global instances

use anyhow::Result;
use chrono::Utc;
use common::{ProcessingConfig, SignalAction, StandardSignal, StrategyResult};
use execution::{
    ConfigValidation, ExecutionContext, LoadedStrategy, OrchestratorConfig, ResultSink,
    StrategyFactory, StrategyOrchestrator, StrategyUnit, StrategyVersion,
};
use rust_decimal::Decimal;
use signal_pipeline::{SignalProcessor, SignalSink};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use uuid::Uuid;

/// Strategy-originated signals re-enter the queue ahead of external sources
const STRATEGY_FEEDBACK_PRIORITY: i32 = 3;

/// Toy momentum strategy for the demo loop
struct MomentumStrategy {
    window: u64,
    ticks: AtomicU64,
}

#[async_trait::async_trait]
impl StrategyUnit for MomentumStrategy {
    fn name(&self) -> &str {
        "momentum"
    }

    async fn execute(&self, ctx: &ExecutionContext) -> Result<StrategyResult> {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        // Trade every `window`th tick, hold otherwise
        if tick % self.window == 0 {
            Ok(StrategyResult::ok(
                SignalAction::Buy,
                0.7,
                format!("momentum breakout on {}", ctx.symbol),
            ))
        } else {
            Ok(StrategyResult::ok(SignalAction::Hold, 0.5, "no edge"))
        }
    }

    fn validate_config(&self, params: &serde_json::Value) -> ConfigValidation {
        match params.get("window").and_then(|w| w.as_u64()) {
            Some(w) if w > 0 => ConfigValidation::ok(),
            _ => ConfigValidation::invalid(vec![
                "'window' must be a positive integer".to_string()
            ]),
        }
    }
}

/// In-process loader standing in for the external plugin mechanism
struct LocalStrategyFactory {
    loads: AtomicU64,
}

#[async_trait::async_trait]
impl StrategyFactory for LocalStrategyFactory {
    async fn load(
        &self,
        strategy_type: &str,
        config: &serde_json::Value,
    ) -> Result<LoadedStrategy> {
        if strategy_type != "momentum" {
            anyhow::bail!("unknown strategy type '{strategy_type}'");
        }
        let window = config
            .get("window")
            .and_then(|w| w.as_u64())
            .unwrap_or(3)
            .max(1);
        let version = self.loads.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(LoadedStrategy {
            unit: Arc::new(MomentumStrategy {
                window,
                ticks: AtomicU64::new(0),
            }),
            version: StrategyVersion {
                id: Uuid::new_v4(),
                strategy_type: strategy_type.to_string(),
                version: version.to_string(),
                config: config.clone(),
                created_at: Utc::now(),
                is_active: false,
            },
        })
    }
}

/// Logs each dispatched batch; a real deployment forwards to the trade
/// execution layer here
struct LogSink;

#[async_trait::async_trait]
impl SignalSink for LogSink {
    async fn process(&self, signals: &[StandardSignal]) -> Result<()> {
        for signal in signals {
            info!(
                id = %signal.id,
                action = %signal.action,
                symbol = %signal.symbol,
                confidence = signal.confidence,
                "dispatching signal"
            );
        }
        Ok(())
    }
}

/// Feeds successful strategy results back into the pipeline as
/// strategy-sourced signals
struct PipelineFeedback {
    processor: Arc<SignalProcessor>,
    symbol: String,
    price: Option<Decimal>,
}

#[async_trait::async_trait]
impl ResultSink for PipelineFeedback {
    async fn deliver(&self, result: &StrategyResult) -> Result<()> {
        let signal = self
            .processor
            .normalizer()
            .from_strategy_result(result, &self.symbol, self.price)?;
        let decision = self.processor.submit(signal, STRATEGY_FEEDBACK_PRIORITY);
        if !decision.is_admitted() {
            warn!(?decision, "strategy signal filtered at admission");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("starting signal orchestration service");

    let processor = Arc::new(SignalProcessor::new(ProcessingConfig::default()));
    processor.clone().start(Arc::new(LogSink));

    let orchestrator = StrategyOrchestrator::new(
        "demo-bot",
        "momentum",
        serde_json::json!({"window": 3}),
        Arc::new(LocalStrategyFactory {
            loads: AtomicU64::new(0),
        }),
        Some(Arc::new(PipelineFeedback {
            processor: processor.clone(),
            symbol: "BTCUSDT".to_string(),
            price: Some(Decimal::from(50_000)),
        })),
        OrchestratorConfig::default(),
    )
    .await?;

    // Surface pipeline and orchestrator events for external observers
    let mut pipeline_events = processor.subscribe();
    let mut execution_events = orchestrator.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                Ok(event) = pipeline_events.recv() => {
                    info!(event = %serde_json::to_string(&event).unwrap_or_default(), "pipeline event");
                }
                Ok(event) = execution_events.recv() => {
                    info!(event = %serde_json::to_string(&event).unwrap_or_default(), "execution event");
                }
                else => break,
            }
        }
    });

    let ctx = ExecutionContext {
        bot_id: orchestrator.bot_id().to_string(),
        symbol: "BTCUSDT".to_string(),
        price: Some(Decimal::from(50_000)),
        deadline_ms: OrchestratorConfig::default().max_execution_time_ms,
        metadata: Default::default(),
    };
    let mut ticker = tokio::time::interval(Duration::from_secs(2));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = orchestrator.execute(&ctx).await {
                    warn!(error = %e, "strategy execution failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Stop dispatching; an in-flight execution is left to finish naturally
    processor.stop();
    let metrics = orchestrator.metrics();
    info!(
        executions = metrics.execution_count,
        success_rate = metrics.success_rate,
        signals_generated = metrics.signals_generated,
        "final execution metrics"
    );
    Ok(())
}
