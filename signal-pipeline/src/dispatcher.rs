// Batch Dispatcher
// Periodic tick that drains the queue in priority order and forwards
// signals, one batch at a time, to the downstream sink

use crate::pipeline::SignalProcessor;
use common::StandardSignal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Downstream consumer of dispatched signals.
///
/// Called once per batch; the call survives or fails as a whole and is not
/// retried.
#[async_trait::async_trait]
pub trait SignalSink: Send + Sync {
    async fn process(&self, signals: &[StandardSignal]) -> anyhow::Result<()>;
}

/// Summary of one dispatched batch
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Signals forwarded to the sink
    pub processed: usize,
    /// Signals dropped as expired or invalid
    pub failed: usize,
    pub duration_ms: u64,
    /// Set when the batch-level sink call failed
    pub sink_error: Option<String>,
}

/// Dispatch loop spawned by `SignalProcessor::start`.
///
/// Each tick runs to completion before the next is scheduled, so ticks
/// never overlap and per-batch ordering holds.
pub(crate) async fn run_dispatch_loop(
    processor: Arc<SignalProcessor>,
    sink: Arc<dyn SignalSink>,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = processor.config().dispatch_interval_ms;
    let mut interval = tokio::time::interval(Duration::from_millis(period));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(period_ms = period, "batch dispatcher started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Some(outcome) = processor.process_batch(sink.as_ref()).await {
                    debug!(
                        processed = outcome.processed,
                        failed = outcome.failed,
                        duration_ms = outcome.duration_ms,
                        "batch dispatched"
                    );
                }
            }
            _ = shutdown.changed() => {
                info!("batch dispatcher stopping");
                break;
            }
        }
    }
}
