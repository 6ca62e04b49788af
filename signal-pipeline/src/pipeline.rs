// Signal Processor
// Facade wiring admission, queue, and dispatch together; constructed
// explicitly and injected where needed, no global instances

use crate::admission::{AdmissionDecision, AdmissionFilter};
use crate::dispatcher::{self, BatchOutcome, SignalSink};
use crate::normalizer::SignalNormalizer;
use crate::queue::{SignalQueue, DEFAULT_PRIORITY};
use chrono::Utc;
use common::{PipelineEvent, ProcessingConfig, ProcessingStats, StandardSignal};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Orchestrates the signal pipeline: submit -> admission -> queue ->
/// periodic batch dispatch to the registered sink.
///
/// Queue, filter, and stats sit behind `std::sync::Mutex` so `submit` stays
/// synchronous on the caller's thread; no lock is held across an await.
pub struct SignalProcessor {
    config: ProcessingConfig,
    normalizer: SignalNormalizer,
    queue: Mutex<SignalQueue>,
    filter: Mutex<AdmissionFilter>,
    stats: Mutex<ProcessingStats>,
    events: broadcast::Sender<PipelineEvent>,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
}

impl SignalProcessor {
    pub fn new(config: ProcessingConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            filter: Mutex::new(AdmissionFilter::new(config.clone())),
            config,
            normalizer: SignalNormalizer::new(),
            queue: Mutex::new(SignalQueue::new()),
            stats: Mutex::new(ProcessingStats::new()),
            events,
            shutdown: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// The normalizer whose id sequence this processor owns
    pub fn normalizer(&self) -> &SignalNormalizer {
        &self.normalizer
    }

    /// Subscribe to pipeline events. Lagging subscribers miss events rather
    /// than block the pipeline.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    /// Submit a normalized signal for admission and queueing.
    ///
    /// Synchronous: runs on the caller's thread with no suspension.
    /// Rejections increment the `filtered` counter and are outcomes, not
    /// errors.
    pub fn submit(&self, signal: StandardSignal, priority: i32) -> AdmissionDecision {
        let decision = self
            .filter
            .lock()
            .expect("admission filter lock poisoned")
            .admit(&signal);

        if decision.is_admitted() {
            debug!(id = %signal.id, priority, "signal admitted");
            self.queue
                .lock()
                .expect("queue lock poisoned")
                .enqueue(signal, priority);
        } else {
            self.stats
                .lock()
                .expect("stats lock poisoned")
                .record_filtered(Utc::now());
        }
        decision
    }

    /// Submit with the default priority of 1.
    pub fn submit_default(&self, signal: StandardSignal) -> AdmissionDecision {
        self.submit(signal, DEFAULT_PRIORITY)
    }

    /// Drain up to `batch_size` signals and process them sequentially in
    /// dequeue order. Returns `None` when the queue was empty.
    ///
    /// Sequential processing is a deliberate ordering guarantee: two signals
    /// for the same symbol are never applied out of order downstream.
    pub async fn process_batch(&self, sink: &dyn SignalSink) -> Option<BatchOutcome> {
        let batch = self
            .queue
            .lock()
            .expect("queue lock poisoned")
            .drain(self.config.batch_size);
        if batch.is_empty() {
            return None;
        }

        let started = Instant::now();
        let mut forward = Vec::with_capacity(batch.len());
        let mut failed = 0usize;

        for queued in batch {
            let signal = queued.signal;
            let now = Utc::now();

            // A signal expires via its own valid_until or by sitting in the
            // queue longer than the configured expiration window
            let stale = (now - queued.added_at).num_milliseconds()
                > self.config.signal_expiration_ms;
            if signal.is_expired(now) || stale {
                failed += 1;
                self.stats
                    .lock()
                    .expect("stats lock poisoned")
                    .record_failure(now);
                self.emit(PipelineEvent::SignalError {
                    signal_id: signal.id.clone(),
                    symbol: signal.symbol.clone(),
                    reason: "expired".to_string(),
                    timestamp: now,
                });
                debug!(id = %signal.id, "signal expired in queue");
                continue;
            }

            let violations = self.normalizer.validate_signal(&signal);
            if !violations.is_empty() {
                failed += 1;
                self.stats
                    .lock()
                    .expect("stats lock poisoned")
                    .record_failure(now);
                self.emit(PipelineEvent::SignalError {
                    signal_id: signal.id.clone(),
                    symbol: signal.symbol.clone(),
                    reason: format!("invalid: {}", violations.join("; ")),
                    timestamp: now,
                });
                warn!(id = %signal.id, ?violations, "invalid signal dropped");
                continue;
            }

            self.stats
                .lock()
                .expect("stats lock poisoned")
                .record_success(&signal, now);
            self.emit(PipelineEvent::SignalProcessed {
                signal_id: signal.id.clone(),
                source: signal.source,
                action: signal.action,
                symbol: signal.symbol.clone(),
                timestamp: now,
            });
            forward.push(signal);
        }

        // One sink call per batch; a sink failure is reported at batch level
        // without retry and without un-counting per-signal outcomes.
        let mut sink_error = None;
        if !forward.is_empty() {
            if let Err(e) = sink.process(&forward).await {
                warn!(error = %e, batch = forward.len(), "sink rejected batch");
                sink_error = Some(e.to_string());
            }
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        let now = Utc::now();
        self.stats
            .lock()
            .expect("stats lock poisoned")
            .record_batch(duration_ms, now);

        let outcome = BatchOutcome {
            processed: forward.len(),
            failed,
            duration_ms,
            sink_error: sink_error.clone(),
        };
        self.emit(PipelineEvent::BatchProcessed {
            processed: outcome.processed,
            failed: outcome.failed,
            duration_ms,
            sink_error,
            timestamp: now,
        });
        Some(outcome)
    }

    /// Start the periodic dispatch loop against `sink`.
    pub fn start(self: Arc<Self>, sink: Arc<dyn SignalSink>) {
        let mut shutdown = self.shutdown.lock().expect("shutdown lock poisoned");
        if shutdown.is_some() {
            warn!("signal processor already started");
            return;
        }
        let (tx, rx) = watch::channel(false);
        *shutdown = Some(tx);
        drop(shutdown);
        tokio::spawn(dispatcher::run_dispatch_loop(self, sink, rx));
    }

    /// Stop the dispatch loop and drop all pending signals without
    /// executing them. Does not cancel an in-flight strategy execution.
    pub fn stop(&self) {
        if let Some(tx) = self
            .shutdown
            .lock()
            .expect("shutdown lock poisoned")
            .take()
        {
            let _ = tx.send(true);
        }
        let dropped = self.queue.lock().expect("queue lock poisoned").clear();
        info!(dropped, "signal processor stopped");
    }

    pub fn stats(&self) -> ProcessingStats {
        self.stats.lock().expect("stats lock poisoned").clone()
    }

    /// Explicit operator reset of the accumulated counters.
    pub fn reset_stats(&self) {
        self.stats.lock().expect("stats lock poisoned").reset();
        info!("processing stats reset");
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.lock().expect("queue lock poisoned").len()
    }

    pub fn queue_histogram(&self) -> BTreeMap<i32, usize> {
        self.queue
            .lock()
            .expect("queue lock poisoned")
            .priority_histogram()
    }

    /// Age of the oldest queued signal, in milliseconds
    pub fn oldest_signal_age_ms(&self) -> Option<i64> {
        self.queue
            .lock()
            .expect("queue lock poisoned")
            .oldest_age(Utc::now())
            .map(|age| age.num_milliseconds())
    }

    fn emit(&self, event: PipelineEvent) {
        // No subscribers is fine; events are best-effort notifications
        let _ = self.events.send(event);
    }
}
