// Executor Errors
// Failure taxonomy for strategy execution, hot-swap, and config updates

use thiserror::Error;

/// Errors surfaced by the strategy orchestrator.
///
/// `Timeout` and `Strategy` are retried up to the configured attempt count;
/// the rest fail immediately.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Single-flight guard: a second execute() while one is in progress
    #[error("execution already in progress")]
    ConcurrentExecution,

    /// Hot-swap or config update requested while an execution is in flight
    #[error("strategy swap rejected: execution in progress")]
    SwapInProgress,

    /// The strategy call outlasted the configured budget
    #[error("strategy execution timeout after {0}ms")]
    Timeout(u64),

    /// The strategy unit itself failed
    #[error("strategy error: {0}")]
    Strategy(String),

    /// Downstream forwarding failed; the strategy itself succeeded
    #[error("result sink error: {0}")]
    Sink(String),

    /// The loader could not produce a new strategy unit
    #[error("strategy load failed: {0}")]
    Load(String),

    /// Hot-swap/update config rejected by the unit's validator
    #[error("invalid strategy config: {}", .0.join("; "))]
    ConfigValidation(Vec<String>),
}
