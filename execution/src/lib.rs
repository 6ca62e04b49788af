// Strategy Execution (Layer 3)
// Runs a pluggable, hot-swappable strategy unit under retry, timeout, and
// single-flight discipline, reporting execution metrics

pub mod errors;
pub mod metrics;
pub mod orchestrator;
pub mod strategy;

pub use errors::ExecutorError;
pub use metrics::ExecutionMetrics;
pub use orchestrator::{OrchestratorConfig, StrategyOrchestrator};
pub use strategy::{
    ConfigValidation, ExecutionContext, LoadedStrategy, ResultSink, StrategyFactory,
    StrategyUnit, StrategyVersion,
};
