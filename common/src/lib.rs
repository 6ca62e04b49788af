// Shared Types (Layer 0)
// Canonical signal model, pipeline configuration, stats, and events
// used by every crate in the workspace

pub mod config;
pub mod events;
pub mod signal;
pub mod stats;
pub mod strategy;

pub use config::ProcessingConfig;
pub use events::PipelineEvent;
pub use signal::{RiskLevel, SignalAction, SignalSource, StandardSignal, Urgency};
pub use stats::ProcessingStats;
pub use strategy::StrategyResult;
