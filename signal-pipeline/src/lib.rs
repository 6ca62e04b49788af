// Signal Pipeline (Layer 1)
// Normalizes source-specific signals into the standard schema, gates them
// through admission control, and dispatches them in priority order

pub mod admission;
pub mod dispatcher;
pub mod normalizer;
pub mod pipeline;
pub mod queue;

pub use admission::{AdmissionDecision, AdmissionFilter};
pub use dispatcher::{BatchOutcome, SignalSink};
pub use normalizer::{AetherPayload, MarketRegime, SignalNormalizer, SmaPayload, TranslationError};
pub use pipeline::SignalProcessor;
pub use queue::{QueuedSignal, SignalQueue, DEFAULT_PRIORITY};
