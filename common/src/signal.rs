// Standard Signal Model
// The canonical, source-agnostic signal record every generator is
// normalized into before admission and dispatch

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Where a signal originated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SignalSource {
    Aether,
    Sma,
    TargetReacher,
    Strategy,
    Manual,
}

impl SignalSource {
    /// Stable lowercase name, used in signal ids and per-source stats keys
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalSource::Aether => "aether",
            SignalSource::Sma => "sma",
            SignalSource::TargetReacher => "target-reacher",
            SignalSource::Strategy => "strategy",
            SignalSource::Manual => "manual",
        }
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the signal asks the downstream sink to do
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
    Close,
}

impl SignalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalAction::Buy => "buy",
            SignalAction::Sell => "sell",
            SignalAction::Hold => "hold",
            SignalAction::Close => "close",
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk classification assigned by the normalizer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// How quickly the signal should be acted on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// Canonical trading signal, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardSignal {
    /// `{source}_{epoch-millis}_{sequence}`, unique within a process
    pub id: String,
    pub source: SignalSource,
    pub action: SignalAction,
    /// Confidence in the signal, 0.0 to 1.0
    pub confidence: f64,
    /// Magnitude of the underlying indication, 0.0 to 1.0
    pub strength: f64,
    pub symbol: String,
    pub price: Option<Decimal>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Human-readable explanation of why the signal was emitted
    pub reason: String,
    /// Source-specific key/value payload
    pub metadata: HashMap<String, serde_json::Value>,
    pub risk_level: RiskLevel,
    pub urgency: Urgency,
    /// Signals past this instant are rejected at dispatch time
    pub valid_until: Option<DateTime<Utc>>,
}

impl StandardSignal {
    /// Whether the signal's validity window has passed.
    ///
    /// Expiry is checked when the signal is dequeued for dispatch, not at
    /// admission time; a signal can expire while queued.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.map_or(false, |until| until < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_signal() -> StandardSignal {
        StandardSignal {
            id: "manual_0_0".to_string(),
            source: SignalSource::Manual,
            action: SignalAction::Buy,
            confidence: 0.5,
            strength: 0.5,
            symbol: "BTCUSDT".to_string(),
            price: None,
            timestamp: Utc::now(),
            reason: "test".to_string(),
            metadata: HashMap::new(),
            risk_level: RiskLevel::Low,
            urgency: Urgency::Low,
            valid_until: None,
        }
    }

    #[test]
    fn signal_without_expiry_never_expires() {
        let signal = base_signal();
        assert!(!signal.is_expired(Utc::now() + Duration::days(365)));
    }

    #[test]
    fn signal_expires_after_valid_until() {
        let now = Utc::now();
        let mut signal = base_signal();
        signal.valid_until = Some(now - Duration::seconds(1));
        assert!(signal.is_expired(now));

        signal.valid_until = Some(now + Duration::seconds(60));
        assert!(!signal.is_expired(now));
    }

    #[test]
    fn source_serializes_kebab_case() {
        let json = serde_json::to_string(&SignalSource::TargetReacher).unwrap();
        assert_eq!(json, "\"target-reacher\"");
        let json = serde_json::to_string(&SignalAction::Close).unwrap();
        assert_eq!(json, "\"close\"");
    }
}
