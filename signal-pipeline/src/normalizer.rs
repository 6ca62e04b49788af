// Signal Normalizer
// Translates source-specific payloads into StandardSignal, computing
// risk level, urgency, and expiry with per-source heuristics

use chrono::{DateTime, Duration, Utc};
use common::{
    RiskLevel, SignalAction, SignalSource, StandardSignal, StrategyResult, Urgency,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::debug;

/// Validity windows applied by source, in minutes
const AETHER_VALIDITY_MIN: i64 = 5;
const SMA_VALIDITY_MIN: i64 = 3;
const STRATEGY_VALIDITY_MIN: i64 = 2;

/// Error translating a source payload into a StandardSignal.
///
/// Always recovered by the caller; a translation failure drops the payload
/// and is counted, never propagated as a crash.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("invalid {origin} payload: {cause}")]
    InvalidPayload {
        origin: SignalSource,
        cause: String,
    },
    #[error("strategy execution was not successful: {0}")]
    FailedStrategyResult(String),
}

/// Market regime reported by the Aether generator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketRegime {
    Bullish,
    Bearish,
    Sideways,
    Volatile,
}

/// Raw output of the Aether heuristic scorer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AetherPayload {
    /// Directional score in [-1, 1]; positive is bullish
    pub value: f64,
    /// Scorer confidence in [0, 1]
    pub confidence: f64,
    pub regime: MarketRegime,
}

/// Raw output of the moving-average crossover generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmaPayload {
    /// Crossover signal in [-1, 1]; positive is bullish
    pub signal: f64,
    /// Generator confidence in [0, 1]
    pub confidence: f64,
    /// Raw crossover strength in [-1, 1]
    pub strength: f64,
}

/// Converts source-specific payloads into the canonical signal schema.
///
/// Translation is deterministic except for the generated id, whose sequence
/// counter is owned by this instance (no global state).
pub struct SignalNormalizer {
    sequence: AtomicU64,
}

impl SignalNormalizer {
    pub fn new() -> Self {
        Self {
            sequence: AtomicU64::new(0),
        }
    }

    fn next_id(&self, source: SignalSource, timestamp: DateTime<Utc>) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}_{}_{}", source, timestamp.timestamp_millis(), seq)
    }

    /// Translate an Aether heuristic score into a StandardSignal.
    pub fn from_aether(
        &self,
        payload: &AetherPayload,
        symbol: &str,
        price: Option<Decimal>,
    ) -> Result<StandardSignal, TranslationError> {
        check_unit_range(SignalSource::Aether, "confidence", payload.confidence)?;
        check_magnitude(SignalSource::Aether, "value", payload.value)?;

        let action = if payload.value > 0.2 {
            SignalAction::Buy
        } else if payload.value < -0.2 {
            SignalAction::Sell
        } else {
            SignalAction::Hold
        };
        let strength = payload.value.abs();

        let risk_level = if payload.regime == MarketRegime::Volatile || payload.confidence < 0.4 {
            RiskLevel::High
        } else if payload.confidence > 0.7 {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        };

        let urgency = if strength >= 0.7 && payload.regime != MarketRegime::Sideways {
            Urgency::High
        } else if strength > 0.4 {
            Urgency::Medium
        } else {
            Urgency::Low
        };

        let timestamp = Utc::now();
        let mut metadata = HashMap::new();
        metadata.insert("raw_value".to_string(), serde_json::json!(payload.value));
        metadata.insert("regime".to_string(), serde_json::json!(payload.regime));

        let signal = StandardSignal {
            id: self.next_id(SignalSource::Aether, timestamp),
            source: SignalSource::Aether,
            action,
            confidence: payload.confidence,
            strength,
            symbol: symbol.to_string(),
            price,
            timestamp,
            reason: format!(
                "aether score {:.2} in {:?} regime",
                payload.value, payload.regime
            ),
            metadata,
            risk_level,
            urgency,
            valid_until: Some(timestamp + Duration::minutes(AETHER_VALIDITY_MIN)),
        };
        debug!(id = %signal.id, action = %signal.action, "translated aether signal");
        Ok(signal)
    }

    /// Translate a moving-average crossover output into a StandardSignal.
    pub fn from_sma(
        &self,
        payload: &SmaPayload,
        symbol: &str,
        price: Option<Decimal>,
    ) -> Result<StandardSignal, TranslationError> {
        check_unit_range(SignalSource::Sma, "confidence", payload.confidence)?;
        check_magnitude(SignalSource::Sma, "signal", payload.signal)?;
        check_magnitude(SignalSource::Sma, "strength", payload.strength)?;

        let action = if payload.signal > 0.5 {
            SignalAction::Buy
        } else if payload.signal < -0.5 {
            SignalAction::Sell
        } else {
            SignalAction::Hold
        };
        let strength = payload.strength.abs();

        let risk_level = if payload.confidence >= 0.7 && strength >= 0.6 {
            RiskLevel::Low
        } else if payload.confidence < 0.4 || strength < 0.3 {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        };

        let urgency = if strength > 0.8 {
            Urgency::High
        } else if strength > 0.5 {
            Urgency::Medium
        } else {
            Urgency::Low
        };

        let timestamp = Utc::now();
        let mut metadata = HashMap::new();
        metadata.insert("raw_signal".to_string(), serde_json::json!(payload.signal));

        let signal = StandardSignal {
            id: self.next_id(SignalSource::Sma, timestamp),
            source: SignalSource::Sma,
            action,
            confidence: payload.confidence,
            strength,
            symbol: symbol.to_string(),
            price,
            timestamp,
            reason: format!("sma crossover signal {:.2}", payload.signal),
            metadata,
            risk_level,
            urgency,
            valid_until: Some(timestamp + Duration::minutes(SMA_VALIDITY_MIN)),
        };
        debug!(id = %signal.id, action = %signal.action, "translated sma signal");
        Ok(signal)
    }

    /// Translate a strategy execution result into a StandardSignal.
    ///
    /// A failed result is a translation error, not a signal.
    pub fn from_strategy_result(
        &self,
        result: &StrategyResult,
        symbol: &str,
        price: Option<Decimal>,
    ) -> Result<StandardSignal, TranslationError> {
        if !result.success {
            return Err(TranslationError::FailedStrategyResult(
                result
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown strategy error".to_string()),
            ));
        }
        check_unit_range(SignalSource::Strategy, "confidence", result.confidence)?;

        let (strength, risk_level, urgency) = if result.action == SignalAction::Hold {
            (0.1, RiskLevel::Low, Urgency::Low)
        } else {
            let risk_level = if result.confidence > 0.8 {
                RiskLevel::Low
            } else if result.confidence < 0.4 {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };
            let urgency = if result.action == SignalAction::Close || result.confidence > 0.8 {
                Urgency::High
            } else if result.confidence > 0.6 {
                Urgency::Medium
            } else {
                Urgency::Low
            };
            (result.confidence, risk_level, urgency)
        };

        let timestamp = Utc::now();
        let signal = StandardSignal {
            id: self.next_id(SignalSource::Strategy, timestamp),
            source: SignalSource::Strategy,
            action: result.action,
            confidence: result.confidence,
            strength,
            symbol: symbol.to_string(),
            price,
            timestamp,
            reason: result.reason.clone(),
            metadata: result.metadata.clone(),
            risk_level,
            urgency,
            valid_until: Some(timestamp + Duration::minutes(STRATEGY_VALIDITY_MIN)),
        };
        debug!(id = %signal.id, action = %signal.action, "translated strategy result");
        Ok(signal)
    }

    /// Check a StandardSignal against the schema rules.
    ///
    /// Returns every violation found, not just the first; an empty vec means
    /// the signal is valid.
    pub fn validate_signal(&self, signal: &StandardSignal) -> Vec<String> {
        let mut violations = Vec::new();
        if signal.id.is_empty() {
            violations.push("id is empty".to_string());
        }
        if signal.symbol.is_empty() {
            violations.push("symbol is empty".to_string());
        }
        if !signal.confidence.is_finite() || !(0.0..=1.0).contains(&signal.confidence) {
            violations.push(format!(
                "confidence {} outside [0, 1]",
                signal.confidence
            ));
        }
        if !signal.strength.is_finite() || !(0.0..=1.0).contains(&signal.strength) {
            violations.push(format!("strength {} outside [0, 1]", signal.strength));
        }
        if signal.is_expired(Utc::now()) {
            violations.push("signal has already expired".to_string());
        }
        violations
    }
}

impl Default for SignalNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn check_unit_range(
    origin: SignalSource,
    field: &str,
    value: f64,
) -> Result<(), TranslationError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(TranslationError::InvalidPayload {
            origin,
            cause: format!("{field} {value} outside [0, 1]"),
        });
    }
    Ok(())
}

fn check_magnitude(origin: SignalSource, field: &str, value: f64) -> Result<(), TranslationError> {
    if !value.is_finite() || value.abs() > 1.0 {
        return Err(TranslationError::InvalidPayload {
            origin,
            cause: format!("{field} {value} outside [-1, 1]"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn aether_bullish_translates_to_strong_buy() {
        let normalizer = SignalNormalizer::new();
        let payload = AetherPayload {
            value: 0.8,
            confidence: 0.9,
            regime: MarketRegime::Bullish,
        };
        let signal = normalizer
            .from_aether(&payload, "BTCUSDT", Some(Decimal::from(50_000)))
            .unwrap();

        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.risk_level, RiskLevel::Low);
        assert_eq!(signal.urgency, Urgency::High);
        assert!((signal.strength - 0.8).abs() < 1e-9);
        assert_eq!(signal.source, SignalSource::Aether);
        assert!(signal.valid_until.is_some());
    }

    #[test]
    fn aether_neutral_value_holds() {
        let normalizer = SignalNormalizer::new();
        let payload = AetherPayload {
            value: 0.1,
            confidence: 0.5,
            regime: MarketRegime::Sideways,
        };
        let signal = normalizer.from_aether(&payload, "BTCUSDT", None).unwrap();
        assert_eq!(signal.action, SignalAction::Hold);
        assert_eq!(signal.urgency, Urgency::Low);
    }

    #[test]
    fn aether_volatile_regime_is_high_risk() {
        let normalizer = SignalNormalizer::new();
        let payload = AetherPayload {
            value: -0.9,
            confidence: 0.9,
            regime: MarketRegime::Volatile,
        };
        let signal = normalizer.from_aether(&payload, "BTCUSDT", None).unwrap();
        assert_eq!(signal.action, SignalAction::Sell);
        assert_eq!(signal.risk_level, RiskLevel::High);
    }

    #[test]
    fn sma_strong_sell_translates() {
        let normalizer = SignalNormalizer::new();
        let payload = SmaPayload {
            signal: -0.9,
            confidence: 0.8,
            strength: 0.9,
        };
        let signal = normalizer.from_sma(&payload, "ETHUSDT", None).unwrap();
        assert_eq!(signal.action, SignalAction::Sell);
        assert_eq!(signal.urgency, Urgency::High);
        assert_eq!(signal.risk_level, RiskLevel::Low);
    }

    #[test]
    fn sma_weak_signal_is_high_risk() {
        let normalizer = SignalNormalizer::new();
        let payload = SmaPayload {
            signal: 0.3,
            confidence: 0.5,
            strength: 0.2,
        };
        let signal = normalizer.from_sma(&payload, "ETHUSDT", None).unwrap();
        assert_eq!(signal.action, SignalAction::Hold);
        assert_eq!(signal.risk_level, RiskLevel::High);
        assert_eq!(signal.urgency, Urgency::Low);
    }

    #[test]
    fn failed_strategy_result_is_a_translation_error() {
        let normalizer = SignalNormalizer::new();
        let result = StrategyResult::failed("indicator window too short");
        let err = normalizer
            .from_strategy_result(&result, "BTCUSDT", None)
            .unwrap_err();
        assert!(matches!(err, TranslationError::FailedStrategyResult(_)));
    }

    #[test]
    fn hold_strategy_result_has_fixed_strength() {
        let normalizer = SignalNormalizer::new();
        let result = StrategyResult::ok(SignalAction::Hold, 0.9, "no edge");
        let signal = normalizer
            .from_strategy_result(&result, "BTCUSDT", None)
            .unwrap();
        assert!((signal.strength - 0.1).abs() < 1e-9);
        assert_eq!(signal.risk_level, RiskLevel::Low);
        assert_eq!(signal.urgency, Urgency::Low);
    }

    #[test]
    fn close_result_is_high_urgency() {
        let normalizer = SignalNormalizer::new();
        let result = StrategyResult::ok(SignalAction::Close, 0.5, "stop hit");
        let signal = normalizer
            .from_strategy_result(&result, "BTCUSDT", None)
            .unwrap();
        assert_eq!(signal.urgency, Urgency::High);
        assert_eq!(signal.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn malformed_payload_never_panics() {
        let normalizer = SignalNormalizer::new();
        let payload = AetherPayload {
            value: f64::NAN,
            confidence: 0.5,
            regime: MarketRegime::Bullish,
        };
        assert!(normalizer.from_aether(&payload, "BTCUSDT", None).is_err());

        let payload = SmaPayload {
            signal: 0.2,
            confidence: 1.5,
            strength: 0.2,
        };
        assert!(normalizer.from_sma(&payload, "BTCUSDT", None).is_err());
    }

    #[test]
    fn validation_reports_all_violations() {
        let normalizer = SignalNormalizer::new();
        let payload = AetherPayload {
            value: 0.8,
            confidence: 0.9,
            regime: MarketRegime::Bullish,
        };
        let mut signal = normalizer.from_aether(&payload, "BTCUSDT", None).unwrap();
        signal.confidence = 1.4;
        signal.strength = -0.2;
        signal.valid_until = Some(Utc::now() - Duration::seconds(10));

        let violations = normalizer.validate_signal(&signal);
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let normalizer = SignalNormalizer::new();
        let payload = AetherPayload {
            value: 0.8,
            confidence: 0.9,
            regime: MarketRegime::Bullish,
        };
        let a = normalizer.from_aether(&payload, "BTCUSDT", None).unwrap();
        let b = normalizer.from_aether(&payload, "BTCUSDT", None).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("aether_"));
    }
}
