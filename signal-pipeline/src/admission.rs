// Admission Filter
// Quality, risk, and rate gates applied before a signal enters the queue;
// rejections are filter outcomes, never errors

use chrono::{DateTime, Duration, Utc};
use common::{ProcessingConfig, RiskLevel, StandardSignal};
use tracing::debug;

/// Outcome of an admission decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    Admitted,
    /// Confidence or strength below the configured floor
    RejectedQuality(String),
    /// High-risk budget for the current window exhausted
    RejectedRisk(String),
    /// Per-minute admission cap reached
    RejectedRate(String),
}

impl AdmissionDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionDecision::Admitted)
    }
}

/// Gates signals at queue-insertion time.
///
/// Keeps a rolling counter of admitted high-risk signals and a rolling
/// per-minute admission counter; both read-modify-write paths run under the
/// caller's lock, so each decision is atomic.
pub struct AdmissionFilter {
    config: ProcessingConfig,
    high_risk_count: u32,
    risk_window_start: DateTime<Utc>,
    minute_count: u32,
    minute_window_start: DateTime<Utc>,
}

impl AdmissionFilter {
    pub fn new(config: ProcessingConfig) -> Self {
        let now = Utc::now();
        Self {
            config,
            high_risk_count: 0,
            risk_window_start: now,
            minute_count: 0,
            minute_window_start: now,
        }
    }

    /// Decide admission for a signal now.
    pub fn admit(&mut self, signal: &StandardSignal) -> AdmissionDecision {
        self.admit_at(signal, Utc::now())
    }

    /// Decide admission at an explicit instant; the window arithmetic is
    /// driven entirely by `now`.
    pub fn admit_at(&mut self, signal: &StandardSignal, now: DateTime<Utc>) -> AdmissionDecision {
        // Quality gate
        if signal.confidence < self.config.min_confidence {
            let reason = format!(
                "confidence {:.2} below minimum {:.2}",
                signal.confidence, self.config.min_confidence
            );
            debug!(id = %signal.id, %reason, "signal rejected");
            return AdmissionDecision::RejectedQuality(reason);
        }
        if signal.strength < self.config.min_strength {
            let reason = format!(
                "strength {:.2} below minimum {:.2}",
                signal.strength, self.config.min_strength
            );
            debug!(id = %signal.id, %reason, "signal rejected");
            return AdmissionDecision::RejectedQuality(reason);
        }

        // Risk gate: rolling window over admitted high-risk signals
        if now - self.risk_window_start > Duration::milliseconds(self.config.risk_timeout_ms) {
            self.high_risk_count = 0;
            self.risk_window_start = now;
        }
        if signal.risk_level == RiskLevel::High
            && self.high_risk_count >= self.config.max_high_risk_signals
        {
            let reason = format!(
                "high-risk budget exhausted ({} in window)",
                self.high_risk_count
            );
            debug!(id = %signal.id, %reason, "signal rejected");
            return AdmissionDecision::RejectedRisk(reason);
        }

        // Rate gate: rolling per-minute admission cap
        if now - self.minute_window_start > Duration::minutes(1) {
            self.minute_count = 0;
            self.minute_window_start = now;
        }
        if self.minute_count >= self.config.max_signals_per_minute {
            let reason = format!(
                "per-minute cap {} reached",
                self.config.max_signals_per_minute
            );
            debug!(id = %signal.id, %reason, "signal rejected");
            return AdmissionDecision::RejectedRate(reason);
        }

        if signal.risk_level == RiskLevel::High {
            self.high_risk_count += 1;
        }
        self.minute_count += 1;
        AdmissionDecision::Admitted
    }

    /// High-risk signals admitted in the current window
    pub fn high_risk_in_window(&self) -> u32 {
        self.high_risk_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{SignalAction, SignalSource, Urgency};
    use std::collections::HashMap;

    fn signal(confidence: f64, strength: f64, risk: RiskLevel) -> StandardSignal {
        StandardSignal {
            id: "sma_0_0".to_string(),
            source: SignalSource::Sma,
            action: SignalAction::Buy,
            confidence,
            strength,
            symbol: "BTCUSDT".to_string(),
            price: None,
            timestamp: Utc::now(),
            reason: "test".to_string(),
            metadata: HashMap::new(),
            risk_level: risk,
            urgency: Urgency::Low,
            valid_until: None,
        }
    }

    #[test]
    fn low_confidence_is_rejected() {
        let config = ProcessingConfig {
            min_confidence: 0.3,
            ..ProcessingConfig::default()
        };
        let mut filter = AdmissionFilter::new(config);
        let decision = filter.admit(&signal(0.1, 0.5, RiskLevel::Low));
        assert!(matches!(decision, AdmissionDecision::RejectedQuality(_)));
    }

    #[test]
    fn low_strength_is_rejected() {
        let mut filter = AdmissionFilter::new(ProcessingConfig::default());
        let decision = filter.admit(&signal(0.5, 0.05, RiskLevel::Low));
        assert!(matches!(decision, AdmissionDecision::RejectedQuality(_)));
    }

    #[test]
    fn high_risk_budget_enforced_within_window() {
        let config = ProcessingConfig {
            max_high_risk_signals: 5,
            ..ProcessingConfig::default()
        };
        let mut filter = AdmissionFilter::new(config);
        let now = Utc::now();

        for _ in 0..5 {
            let decision = filter.admit_at(&signal(0.8, 0.8, RiskLevel::High), now);
            assert!(decision.is_admitted());
        }
        let decision = filter.admit_at(&signal(0.8, 0.8, RiskLevel::High), now);
        assert!(matches!(decision, AdmissionDecision::RejectedRisk(_)));

        // Low-risk signals are unaffected by the risk budget
        let decision = filter.admit_at(&signal(0.8, 0.8, RiskLevel::Low), now);
        assert!(decision.is_admitted());
    }

    #[test]
    fn risk_window_resets_after_timeout() {
        let config = ProcessingConfig {
            max_high_risk_signals: 1,
            risk_timeout_ms: 60_000,
            ..ProcessingConfig::default()
        };
        let mut filter = AdmissionFilter::new(config);
        let now = Utc::now();

        assert!(filter
            .admit_at(&signal(0.8, 0.8, RiskLevel::High), now)
            .is_admitted());
        assert!(matches!(
            filter.admit_at(&signal(0.8, 0.8, RiskLevel::High), now),
            AdmissionDecision::RejectedRisk(_)
        ));

        let later = now + Duration::milliseconds(61_000);
        assert!(filter
            .admit_at(&signal(0.8, 0.8, RiskLevel::High), later)
            .is_admitted());
    }

    #[test]
    fn per_minute_cap_enforced() {
        let config = ProcessingConfig {
            max_signals_per_minute: 3,
            ..ProcessingConfig::default()
        };
        let mut filter = AdmissionFilter::new(config);
        let now = Utc::now();

        for _ in 0..3 {
            assert!(filter
                .admit_at(&signal(0.8, 0.8, RiskLevel::Low), now)
                .is_admitted());
        }
        assert!(matches!(
            filter.admit_at(&signal(0.8, 0.8, RiskLevel::Low), now),
            AdmissionDecision::RejectedRate(_)
        ));

        let later = now + Duration::seconds(61);
        assert!(filter
            .admit_at(&signal(0.8, 0.8, RiskLevel::Low), later)
            .is_admitted());
    }
}
