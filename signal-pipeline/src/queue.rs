// Priority Queue
// Ordered holding area for admitted signals: highest priority first,
// FIFO within equal priority

use chrono::{DateTime, Duration, Utc};
use common::StandardSignal;
use std::collections::BTreeMap;
use tracing::info;

/// A signal waiting for dispatch, owned exclusively by the queue
#[derive(Debug, Clone)]
pub struct QueuedSignal {
    pub signal: StandardSignal,
    pub added_at: DateTime<Utc>,
    /// Caller-supplied priority; strategy-originated signals use 3,
    /// external sources 1-2
    pub priority: i32,
    /// Arrival sequence, the FIFO tie-break within equal priority
    seq: u64,
}

/// Default priority for signals enqueued without one
pub const DEFAULT_PRIORITY: i32 = 1;

/// Holds admitted signals until the dispatcher drains them.
///
/// Re-sorts on every insertion; fine at pipeline scale, there is no
/// large-N requirement.
pub struct SignalQueue {
    entries: Vec<QueuedSignal>,
    next_seq: u64,
}

impl SignalQueue {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// Insert a signal and restore queue order.
    pub fn enqueue(&mut self, signal: StandardSignal, priority: i32) {
        let entry = QueuedSignal {
            signal,
            added_at: Utc::now(),
            priority,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.push(entry);
        self.entries
            .sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
    }

    /// Remove and return up to `n` signals from the front of the queue.
    pub fn drain(&mut self, n: usize) -> Vec<QueuedSignal> {
        let n = n.min(self.entries.len());
        self.entries.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending signal counts keyed by priority
    pub fn priority_histogram(&self) -> BTreeMap<i32, usize> {
        let mut histogram = BTreeMap::new();
        for entry in &self.entries {
            *histogram.entry(entry.priority).or_insert(0) += 1;
        }
        histogram
    }

    /// Age of the oldest pending signal, if any
    pub fn oldest_age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.entries
            .iter()
            .map(|e| now - e.added_at)
            .max()
    }

    /// Drop all pending signals without executing them. Returns the number
    /// dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        if dropped > 0 {
            info!(dropped, "clearing signal queue, pending signals dropped");
        }
        self.entries.clear();
        dropped
    }
}

impl Default for SignalQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{RiskLevel, SignalAction, SignalSource, Urgency};
    use std::collections::HashMap;

    fn signal(id: &str) -> StandardSignal {
        StandardSignal {
            id: id.to_string(),
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
    fn drains_by_priority_then_insertion_order() {
        let mut queue = SignalQueue::new();
        queue.enqueue(signal("a"), 1);
        queue.enqueue(signal("b"), 3);
        queue.enqueue(signal("c"), 2);
        queue.enqueue(signal("d"), 3);
        queue.enqueue(signal("e"), 1);

        let drained = queue.drain(10);
        let ids: Vec<&str> = drained.iter().map(|q| q.signal.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "c", "a", "e"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_removes_only_the_front_n() {
        let mut queue = SignalQueue::new();
        queue.enqueue(signal("a"), 1);
        queue.enqueue(signal("b"), 2);
        queue.enqueue(signal("c"), 1);

        let drained = queue.drain(2);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].signal.id, "b");
        assert_eq!(drained[1].signal.id, "a");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn histogram_counts_per_priority() {
        let mut queue = SignalQueue::new();
        queue.enqueue(signal("a"), 1);
        queue.enqueue(signal("b"), 3);
        queue.enqueue(signal("c"), 3);

        let histogram = queue.priority_histogram();
        assert_eq!(histogram.get(&1), Some(&1));
        assert_eq!(histogram.get(&3), Some(&2));
    }

    #[test]
    fn clear_drops_everything() {
        let mut queue = SignalQueue::new();
        queue.enqueue(signal("a"), 1);
        queue.enqueue(signal("b"), 1);
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert!(queue.oldest_age(Utc::now()).is_none());
    }

    #[test]
    fn oldest_age_tracks_first_arrival() {
        let mut queue = SignalQueue::new();
        queue.enqueue(signal("a"), 1);
        let age = queue.oldest_age(Utc::now() + Duration::seconds(5)).unwrap();
        assert!(age >= Duration::seconds(5));
    }
}
