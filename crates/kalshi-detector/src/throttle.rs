//! Alert cooldown tracking.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Per-key cooldown gate for alert emission.
///
/// Keys are market tickers or `event:<event_ticker>`, so single-market and
/// multi-way alerts throttle independently. Entries are never removed; the
/// key space is bounded by the tracked market set.
pub struct AlertThrottle {
    cooldown: Duration,
    last_alert: Mutex<HashMap<String, Instant>>,
}

impl AlertThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_alert: Mutex::new(HashMap::new()),
        }
    }

    /// Key for an event-level alert.
    pub fn event_key(event: &str) -> String {
        format!("event:{event}")
    }

    /// True if an alert may fire for this key now; records the emission
    /// when it does.
    pub fn gate(&self, key: &str) -> bool {
        self.gate_at(key, Instant::now())
    }

    fn gate_at(&self, key: &str, now: Instant) -> bool {
        let mut last_alert = self.last_alert.lock();
        match last_alert.get(key) {
            Some(last) if now.duration_since(*last) < self.cooldown => false,
            _ => {
                last_alert.insert(key.to_string(), now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_alert_passes_and_cooldown_holds() {
        let throttle = AlertThrottle::new(Duration::from_secs(30));
        let start = Instant::now();

        assert!(throttle.gate_at("MKT-A", start));
        assert!(!throttle.gate_at("MKT-A", start + Duration::from_secs(29)));
        assert!(throttle.gate_at("MKT-A", start + Duration::from_secs(31)));
    }

    #[test]
    fn test_keys_throttle_independently() {
        let throttle = AlertThrottle::new(Duration::from_secs(30));
        let start = Instant::now();

        assert!(throttle.gate_at("MKT-A", start));
        assert!(throttle.gate_at("MKT-B", start));
        assert!(throttle.gate_at(&AlertThrottle::event_key("EVT"), start));
        assert!(!throttle.gate_at("MKT-A", start + Duration::from_secs(1)));
    }

    #[test]
    fn test_suppressed_attempt_does_not_extend_cooldown() {
        let throttle = AlertThrottle::new(Duration::from_secs(30));
        let start = Instant::now();

        assert!(throttle.gate_at("MKT-A", start));
        assert!(!throttle.gate_at("MKT-A", start + Duration::from_secs(20)));
        // Cooldown still runs from the original emission.
        assert!(throttle.gate_at("MKT-A", start + Duration::from_secs(31)));
    }

    #[test]
    fn test_event_key_format() {
        assert_eq!(AlertThrottle::event_key("EVT"), "event:EVT");
    }
}
