//! Per-channel subscription and observer tracking.
//!
//! The registry remembers which market tickers are already subscribed on
//! each channel so that repeat `subscribe` calls only put the genuinely new
//! tickers on the wire, and so the full set can be replayed after a
//! reconnect. Observers are invoked in registration order.

use crate::message::StreamMessage;
use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Async message observer. Awaited to completion before the next frame is
/// dispatched.
pub type Observer = Arc<dyn Fn(StreamMessage) -> BoxFuture<'static, ()> + Send + Sync>;

/// Handle for removing a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Default)]
struct ChannelEntry {
    tickers: HashSet<String>,
    observers: Vec<(ObserverId, Observer)>,
}

/// Tracks subscribed tickers and observers per channel.
#[derive(Default)]
pub struct SubscriptionRegistry {
    channels: RwLock<HashMap<String, ChannelEntry>>,
    next_observer_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for a channel.
    pub fn add_observer(&self, channel: &str, observer: Observer) -> ObserverId {
        let id = ObserverId(self.next_observer_id.fetch_add(1, Ordering::Relaxed));
        let mut channels = self.channels.write();
        channels
            .entry(channel.to_string())
            .or_default()
            .observers
            .push((id, observer));
        id
    }

    /// Remove an observer. Unknown ids are a no-op.
    pub fn remove_observer(&self, channel: &str, id: ObserverId) {
        let mut channels = self.channels.write();
        if let Some(entry) = channels.get_mut(channel) {
            entry.observers.retain(|(oid, _)| *oid != id);
        }
    }

    /// Record tickers as subscribed on a channel, returning only the ones
    /// that were not already tracked (in input order).
    pub fn track_new(&self, channel: &str, tickers: &[String]) -> Vec<String> {
        let mut channels = self.channels.write();
        let entry = channels.entry(channel.to_string()).or_default();
        tickers
            .iter()
            .filter(|t| entry.tickers.insert((*t).clone()))
            .cloned()
            .collect()
    }

    /// Observers registered for a channel, in registration order.
    pub fn observers(&self, channel: &str) -> Vec<Observer> {
        self.channels
            .read()
            .get(channel)
            .map(|entry| entry.observers.iter().map(|(_, o)| o.clone()).collect())
            .unwrap_or_default()
    }

    /// Every channel with its full subscribed ticker set, for replay after
    /// a reconnect.
    pub fn subscriptions(&self) -> Vec<(String, Vec<String>)> {
        self.channels
            .read()
            .iter()
            .filter(|(_, entry)| !entry.tickers.is_empty())
            .map(|(channel, entry)| {
                let mut tickers: Vec<String> = entry.tickers.iter().cloned().collect();
                tickers.sort();
                (channel.clone(), tickers)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::CHANNEL_TICKER;

    fn tickers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_track_new_dedups_across_calls() {
        let registry = SubscriptionRegistry::new();

        let first = registry.track_new(CHANNEL_TICKER, &tickers(&["A", "B"]));
        assert_eq!(first, tickers(&["A", "B"]));

        let second = registry.track_new(CHANNEL_TICKER, &tickers(&["B", "C"]));
        assert_eq!(second, tickers(&["C"]));

        let third = registry.track_new(CHANNEL_TICKER, &tickers(&["A", "C"]));
        assert!(third.is_empty());
    }

    #[test]
    fn test_channels_are_independent() {
        let registry = SubscriptionRegistry::new();
        registry.track_new(CHANNEL_TICKER, &tickers(&["A"]));

        let on_other = registry.track_new("trade", &tickers(&["A"]));
        assert_eq!(on_other, tickers(&["A"]));
    }

    #[test]
    fn test_subscriptions_replay_full_sets() {
        let registry = SubscriptionRegistry::new();
        registry.track_new(CHANNEL_TICKER, &tickers(&["B", "A"]));
        registry.track_new(CHANNEL_TICKER, &tickers(&["C"]));

        let mut subs = registry.subscriptions();
        subs.sort();
        assert_eq!(subs, vec![(CHANNEL_TICKER.to_string(), tickers(&["A", "B", "C"]))]);
    }

    #[tokio::test]
    async fn test_observer_registration_order_and_removal() {
        let registry = SubscriptionRegistry::new();
        let calls = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let make = |tag: &'static str| -> Observer {
            let calls = calls.clone();
            Arc::new(move |_msg| {
                let calls = calls.clone();
                Box::pin(async move {
                    calls.lock().push(tag);
                })
            })
        };

        let first = registry.add_observer(CHANNEL_TICKER, make("first"));
        let _second = registry.add_observer(CHANNEL_TICKER, make("second"));

        let observers = registry.observers(CHANNEL_TICKER);
        assert_eq!(observers.len(), 2);
        for observer in &observers {
            observer(StreamMessage::Subscribed).await;
        }
        assert_eq!(*calls.lock(), vec!["first", "second"]);

        registry.remove_observer(CHANNEL_TICKER, first);
        assert_eq!(registry.observers(CHANNEL_TICKER).len(), 1);
    }
}
