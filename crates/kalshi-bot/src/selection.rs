//! Market selection.
//!
//! Picks which markets to watch out of the registry listing: tradeable
//! markets with recent volume, grouped by event, with the busiest events
//! kept whole so multi-way detection sees every member.

use kalshi_registry::ApiMarket;
use std::collections::HashMap;
use tracing::info;

/// Select the markets to monitor.
///
/// Filters to open markets with positive 24h volume (falling back to all
/// open markets when nothing traded recently), groups them by event, ranks
/// events by summed 24h volume, and keeps the top `top_events` events with
/// all their member markets.
pub fn select_markets(markets: Vec<ApiMarket>, top_events: usize) -> Vec<ApiMarket> {
    let open: Vec<ApiMarket> = markets.into_iter().filter(ApiMarket::is_open).collect();
    let traded: Vec<ApiMarket> = open
        .iter()
        .filter(|m| m.volume_24h > 0)
        .cloned()
        .collect();
    let pool = if traded.is_empty() {
        info!("No markets with recent volume, falling back to all open markets");
        open
    } else {
        traded
    };

    // Group by event, preserving first-seen order for stable tie-breaks.
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ApiMarket>> = HashMap::new();
    for market in pool {
        let key = if market.event_ticker.is_empty() {
            market.ticker.clone()
        } else {
            market.event_ticker.clone()
        };
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(market);
    }

    let mut ranked: Vec<(String, i64)> = order
        .into_iter()
        .map(|key| {
            let volume = groups[&key].iter().map(|m| m.volume_24h).sum();
            (key, volume)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(top_events);

    ranked
        .into_iter()
        .flat_map(|(key, _)| groups.remove(&key).unwrap_or_default())
        .collect()
}
