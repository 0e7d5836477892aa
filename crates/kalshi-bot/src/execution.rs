//! Execution hook.
//!
//! Detection and execution are deliberately decoupled: the monitor always
//! alerts, and only invokes the hook when `auto_execute` is on. The stock
//! hook places no orders.

use kalshi_detector::{MultiWayOpportunity, SingleMarketOpportunity};
use tracing::warn;

/// Receives opportunities that passed the throttle and profit floor.
pub trait ExecutionHook: Send + Sync {
    fn execute_single(&self, opportunity: &SingleMarketOpportunity);
    fn execute_event(&self, opportunity: &MultiWayOpportunity);
}

/// Default hook: logs that execution was requested and does nothing.
pub struct NoopExecutor;

impl ExecutionHook for NoopExecutor {
    fn execute_single(&self, opportunity: &SingleMarketOpportunity) {
        warn!(
            ticker = %opportunity.ticker,
            net_profit = %opportunity.net_profit,
            "Execution requested but no executor is wired, skipping"
        );
    }

    fn execute_event(&self, opportunity: &MultiWayOpportunity) {
        warn!(
            event = %opportunity.event_ticker,
            net_profit = %opportunity.net_profit,
            "Execution requested but no executor is wired, skipping"
        );
    }
}
