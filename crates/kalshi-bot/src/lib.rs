//! Kalshi live arbitrage monitor.
//!
//! Main application that orchestrates all components:
//! - Market selection over the REST registry
//! - Batched bootstrap and stream subscription
//! - Update routing into the store
//! - Single-market and multi-way detection with throttled alerts
//! - Optional execution hook (no-op by default)

pub mod app;
pub mod config;
pub mod error;
pub mod execution;
pub mod selection;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use execution::{ExecutionHook, NoopExecutor};
