//! Structured logging and periodic status reporting.

pub mod error;
pub mod logging;
pub mod status;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use status::StatusReporter;
