//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Bootstrap failed for {ticker}: {source}")]
    Bootstrap {
        ticker: String,
        #[source]
        source: kalshi_registry::RegistryError,
    },
}

pub type FeedResult<T> = Result<T, FeedError>;
