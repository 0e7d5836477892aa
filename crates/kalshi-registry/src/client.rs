//! Authenticated HTTP client for the Kalshi trade API.
//!
//! All endpoints used here are GETs. Each request is signed with the same
//! header scheme as the WebSocket handshake. Requests are paced to a
//! minimum inter-request interval, and a 429 response is retried once
//! after honoring `Retry-After`.

use crate::error::{RegistryError, RegistryResult};
use crate::types::{ApiEvent, ApiMarket, ApiOrderbook};
use kalshi_ws::AuthSigner;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum spacing between consecutive requests.
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Page size cap imposed by the venue on list endpoints.
const MAX_PAGE_SIZE: usize = 200;

/// Client for market and event discovery.
pub struct RestClient {
    client: Client,
    /// Base URL including the API prefix, e.g.
    /// `https://api.elections.kalshi.com/trade-api/v2`.
    base_url: String,
    signer: AuthSigner,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, signer: AuthSigner) -> RegistryResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| RegistryError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signer,
            min_interval: DEFAULT_MIN_INTERVAL,
            last_request: Mutex::new(None),
        })
    }

    /// Fetch open markets, following the pagination cursor until `limit`
    /// markets are collected or the listing ends.
    pub async fn get_markets(&self, limit: usize, status: &str) -> RegistryResult<Vec<ApiMarket>> {
        let mut markets: Vec<ApiMarket> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page_size = (limit - markets.len()).min(MAX_PAGE_SIZE);
            let mut query = vec![
                ("limit", page_size.to_string()),
                ("status", status.to_string()),
            ];
            if let Some(ref c) = cursor {
                query.push(("cursor", c.clone()));
            }

            let body = self.get("/markets", &query).await?;
            let (page, next) = parse_page::<ApiMarket>(body, "markets")?;
            markets.extend(page);

            cursor = next;
            if cursor.is_none() || markets.len() >= limit {
                break;
            }
        }

        markets.truncate(limit);
        info!(count = markets.len(), status, "Fetched markets");
        Ok(markets)
    }

    /// Fetch one market. A 404 means the ticker is unknown and maps to
    /// `Ok(None)`.
    pub async fn get_market(&self, ticker: &str) -> RegistryResult<Option<ApiMarket>> {
        let path = format!("/markets/{ticker}");
        match self.get(&path, &[]).await {
            Ok(mut body) => {
                let market = serde_json::from_value(take_field(&mut body, "market"))?;
                Ok(Some(market))
            }
            Err(RegistryError::Status { status: 404, .. }) => {
                debug!(ticker, "Market not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch one market's book depth. A 404 maps to `Ok(None)`.
    pub async fn get_orderbook(&self, ticker: &str) -> RegistryResult<Option<ApiOrderbook>> {
        let path = format!("/markets/{ticker}/orderbook");
        match self.get(&path, &[]).await {
            Ok(mut body) => {
                let book = serde_json::from_value(take_field(&mut body, "orderbook"))?;
                Ok(Some(book))
            }
            Err(RegistryError::Status { status: 404, .. }) => {
                debug!(ticker, "Orderbook not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch up to `limit` events with their nested markets and flatten
    /// them, folding event metadata into each market.
    pub async fn get_events_with_markets(
        &self,
        limit: usize,
        status: &str,
    ) -> RegistryResult<Vec<ApiMarket>> {
        let mut events: Vec<ApiEvent> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page_size = (limit - events.len()).min(MAX_PAGE_SIZE);
            let mut query = vec![
                ("limit", page_size.to_string()),
                ("status", status.to_string()),
                ("with_nested_markets", "true".to_string()),
            ];
            if let Some(ref c) = cursor {
                query.push(("cursor", c.clone()));
            }

            let body = self.get("/events", &query).await?;
            let (page, next) = parse_page::<ApiEvent>(body, "events")?;
            events.extend(page);

            cursor = next;
            if cursor.is_none() || events.len() >= limit {
                break;
            }
        }

        events.truncate(limit);
        let markets: Vec<ApiMarket> = events.into_iter().flat_map(ApiEvent::into_markets).collect();
        info!(count = markets.len(), status, "Fetched event markets");
        Ok(markets)
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> RegistryResult<serde_json::Value> {
        self.pace().await;

        let url = format!("{}{}", self.base_url, path);
        let sign_path = url_path(&url)?;

        let response = self.send_signed(&url, &sign_path, query).await?;
        let response = if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let wait = retry_after(&response).unwrap_or(Duration::from_secs(1));
            warn!(path, wait_secs = wait.as_secs(), "Rate limited, retrying once");
            tokio::time::sleep(wait).await;
            self.send_signed(&url, &sign_path, query).await?
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| RegistryError::HttpClient(format!("Failed to parse response: {e}")))
    }

    async fn send_signed(
        &self,
        url: &str,
        sign_path: &str,
        query: &[(&str, String)],
    ) -> RegistryResult<reqwest::Response> {
        let mut request = self.client.get(url).query(query);
        for (name, value) in self.signer.headers("GET", sign_path)? {
            request = request.header(name, value);
        }
        request
            .send()
            .await
            .map_err(|e| RegistryError::HttpClient(format!("HTTP request failed: {e}")))
    }

    /// Sleep out the remainder of the minimum inter-request interval.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Path component of a URL, used as the signing input.
fn url_path(url: &str) -> RegistryResult<String> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| RegistryError::HttpClient(format!("Invalid URL {url}: {e}")))?;
    Ok(parsed.path().to_string())
}

/// Seconds from a `Retry-After` header, if present and numeric.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Pull a field out of a response object. Missing fields (or a non-object
/// body) become `Null`, which then fails deserialization cleanly.
fn take_field(body: &mut serde_json::Value, key: &str) -> serde_json::Value {
    body.get_mut(key)
        .map(serde_json::Value::take)
        .unwrap_or_default()
}

/// Split a list response into its items and pagination cursor.
fn parse_page<T: DeserializeOwned>(
    mut body: serde_json::Value,
    key: &str,
) -> RegistryResult<(Vec<T>, Option<String>)> {
    let items = serde_json::from_value(take_field(&mut body, key))?;
    let cursor = body["cursor"]
        .as_str()
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string());
    Ok((items, cursor))
}
