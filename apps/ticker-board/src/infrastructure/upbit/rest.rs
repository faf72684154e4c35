//! Snapshot REST Client
//!
//! Fetches the complete ticker table for one quote currency:
//!
//! ```text
//! GET {base}/v1/ticker/all?quote_currencies=KRW
//! ```
//!
//! The endpoint answers with every market for the quote currency; rows
//! outside the configured market list are dropped before they reach the
//! board. No retries happen here; the board decides when to fetch again.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

use super::markets::krw_markets;
use super::messages::RawTicker;
use crate::application::ports::SnapshotSource;
pub use crate::application::ports::FetchError;
use crate::domain::ticker::TickerRecord;
use crate::infrastructure::metrics;

/// Configuration for the REST client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestClientConfig {
    /// Base URL, without trailing path (`https://api.upbit.com`).
    pub base_url: String,
    /// Quote currency filter.
    pub quote_currency: String,
    /// Markets kept from the response. Empty keeps every market.
    pub markets: Vec<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.upbit.com".to_string(),
            quote_currency: "KRW".to_string(),
            markets: krw_markets(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the ticker snapshot endpoint.
#[derive(Debug, Clone)]
pub struct UpbitRestClient {
    client: Client,
    url: String,
    quote_currency: String,
    markets: HashSet<String>,
}

impl UpbitRestClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the HTTP client cannot be built.
    pub fn new(config: &RestClientConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            url: format!("{}/v1/ticker/all", config.base_url.trim_end_matches('/')),
            quote_currency: config.quote_currency.clone(),
            markets: config.markets.iter().cloned().collect(),
        })
    }

    /// Endpoint URL, without query.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<TickerRecord>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("quote_currencies", self.quote_currency.as_str())])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                body = %body.chars().take(200).collect::<String>(),
                "Snapshot request rejected"
            );
            return Err(FetchError::from_status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let raw: Vec<RawTicker> =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::InvalidBody(e.to_string()))?;

        let total = raw.len();
        let records: Vec<TickerRecord> = raw
            .into_iter()
            .map(TickerRecord::from)
            .filter(|r| self.markets.is_empty() || self.markets.contains(&r.market))
            .collect();
        if records.len() < total {
            tracing::debug!(
                kept = records.len(),
                dropped = total - records.len(),
                "Snapshot rows outside the market list dropped"
            );
        }
        Ok(records)
    }
}

#[async_trait]
impl SnapshotSource for UpbitRestClient {
    async fn fetch_all(&self) -> Result<Vec<TickerRecord>, FetchError> {
        let started = Instant::now();
        let result = self.fetch().await;
        metrics::record_snapshot_fetch(result.as_ref().err(), started.elapsed());

        match &result {
            Ok(records) => tracing::debug!(count = records.len(), "Snapshot fetched"),
            Err(e) => tracing::warn!(error = %e, "Snapshot fetch failed"),
        }
        result
    }
}
