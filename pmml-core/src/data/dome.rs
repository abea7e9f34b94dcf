//! Dome API provider (Polymarket namespace).
//!
//! Two endpoints are used:
//! - `GET /polymarket/markets?status=closed&limit=L&offset=O` — catalog pages
//! - `GET /polymarket/candlesticks/{condition_id}?start_time=S&end_time=E&interval=I`
//!
//! Requests are authenticated with a bearer token, paced by a `RateLimiter`,
//! and never retried: a failed candlestick call costs the pipeline one market,
//! a failed catalog call ends the run.

use super::provider::{
    CandlestickQuery, MarketDataProvider, MarketPage, MarketQuery, ProviderError,
};
use super::rate_limit::RateLimiter;
use crate::config::ProviderConfig;
use crate::domain::CandlestickResponse;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Longest error body kept in an `Http` error message.
const MAX_ERROR_BODY: usize = 300;

/// Dome API client.
pub struct DomeClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    limiter: RateLimiter,
}

impl DomeClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pmml/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            limiter: RateLimiter::new(config.min_request_interval),
        })
    }

    fn markets_url(&self) -> String {
        format!("{}/polymarket/markets", self.base_url)
    }

    fn candlesticks_url(&self, condition_id: &str) -> String {
        format!("{}/polymarket/candlesticks/{condition_id}", self.base_url)
    }

    /// Issue one paced GET and return the raw body of a 2xx response.
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String, ProviderError> {
        let waited = self.limiter.acquire();
        debug!(url, ?query, waited_ms = waited.as_millis() as u64, "provider request");

        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .map_err(classify_transport_error)?;

        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ProviderError::AuthenticationRequired(format!(
                "HTTP {status} from {url}; check DOME_API_KEY"
            )));
        }

        if status == reqwest::StatusCode::GATEWAY_TIMEOUT {
            return Err(ProviderError::Timeout(format!("HTTP 504 Gateway Timeout from {url}")));
        }

        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message: truncate(&body, MAX_ERROR_BODY),
            });
        }

        resp.text().map_err(classify_transport_error)
    }
}

impl MarketDataProvider for DomeClient {
    fn name(&self) -> &str {
        "dome"
    }

    fn list_markets(&self, query: &MarketQuery) -> Result<MarketPage, ProviderError> {
        let body = self.get(
            &self.markets_url(),
            &[
                ("status", query.status.as_str().to_string()),
                ("limit", query.limit.to_string()),
                ("offset", query.offset.to_string()),
            ],
        )?;
        decode_market_page(&body)
    }

    fn candlesticks(&self, query: &CandlestickQuery) -> Result<CandlestickResponse, ProviderError> {
        let body = self.get(
            &self.candlesticks_url(&query.condition_id),
            &[
                ("start_time", query.start_time.to_string()),
                ("end_time", query.end_time.to_string()),
                ("interval", query.interval_minutes.to_string()),
            ],
        )?;
        decode_candlesticks(&body)
    }
}

/// Decode a catalog page body.
pub fn decode_market_page(body: &str) -> Result<MarketPage, ProviderError> {
    decode(body, "market page")
}

/// Decode a candlestick response body.
pub fn decode_candlesticks(body: &str) -> Result<CandlestickResponse, ProviderError> {
    decode(body, "candlestick response")
}

fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| {
        ProviderError::ResponseFormatChanged(format!("failed to parse {what}: {e}"))
    })
}

fn classify_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else if e.is_connect() {
        ProviderError::NetworkUnreachable(e.to_string())
    } else if e.is_decode() || e.is_body() {
        ProviderError::ResponseFormatChanged(e.to_string())
    } else {
        ProviderError::Other(e.to_string())
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
