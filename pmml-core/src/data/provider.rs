//! Market-data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over the market-data source (the Dome
//! HTTP API, or an in-memory fixture) so the pipeline can be driven offline and
//! mocked in tests.

use crate::domain::{CandlestickResponse, Market};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for provider calls.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("provider timeout: {0}")]
    Timeout(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("provider error: {0}")]
    Other(String),
}

impl ProviderError {
    /// Whether this failure looks like a provider-side timeout.
    ///
    /// Besides the explicit variants, the provider reports gateway timeouts
    /// through its generic error channel, so the message text is inspected too.
    pub fn is_timeout(&self) -> bool {
        match self {
            ProviderError::Timeout(_) => true,
            ProviderError::Http { status: 504, .. } => true,
            other => mentions_timeout(&other.to_string()),
        }
    }
}

/// True when an error message mentions a 504 or a timeout.
pub fn mentions_timeout(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("504") || lower.contains("gateway timeout") || lower.contains("timeout")
}

/// Market lifecycle filter for catalog queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    Open,
    Closed,
}

impl MarketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketStatus::Open => "open",
            MarketStatus::Closed => "closed",
        }
    }
}

/// One page request against the market catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketQuery {
    pub status: MarketStatus,
    pub limit: usize,
    pub offset: usize,
}

/// One page of the market catalog. An empty page marks the end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketPage {
    #[serde(default)]
    pub markets: Vec<Market>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Pagination block echoed back by the provider (informational only).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub has_more: Option<bool>,
}

/// Candlestick history request for one market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandlestickQuery {
    pub condition_id: String,
    /// Window start, unix seconds.
    pub start_time: i64,
    /// Window end, unix seconds.
    pub end_time: i64,
    /// Bucket width in minutes (1440 = daily).
    pub interval_minutes: u32,
}

/// Trait for market-data providers.
///
/// Implementations own transport, authentication and request pacing; callers
/// only see typed pages and responses.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch one page of the market catalog.
    fn list_markets(&self, query: &MarketQuery) -> Result<MarketPage, ProviderError>;

    /// Fetch candlestick streams for every outcome token of one market.
    fn candlesticks(&self, query: &CandlestickQuery) -> Result<CandlestickResponse, ProviderError>;
}
