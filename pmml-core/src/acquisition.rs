//! Time series acquisition — fetch one market's candlestick history.
//!
//! Every failure here is local to the market: the caller logs the
//! `SkipReason` and moves on to the next market.

use crate::config::AcquisitionConfig;
use crate::data::provider::{CandlestickQuery, MarketDataProvider};
use crate::domain::{Market, Observation, StreamEntry};
use thiserror::Error;
use tracing::debug;

/// Why a market contributed no rows.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("market has no end_time")]
    MissingEndTime,

    #[error("provider timed out: {0}")]
    ProviderTimeout(String),

    #[error("candlestick request failed: {0}")]
    FetchFailed(String),

    #[error("no candlesticks returned")]
    NoObservations,

    #[error("no observation carried a usable price")]
    NoPricedRows,
}

/// Request window, unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    pub start: i64,
    pub end: i64,
}

impl LookbackWindow {
    /// The `lookback_secs` leading up to `end`.
    pub fn ending_at(end: i64, lookback_secs: i64) -> Self {
        Self {
            start: end - lookback_secs,
            end,
        }
    }
}

/// Observations of one market together with the window they cover.
#[derive(Debug, Clone)]
pub struct AcquiredSeries {
    pub window: LookbackWindow,
    pub observations: Vec<Observation>,
}

/// Fetch the candlestick history of `market` for every outcome token.
pub fn acquire(
    provider: &dyn MarketDataProvider,
    market: &Market,
    config: &AcquisitionConfig,
) -> Result<AcquiredSeries, SkipReason> {
    let end = market.end_time.ok_or(SkipReason::MissingEndTime)?;
    let window = LookbackWindow::ending_at(end, config.lookback_secs());

    let response = provider
        .candlesticks(&CandlestickQuery {
            condition_id: market.condition_id.clone(),
            start_time: window.start,
            end_time: window.end,
            interval_minutes: config.interval_minutes,
        })
        .map_err(|e| {
            if e.is_timeout() {
                SkipReason::ProviderTimeout(e.to_string())
            } else {
                SkipReason::FetchFailed(e.to_string())
            }
        })?;

    let streams = response.candlesticks.len();
    let observations = flatten_streams(response.candlesticks);
    debug!(
        slug = %market.market_slug,
        streams,
        observations = observations.len(),
        "candlesticks received"
    );

    if observations.is_empty() {
        return Err(SkipReason::NoObservations);
    }
    Ok(AcquiredSeries {
        window,
        observations,
    })
}

/// Flatten per-token streams into observations tagged with their token id.
///
/// A stream's trailing metadata element is removed and its id attached to the
/// stream's candles. Streams without a trailer yield observations with no
/// token id.
pub fn flatten_streams(streams: Vec<Vec<StreamEntry>>) -> Vec<Observation> {
    let mut out = Vec::new();
    for mut stream in streams {
        let token_id = match stream.last() {
            Some(StreamEntry::Token(_)) => match stream.pop() {
                Some(StreamEntry::Token(meta)) => Some(meta.token_id),
                _ => None,
            },
            _ => None,
        };
        out.extend(stream.into_iter().filter_map(|entry| match entry {
            StreamEntry::Candle(candle) => Some(Observation {
                token_id: token_id.clone(),
                candle,
            }),
            StreamEntry::Token(_) => None,
        }));
    }
    out
}
