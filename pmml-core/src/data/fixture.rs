//! In-memory provider serving canned catalog pages and candlestick responses.
//!
//! Used for offline dry runs and as the test double for the pipeline. Markets
//! are paged exactly like the real catalog; candlestick responses (or
//! failures) are registered per condition id, and every request is recorded.

use super::provider::{
    CandlestickQuery, MarketDataProvider, MarketPage, MarketQuery, ProviderError,
};
use crate::domain::{
    Candlestick, CandlestickResponse, Market, PriceQuote, Side, StreamEntry, TokenMeta,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Canned response for one market's candlestick request.
#[derive(Debug, Clone)]
enum CandleReply {
    Ok(CandlestickResponse),
    Err(ProviderError),
}

/// Provider backed by in-memory data.
#[derive(Debug, Default)]
pub struct FixtureProvider {
    markets: Vec<Market>,
    candles: HashMap<String, CandleReply>,
    page_failures: HashMap<usize, ProviderError>,
    page_requests: Mutex<Vec<MarketQuery>>,
    candle_requests: Mutex<Vec<CandlestickQuery>>,
}

impl FixtureProvider {
    pub fn new(markets: Vec<Market>) -> Self {
        Self {
            markets,
            ..Default::default()
        }
    }

    /// Serve `response` for the market with this condition id.
    pub fn with_candles(mut self, condition_id: &str, response: CandlestickResponse) -> Self {
        self.candles
            .insert(condition_id.to_string(), CandleReply::Ok(response));
        self
    }

    /// Fail the candlestick request for this condition id.
    pub fn with_candle_failure(mut self, condition_id: &str, error: ProviderError) -> Self {
        self.candles
            .insert(condition_id.to_string(), CandleReply::Err(error));
        self
    }

    /// Fail the catalog request at this offset.
    pub fn with_page_failure(mut self, offset: usize, error: ProviderError) -> Self {
        self.page_failures.insert(offset, error);
        self
    }

    /// Catalog requests received so far, in order.
    pub fn page_requests(&self) -> Vec<MarketQuery> {
        self.page_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Candlestick requests received so far, in order.
    pub fn candle_requests(&self) -> Vec<CandlestickQuery> {
        self.candle_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl MarketDataProvider for FixtureProvider {
    fn name(&self) -> &str {
        "fixture"
    }

    fn list_markets(&self, query: &MarketQuery) -> Result<MarketPage, ProviderError> {
        self.page_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.clone());

        if let Some(err) = self.page_failures.get(&query.offset) {
            return Err(err.clone());
        }

        let markets = self
            .markets
            .iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();
        Ok(MarketPage {
            markets,
            pagination: None,
        })
    }

    fn candlesticks(&self, query: &CandlestickQuery) -> Result<CandlestickResponse, ProviderError> {
        self.candle_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.clone());

        match self.candles.get(&query.condition_id) {
            Some(CandleReply::Ok(resp)) => Ok(resp.clone()),
            Some(CandleReply::Err(err)) => Err(err.clone()),
            None => Ok(CandlestickResponse::default()),
        }
    }
}

/// A resolved yes/no market ending at `end_time`.
pub fn yes_no_market(slug: &str, condition_id: &str, end_time: i64, resolved_yes: bool) -> Market {
    Market {
        condition_id: condition_id.to_string(),
        market_slug: slug.to_string(),
        winning_side: Some(Side::labeled(if resolved_yes { "Yes" } else { "No" })),
        side_a: Some(Side::labeled("Yes")),
        side_b: Some(Side::labeled("No")),
        end_time: Some(end_time),
        ..Default::default()
    }
}

/// A candlestick with bid/ask closes, a last-trade close and a volume.
pub fn candle(
    end_period_ts: i64,
    bid: Option<f64>,
    ask: Option<f64>,
    price: Option<f64>,
    volume: f64,
) -> Candlestick {
    Candlestick {
        end_period_ts,
        volume: Some(volume),
        open_interest: None,
        price: price.map(PriceQuote::close_only),
        yes_ask: ask.map(PriceQuote::close_only),
        yes_bid: bid.map(PriceQuote::close_only),
    }
}

/// One token stream: the candles followed by the metadata trailer.
pub fn token_stream(token_id: &str, candles: Vec<Candlestick>) -> Vec<StreamEntry> {
    let mut stream: Vec<StreamEntry> = candles.into_iter().map(StreamEntry::Candle).collect();
    stream.push(StreamEntry::Token(TokenMeta {
        token_id: token_id.to_string(),
    }));
    stream
}

/// A response with a single token stream.
pub fn single_stream(token_id: &str, candles: Vec<Candlestick>) -> CandlestickResponse {
    CandlestickResponse {
        candlesticks: vec![token_stream(token_id, candles)],
    }
}
