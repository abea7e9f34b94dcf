//! Candlesticks — daily price/volume samples per outcome token.
//!
//! The provider returns one stream per outcome token. Each stream is a JSON
//! array of candlesticks whose trailing element is a token metadata object
//! (`{"token_id": "..."}`) rather than a sample:
//!
//! ```text
//! {"candlesticks": [
//!     [ {candle}, {candle}, ..., {"token_id": "123"} ],
//!     [ {candle}, {candle}, ..., {"token_id": "456"} ]
//! ]}
//! ```

use super::lenient;
use serde::{Deserialize, Serialize};

/// A dollar price as received: a number, a numeric string, or something else.
///
/// Coercion to `f64` happens during feature derivation, not at decode time, so
/// a single malformed quote never fails the whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dollars {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Dollars {
    /// Numeric value, or `None` when unparseable, NaN or infinite.
    pub fn to_f64(&self) -> Option<f64> {
        let value = match self {
            Dollars::Number(x) => Some(*x),
            Dollars::Text(s) => s.trim().parse::<f64>().ok(),
            Dollars::Other(_) => None,
        };
        value.filter(|x| x.is_finite())
    }
}

impl From<f64> for Dollars {
    fn from(x: f64) -> Self {
        Dollars::Number(x)
    }
}

/// Open/close quote pair for one price series (`price`, `yes_ask`, `yes_bid`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    #[serde(default)]
    pub open_dollars: Option<Dollars>,
    #[serde(default)]
    pub close_dollars: Option<Dollars>,
}

impl PriceQuote {
    pub fn new(open: f64, close: f64) -> Self {
        Self {
            open_dollars: Some(open.into()),
            close_dollars: Some(close.into()),
        }
    }

    /// Quote with only a close value.
    pub fn close_only(close: f64) -> Self {
        Self {
            open_dollars: None,
            close_dollars: Some(close.into()),
        }
    }
}

/// One time bucket for one outcome token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candlestick {
    /// Bucket end, unix seconds.
    pub end_period_ts: i64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub open_interest: Option<f64>,
    #[serde(default)]
    pub price: Option<PriceQuote>,
    #[serde(default)]
    pub yes_ask: Option<PriceQuote>,
    #[serde(default)]
    pub yes_bid: Option<PriceQuote>,
}

/// Trailing metadata element of a token stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub token_id: String,
}

/// One element of a token stream: a sample, or the metadata trailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEntry {
    Candle(Candlestick),
    Token(TokenMeta),
}

/// Response of the candlestick endpoint: one stream per outcome token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandlestickResponse {
    #[serde(default)]
    pub candlesticks: Vec<Vec<StreamEntry>>,
}

/// A candlestick tagged with the token it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub token_id: Option<String>,
    pub candle: Candlestick,
}
