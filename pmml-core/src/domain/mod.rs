//! Domain types: provider markets and candlesticks.

pub mod candle;
pub mod lenient;
pub mod market;

pub use candle::{
    Candlestick, CandlestickResponse, Dollars, Observation, PriceQuote, StreamEntry, TokenMeta,
};
pub use market::{first_present, Ineligible, Market, Side};
