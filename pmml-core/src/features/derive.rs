//! Feature derivation — raw observations of one market to feature rows.
//!
//! Pure and deterministic: the same market attributes and observations always
//! produce the same rows. Steps, in order:
//!
//! 1. Coerce the dollar quotes to numbers (unparseable → missing).
//! 2. Mid price: mean of bid/ask close when both exist, else last-trade close.
//!    Rows with neither are dropped.
//! 3. Spread: ask close − bid close, floored at zero.
//! 4. Clamp the mid price into [0, 1], counting out-of-range values.
//! 5. Stable sort by bucket end, then one-step returns and 7-row volatility.

use super::rolling::{first_difference, rolling_sample_std, VOL_WINDOW};
use super::row::FeatureRow;
use crate::domain::{Market, Observation, PriceQuote};

/// Market-level attributes broadcast onto every row.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketAttributes {
    pub condition_id: String,
    pub market_slug: String,
    pub end_time: i64,
    pub start_time: Option<i64>,
    pub category: Option<String>,
    pub volume_total: Option<f64>,
    pub liquidity: Option<f64>,
    pub y_final: i32,
}

impl MarketAttributes {
    /// Attributes of `market`, resolving at `end_time`.
    pub fn from_market(market: &Market, end_time: i64) -> Self {
        Self {
            condition_id: market.condition_id.clone(),
            market_slug: market.market_slug.clone(),
            end_time,
            start_time: market.start_time,
            category: market.category_label(),
            volume_total: market.volume_total(),
            liquidity: market.liquidity,
            y_final: i32::from(market.resolved_yes()),
        }
    }
}

/// Diagnostics collected during derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivationReport {
    pub input_rows: usize,
    /// Rows dropped because no mid price could be formed.
    pub dropped_no_price: usize,
    /// Mid prices above 1.0 before clamping.
    pub above_one: usize,
    /// Mid prices below 0.0 before clamping.
    pub below_zero: usize,
}

impl DerivationReport {
    pub fn clamped(&self) -> usize {
        self.above_one + self.below_zero
    }
}

#[derive(Debug, Clone)]
pub struct DerivedFeatures {
    pub rows: Vec<FeatureRow>,
    pub report: DerivationReport,
}

fn open(q: &Option<PriceQuote>) -> Option<f64> {
    q.as_ref()?.open_dollars.as_ref()?.to_f64()
}

fn close(q: &Option<PriceQuote>) -> Option<f64> {
    q.as_ref()?.close_dollars.as_ref()?.to_f64()
}

/// Mid price from bid/ask, falling back to the last-trade close when either
/// side is missing or the mean is not finite.
pub fn mid_price(bid: Option<f64>, ask: Option<f64>, last: Option<f64>) -> Option<f64> {
    let mid = match (bid, ask) {
        (Some(b), Some(a)) => Some((b + a) / 2.0),
        _ => None,
    };
    mid.filter(|m| m.is_finite())
        .or(last)
        .filter(|m| m.is_finite())
}

/// Ask minus bid, never negative.
pub fn spread(bid: Option<f64>, ask: Option<f64>) -> Option<f64> {
    Some((ask? - bid?).max(0.0))
}

/// Build the feature rows for one market.
pub fn derive_features(attrs: &MarketAttributes, observations: &[Observation]) -> DerivedFeatures {
    let mut report = DerivationReport {
        input_rows: observations.len(),
        ..Default::default()
    };
    let mut rows = Vec::with_capacity(observations.len());

    for obs in observations {
        let c = &obs.candle;
        let bid_close = close(&c.yes_bid);
        let ask_close = close(&c.yes_ask);
        let price_close = close(&c.price);

        let Some(raw_mid) = mid_price(bid_close, ask_close, price_close) else {
            report.dropped_no_price += 1;
            continue;
        };
        if raw_mid > 1.0 {
            report.above_one += 1;
        } else if raw_mid < 0.0 {
            report.below_zero += 1;
        }

        rows.push(FeatureRow {
            condition_id: attrs.condition_id.clone(),
            market_slug: attrs.market_slug.clone(),
            token_id: obs.token_id.clone(),
            end_period_ts: c.end_period_ts,
            volume: c.volume,
            open_interest: c.open_interest,
            price_open_dollars: open(&c.price),
            price_close_dollars: price_close,
            yes_ask_open_dollars: open(&c.yes_ask),
            yes_ask_close_dollars: ask_close,
            yes_bid_open_dollars: open(&c.yes_bid),
            yes_bid_close_dollars: bid_close,
            p_mkt: raw_mid.clamp(0.0, 1.0),
            spread: spread(bid_close, ask_close),
            y_final: attrs.y_final,
            market_end_time: attrs.end_time,
            market_start_time: attrs.start_time,
            market_category: attrs.category.clone(),
            market_volume_total: attrs.volume_total,
            market_liquidity: attrs.liquidity,
            time_to_close_sec: attrs.end_time - c.end_period_ts,
            ret_1: None,
            vol_7: None,
            had_trade: i32::from(c.volume.is_some_and(|v| v > 0.0)),
        });
    }

    // sort_by_key is stable: equal timestamps keep arrival order.
    rows.sort_by_key(|r| r.end_period_ts);

    let prices: Vec<f64> = rows.iter().map(|r| r.p_mkt).collect();
    let returns = first_difference(&prices);
    let vols = rolling_sample_std(&returns, VOL_WINDOW);
    for ((row, ret), vol) in rows.iter_mut().zip(returns).zip(vols) {
        row.ret_1 = ret;
        row.vol_7 = vol;
    }

    DerivedFeatures { rows, report }
}
