//! FeatureRow — one output row of the feature table.

use serde::{Deserialize, Serialize};

/// One observation of one market after derivation.
///
/// Field order is the column order of the persisted table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub condition_id: String,
    pub market_slug: String,
    pub token_id: Option<String>,
    pub end_period_ts: i64,
    pub volume: Option<f64>,
    pub open_interest: Option<f64>,
    pub price_open_dollars: Option<f64>,
    pub price_close_dollars: Option<f64>,
    pub yes_ask_open_dollars: Option<f64>,
    pub yes_ask_close_dollars: Option<f64>,
    pub yes_bid_open_dollars: Option<f64>,
    pub yes_bid_close_dollars: Option<f64>,
    /// Mid price in [0, 1].
    pub p_mkt: f64,
    pub spread: Option<f64>,
    /// 1 when the market resolved "yes".
    pub y_final: i32,
    pub market_end_time: i64,
    pub market_start_time: Option<i64>,
    pub market_category: Option<String>,
    pub market_volume_total: Option<f64>,
    pub market_liquidity: Option<f64>,
    /// Seconds from this bucket to resolution. Negative when the bucket ends
    /// after the market does.
    pub time_to_close_sec: i64,
    pub ret_1: Option<f64>,
    pub vol_7: Option<f64>,
    pub had_trade: i32,
}
