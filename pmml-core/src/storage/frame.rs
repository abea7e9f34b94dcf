//! Feature rows ↔ Parquet.

use super::schema::FeatureSchema;
use super::PersistError;
use crate::features::FeatureRow;
use polars::prelude::*;
use std::fs;
use std::path::Path;

/// Convert feature rows to a DataFrame in schema column order.
pub fn rows_to_dataframe(rows: &[FeatureRow]) -> Result<DataFrame, PersistError> {
    let str_col = |f: fn(&FeatureRow) -> Option<String>| rows.iter().map(f).collect::<Vec<_>>();
    let f64_col = |f: fn(&FeatureRow) -> Option<f64>| rows.iter().map(f).collect::<Vec<_>>();
    let i64_col = |f: fn(&FeatureRow) -> Option<i64>| rows.iter().map(f).collect::<Vec<_>>();
    let i32_col = |f: fn(&FeatureRow) -> i32| rows.iter().map(f).collect::<Vec<_>>();

    DataFrame::new(vec![
        Column::new("condition_id".into(), str_col(|r| Some(r.condition_id.clone()))),
        Column::new("market_slug".into(), str_col(|r| Some(r.market_slug.clone()))),
        Column::new("token_id".into(), str_col(|r| r.token_id.clone())),
        Column::new("end_period_ts".into(), i64_col(|r| Some(r.end_period_ts))),
        Column::new("volume".into(), f64_col(|r| r.volume)),
        Column::new("open_interest".into(), f64_col(|r| r.open_interest)),
        Column::new("price_open_dollars".into(), f64_col(|r| r.price_open_dollars)),
        Column::new("price_close_dollars".into(), f64_col(|r| r.price_close_dollars)),
        Column::new("yes_ask_open_dollars".into(), f64_col(|r| r.yes_ask_open_dollars)),
        Column::new("yes_ask_close_dollars".into(), f64_col(|r| r.yes_ask_close_dollars)),
        Column::new("yes_bid_open_dollars".into(), f64_col(|r| r.yes_bid_open_dollars)),
        Column::new("yes_bid_close_dollars".into(), f64_col(|r| r.yes_bid_close_dollars)),
        Column::new("p_mkt".into(), f64_col(|r| Some(r.p_mkt))),
        Column::new("spread".into(), f64_col(|r| r.spread)),
        Column::new("y_final".into(), i32_col(|r| r.y_final)),
        Column::new("market_end_time".into(), i64_col(|r| Some(r.market_end_time))),
        Column::new("market_start_time".into(), i64_col(|r| r.market_start_time)),
        Column::new("market_category".into(), str_col(|r| r.market_category.clone())),
        Column::new("market_volume_total".into(), f64_col(|r| r.market_volume_total)),
        Column::new("market_liquidity".into(), f64_col(|r| r.market_liquidity)),
        Column::new("time_to_close_sec".into(), i64_col(|r| Some(r.time_to_close_sec))),
        Column::new("ret_1".into(), f64_col(|r| r.ret_1)),
        Column::new("vol_7".into(), f64_col(|r| r.vol_7)),
        Column::new("had_trade".into(), i32_col(|r| r.had_trade)),
    ])
    .map_err(|e| PersistError::Parquet(format!("dataframe creation: {e}")))
}

/// Write a DataFrame to `path` via a `.tmp` sibling and rename.
pub fn write_parquet_atomic(df: &mut DataFrame, path: &Path) -> Result<(), PersistError> {
    let tmp_path = path.with_extension("parquet.tmp");
    let file = fs::File::create(&tmp_path).map_err(|e| PersistError::io(&tmp_path, e))?;
    if let Err(e) = ParquetWriter::new(file).finish(df) {
        let _ = fs::remove_file(&tmp_path);
        return Err(PersistError::Parquet(format!(
            "write {}: {e}",
            tmp_path.display()
        )));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        PersistError::io(path, e)
    })
}

/// Load one partition and check it against the feature schema.
pub fn read_partition(path: &Path) -> Result<DataFrame, PersistError> {
    let file = fs::File::open(path).map_err(|e| PersistError::io(path, e))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| PersistError::Parquet(format!("read {}: {e}", path.display())))?;
    FeatureSchema::validate(&df)?;
    Ok(df)
}

/// BLAKE3 hex digest of a file's bytes.
pub fn file_hash(path: &Path) -> Result<String, PersistError> {
    let bytes = fs::read(path).map_err(|e| PersistError::io(path, e))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
