//! Batch persistence — Parquet partitions and the view catalog.
//!
//! Layout: `{out_dir}/features_{NNNN}.parquet`, plus one JSON catalog file
//! holding named views over `{out_dir}/features_*.parquet`.
//!
//! - Partitions are write-once; writes go to `.tmp` and are renamed into place
//! - Sequence numbers continue after the highest partition already on disk
//! - Every partition is hashed (BLAKE3) when written

pub mod catalog;
pub mod frame;
pub mod partition;
pub mod schema;

pub use catalog::{Catalog, PartitionEntry, ViewDefinition};
pub use frame::{read_partition, rows_to_dataframe};
pub use partition::{PartitionInfo, PartitionWriter};
pub use schema::{FeatureSchema, SchemaError};

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("view '{0}' is not defined in the catalog")]
    UnknownView(String),

    #[error("view '{0}' has no partitions")]
    EmptyView(String),
}

impl PersistError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        PersistError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_row(slug: &str, ts: i64) -> crate::features::FeatureRow {
    crate::features::FeatureRow {
        condition_id: format!("0x{slug}"),
        market_slug: slug.to_string(),
        token_id: None,
        end_period_ts: ts,
        volume: Some(3.0),
        open_interest: None,
        price_open_dollars: None,
        price_close_dollars: Some(0.4),
        yes_ask_open_dollars: None,
        yes_ask_close_dollars: None,
        yes_bid_open_dollars: None,
        yes_bid_close_dollars: None,
        p_mkt: 0.4,
        spread: None,
        y_final: 1,
        market_end_time: ts + 100,
        market_start_time: None,
        market_category: Some("Crypto".into()),
        market_volume_total: None,
        market_liquidity: None,
        time_to_close_sec: 100,
        ret_1: None,
        vol_7: None,
        had_trade: 1,
    }
}
