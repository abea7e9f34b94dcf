//! PMML Core — settled prediction-market feature dataset builder.
//!
//! This crate contains the whole pipeline:
//! - Domain types (markets, candlesticks, token streams)
//! - Provider trait with the Dome HTTP client and an in-memory fixture
//! - Market discovery and yes/no filtering
//! - Per-market candlestick acquisition with failure isolation
//! - Feature derivation (mid price, spread, returns, rolling volatility)
//! - Batched Parquet partitions and a JSON view catalog
//! - Pipeline driver tying it together

pub mod acquisition;
pub mod config;
pub mod data;
pub mod discovery;
pub mod domain;
pub mod features;
pub mod pipeline;
pub mod storage;

pub use config::{PipelineConfig, ProviderConfig};
pub use pipeline::{run_pipeline, PipelineError, RunSummary};
