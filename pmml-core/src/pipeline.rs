//! Pipeline driver — discovery, per-market acquisition and derivation,
//! batched persistence, view publication.
//!
//! Fatal conditions return a `PipelineError`; anything that goes wrong for a
//! single market is recorded as a `SkippedMarket` and the run continues.

use crate::acquisition::{acquire, SkipReason};
use crate::config::{AcquisitionConfig, ConfigError, PipelineConfig};
use crate::data::provider::{MarketDataProvider, ProviderError};
use crate::discovery::{discover_markets, DiscoveryError, DiscoveryStats};
use crate::domain::Market;
use crate::features::{derive_features, DerivedFeatures, MarketAttributes};
use crate::storage::{Catalog, PartitionInfo, PartitionWriter, PersistError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no eligible markets found ({pages} pages, {scanned} markets scanned)")]
    NoEligibleMarkets { pages: usize, scanned: usize },

    #[error("market discovery failed: {0}")]
    Discovery(#[source] ProviderError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<DiscoveryError> for PipelineError {
    fn from(e: DiscoveryError) -> Self {
        match e {
            DiscoveryError::NoEligibleMarkets { pages, scanned } => {
                PipelineError::NoEligibleMarkets { pages, scanned }
            }
            DiscoveryError::Provider { source, .. } => PipelineError::Discovery(source),
        }
    }
}

/// A market that produced no rows, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedMarket {
    pub market_slug: String,
    pub condition_id: String,
    pub reason: SkipReason,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub discovery: DiscoveryStats,
    pub markets_processed: usize,
    pub rows_written: usize,
    pub partitions: Vec<PartitionInfo>,
    pub skipped: Vec<SkippedMarket>,
    pub view_name: String,
    /// Rows visible through the view, including earlier runs' partitions.
    pub view_rows: usize,
    pub elapsed: Duration,
}

/// Run the full build against `provider`.
pub fn run_pipeline(
    provider: &dyn MarketDataProvider,
    config: &PipelineConfig,
) -> Result<RunSummary, PipelineError> {
    let started = Instant::now();
    config.validate()?;

    let mut catalog = Catalog::open(&config.output.catalog_path)?;
    info!(
        provider = provider.name(),
        catalog = %catalog.path().display(),
        out_dir = %config.output.out_dir.display(),
        "starting build"
    );

    let discovery = discover_markets(provider, &config.discovery)?;
    let total = discovery.markets.len();

    let mut writer = PartitionWriter::open(&config.output.out_dir, config.output.write_every)?;
    let mut skipped = Vec::new();
    let mut markets_processed = 0;
    let mut rows_written = 0;

    for (i, market) in discovery.markets.iter().enumerate() {
        let market_started = Instant::now();
        match process_market(provider, market, &config.acquisition) {
            Ok(derived) => {
                let rows = derived.rows.len();
                if derived.report.clamped() > 0 {
                    warn!(
                        slug = %market.market_slug,
                        above_one = derived.report.above_one,
                        below_zero = derived.report.below_zero,
                        "mid price outside [0, 1] was clamped"
                    );
                }
                writer.push(derived.rows, i + 1)?;
                markets_processed += 1;
                rows_written += rows;
                info!(
                    "[{}/{}] {}: {} rows in {:.1}s",
                    i + 1,
                    total,
                    market.market_slug,
                    rows,
                    market_started.elapsed().as_secs_f64()
                );
            }
            Err(reason) => {
                warn!(
                    "[{}/{}] skipping {} after {:.1}s: {}",
                    i + 1,
                    total,
                    market.market_slug,
                    market_started.elapsed().as_secs_f64(),
                    reason
                );
                skipped.push(SkippedMarket {
                    market_slug: market.market_slug.clone(),
                    condition_id: market.condition_id.clone(),
                    reason,
                });
            }
        }
    }

    let partitions = writer.finish()?;
    let view = catalog.publish_view(&config.output.view_name, &config.output.out_dir)?;
    let view_rows = view.total_rows;

    let summary = RunSummary {
        discovery: discovery.stats,
        markets_processed,
        rows_written,
        partitions,
        skipped,
        view_name: config.output.view_name.clone(),
        view_rows,
        elapsed: started.elapsed(),
    };
    info!(
        processed = summary.markets_processed,
        skipped = summary.skipped.len(),
        rows = summary.rows_written,
        partitions = summary.partitions.len(),
        elapsed_s = summary.elapsed.as_secs_f64(),
        "build complete"
    );
    Ok(summary)
}

/// Acquire and derive one market. Never fatal.
fn process_market(
    provider: &dyn MarketDataProvider,
    market: &Market,
    config: &AcquisitionConfig,
) -> Result<DerivedFeatures, SkipReason> {
    let series = acquire(provider, market, config)?;
    let attrs = MarketAttributes::from_market(market, series.window.end);
    let derived = derive_features(&attrs, &series.observations);
    if derived.rows.is_empty() {
        return Err(SkipReason::NoPricedRows);
    }
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixture::{candle, single_stream, yes_no_market, FixtureProvider};

    fn config(dir: &std::path::Path) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.output.out_dir = dir.join("silver");
        config.output.catalog_path = dir.join("catalog/pmml.json");
        config.output.write_every = 2;
        config
    }

    #[test]
    fn unpriced_market_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FixtureProvider::new(vec![
            yes_no_market("dark", "d", 1_000_000, true),
            yes_no_market("lit", "l", 1_000_000, true),
        ])
        .with_candles("d", single_stream("t", vec![candle(1, None, None, None, 0.0)]))
        .with_candles("l", single_stream("t", vec![candle(1, None, None, Some(0.5), 1.0)]));

        let summary = run_pipeline(&provider, &config(dir.path())).unwrap();
        assert_eq!(summary.markets_processed, 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].reason, SkipReason::NoPricedRows);
        assert_eq!(summary.rows_written, 1);
        assert_eq!(summary.view_rows, 1);
    }

    #[test]
    fn invalid_config_fails_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FixtureProvider::new(vec![yes_no_market("a", "a", 1, true)]);
        let mut cfg = config(dir.path());
        cfg.output.write_every = 0;
        assert!(matches!(
            run_pipeline(&provider, &cfg),
            Err(PipelineError::Config(_))
        ));
        assert!(provider.page_requests().is_empty());
    }

    #[test]
    fn discovery_errors_map_to_pipeline_errors() {
        let e: PipelineError = DiscoveryError::NoEligibleMarkets {
            pages: 2,
            scanned: 40,
        }
        .into();
        assert!(matches!(
            e,
            PipelineError::NoEligibleMarkets {
                pages: 2,
                scanned: 40
            }
        ));

        let e: PipelineError = DiscoveryError::Provider {
            offset: 25,
            source: ProviderError::NetworkUnreachable("dns".into()),
        }
        .into();
        assert!(matches!(
            e,
            PipelineError::Discovery(ProviderError::NetworkUnreachable(_))
        ));
    }
}
