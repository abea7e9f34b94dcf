//! Market discovery — pages the closed-market catalog and keeps resolved
//! yes/no markets until the target count is reached.

use crate::config::DiscoveryConfig;
use crate::data::provider::{MarketDataProvider, MarketQuery, MarketStatus, ProviderError};
use crate::domain::{Ineligible, Market};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("no suitable closed yes/no markets found ({pages} pages, {scanned} markets scanned)")]
    NoEligibleMarkets { pages: usize, scanned: usize },

    #[error("catalog request at offset {offset} failed: {source}")]
    Provider {
        offset: usize,
        #[source]
        source: ProviderError,
    },
}

/// Counters collected while paging the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub pages: usize,
    pub scanned: usize,
    pub eligible: usize,
    pub rejected_no_winner: usize,
    pub rejected_missing_labels: usize,
    pub rejected_not_yes_no: usize,
}

impl DiscoveryStats {
    fn record_rejection(&mut self, reason: Ineligible) {
        match reason {
            Ineligible::NoWinningSide => self.rejected_no_winner += 1,
            Ineligible::MissingOutcomeLabels => self.rejected_missing_labels += 1,
            Ineligible::NotYesNo => self.rejected_not_yes_no += 1,
        }
    }
}

/// Eligible markets in discovery order.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub markets: Vec<Market>,
    pub stats: DiscoveryStats,
}

/// Page through closed markets until `max_markets` eligible ones are found or
/// the catalog runs out.
///
/// Scanning stops mid-page as soon as the target is reached. Provider errors
/// abort discovery; finding nothing at all is also an error since there is
/// nothing to build.
pub fn discover_markets(
    provider: &dyn MarketDataProvider,
    config: &DiscoveryConfig,
) -> Result<Discovery, DiscoveryError> {
    let mut markets = Vec::new();
    let mut stats = DiscoveryStats::default();
    let mut offset = 0usize;

    'pages: while markets.len() < config.max_markets {
        debug!(offset, limit = config.page_limit, "fetching catalog page");
        let page = provider
            .list_markets(&MarketQuery {
                status: MarketStatus::Closed,
                limit: config.page_limit,
                offset,
            })
            .map_err(|source| DiscoveryError::Provider { offset, source })?;
        stats.pages += 1;

        if page.markets.is_empty() {
            info!(offset, "catalog exhausted");
            break;
        }

        for market in page.markets {
            stats.scanned += 1;
            match market.check_eligibility() {
                Ok(()) => {
                    markets.push(market);
                    if markets.len() >= config.max_markets {
                        break 'pages;
                    }
                }
                Err(reason) => stats.record_rejection(reason),
            }
        }

        info!(
            "found {}/{} suitable markets so far",
            markets.len(),
            config.max_markets
        );
        offset += config.page_limit;
    }

    stats.eligible = markets.len();

    if markets.is_empty() {
        return Err(DiscoveryError::NoEligibleMarkets {
            pages: stats.pages,
            scanned: stats.scanned,
        });
    }

    info!(
        eligible = stats.eligible,
        target = config.max_markets,
        pages = stats.pages,
        scanned = stats.scanned,
        no_winner = stats.rejected_no_winner,
        missing_labels = stats.rejected_missing_labels,
        not_yes_no = stats.rejected_not_yes_no,
        "discovery complete"
    );

    Ok(Discovery { markets, stats })
}
