//! Market-data access: provider trait, Dome HTTP client, pacing, fixtures.

pub mod dome;
pub mod fixture;
pub mod provider;
pub mod rate_limit;

pub use dome::DomeClient;
pub use fixture::FixtureProvider;
pub use provider::{
    CandlestickQuery, MarketDataProvider, MarketPage, MarketQuery, MarketStatus, ProviderError,
};
pub use rate_limit::RateLimiter;
