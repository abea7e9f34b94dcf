//! Feature derivation: price reconstruction, returns, rolling volatility and
//! time-to-resolution for one market's observations.

pub mod derive;
pub mod rolling;
pub mod row;

pub use derive::{derive_features, DerivationReport, DerivedFeatures, MarketAttributes};
pub use rolling::VOL_WINDOW;
pub use row::FeatureRow;
