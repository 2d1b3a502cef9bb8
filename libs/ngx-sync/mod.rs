//! NGX equity prices to on-chain mark price oracle.
//!
//! One invocation scrapes the public listings page, normalizes the
//! watchlist quotes, and pushes price and band updates to the oracle
//! contract, with an FX side-channel update and an optional freshness
//! audit as failure-isolated tails.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod utils;

// Re-export commonly used items
pub use application::{SyncError, SyncService};
pub use config::{ConfigError, SyncConfig};
pub use domain::models::{
    BandPayload, EquityQuote, FreshnessRecord, FxOutcome, PricePayload, SyncReport, WATCHLIST,
};
pub use infrastructure::client::{
    create_signer_provider, EthOracle, FxClient, ListingsClient, OracleApi, OracleError,
};
pub use utils::init_tracing;
