pub mod models;

pub use models::{
    BandPayload, EquityQuote, FreshnessRecord, FxOutcome, PricePayload, SyncReport, PRICE_SCALE,
    WATCHLIST,
};
