//! Domain types for one sync invocation.
//!
//! Nothing here outlives a single run: quotes are built from scraped rows,
//! converted into fixed-point payloads, submitted, and dropped.

use serde::Serialize;

/// Fixed-point scale for on-chain prices: 1 unit = 1e-6 of the quote currency.
pub const PRICE_SCALE: u64 = 1_000_000;

/// The tickers this job tracks. Rows outside this set are skipped before
/// any mapping or parsing diagnostics fire.
pub const WATCHLIST: [&str; 12] = [
    "MTNN",
    "DANGCEM",
    "AIRTELAFRI",
    "BUACEMENT",
    "BUAFOODS",
    "SEPLAT",
    "GTCO",
    "ZENITHBANK",
    "UBA",
    "FBNH",
    "NESTLE",
    "WAPCO",
];

/// True if `code` is a watched ticker. Expects an already upper-cased code.
pub fn is_watched(code: &str) -> bool {
    WATCHLIST.contains(&code)
}

/// One equity row after extraction and normalization.
///
/// `day_change` and `ytd_change` are fractions (0.012 = +1.2%) and stay
/// `None` when the page shows a placeholder; they are informational only and
/// never submitted on-chain.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityQuote {
    pub code: String,
    pub price: f64,
    pub day_change: Option<f64>,
    pub ytd_change: Option<f64>,
}

/// Mark price update as the oracle contract stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricePayload {
    /// round(price × 1e6); unsigned by construction.
    pub price_fixed: u64,
    /// Set equal to the batch timestamp. An MVP simplification in place of a
    /// per-asset monotonic counter; the contract only requires non-decreasing
    /// values per source.
    pub sequence: u64,
    pub timestamp: u64,
    /// Upstream has no message id; zero-filled placeholder.
    pub source_id: [u8; 32],
}

impl PricePayload {
    pub fn from_price(price: f64, timestamp: u64) -> Self {
        Self {
            price_fixed: (price * PRICE_SCALE as f64).round() as u64,
            sequence: timestamp,
            timestamp,
            source_id: [0u8; 32],
        }
    }
}

/// Valid price band (midpoint ± width in basis points) published alongside
/// the mark price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandPayload {
    /// Same ×1e6 scale as [`PricePayload::price_fixed`].
    pub mid_fixed: u64,
    pub width_bps: u16,
    pub timestamp: u64,
}

impl BandPayload {
    pub fn new(mid: f64, width_bps: u16, timestamp: u64) -> Self {
        Self {
            mid_fixed: (mid * PRICE_SCALE as f64).round() as u64,
            width_bps,
            timestamp,
        }
    }
}

/// Outcome of the FX side-channel phase.
///
/// Kept as an explicit value rather than a swallowed error so the aggregator
/// can merge it without the phase ever touching the equity results.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FxOutcome {
    Updated {
        tx_hash: String,
        rate: f64,
        used_fallback: bool,
    },
    Failed {
        error: String,
    },
    Skipped,
}

/// Read-back staleness check for one updated asset. Diagnostic only.
#[derive(Debug, Clone, Serialize)]
pub struct FreshnessRecord {
    pub code: String,
    pub asset: String,
    pub last_timestamp: u64,
    pub is_fresh: bool,
}

/// Structured result handed back to the trigger layer.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub success: bool,
    pub prices_updated: usize,
    pub bands_updated: usize,
    pub price_tx_hash: Option<String>,
    pub band_tx_hash: Option<String>,
    pub band_width_bps: u16,
    pub fx: FxOutcome,
    pub freshness: Vec<FreshnessRecord>,
}
