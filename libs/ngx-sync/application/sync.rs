//! One-shot synchronization pipeline.
//!
//! Strictly sequential: fetch, locate/extract, normalize, resolve, build
//! payloads, price batch, band batch (with per-asset fallback), FX
//! side-channel, freshness audit, report. The FX and audit phases are
//! failure-isolated tails; everything before them is the main path and any
//! error there fails the invocation.

use std::time::Duration;

use chrono::Utc;
use ethers::types::{Address, TxHash};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::domain::models::{BandPayload, FreshnessRecord, FxOutcome, PricePayload, SyncReport};
use crate::infrastructure::client::fx::FxClient;
use crate::infrastructure::client::listings::{table, ListingsClient, ScrapeError};
use crate::infrastructure::client::oracle::{OracleApi, OracleError};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Scrape failed: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("Oracle write failed: {0}")]
    Oracle(#[from] OracleError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// A quote that survived watchlist filtering and asset resolution.
struct ResolvedQuote {
    code: String,
    asset: Address,
    price: f64,
}

/// The sync pipeline over a concrete oracle connection.
pub struct SyncService<O> {
    config: SyncConfig,
    oracle: O,
    listings: ListingsClient,
    fx: FxClient,
}

impl<O: OracleApi> SyncService<O> {
    pub fn new(config: SyncConfig, oracle: O) -> Result<Self> {
        let listings = ListingsClient::new(
            config.listings.url.clone(),
            Duration::from_secs(config.listings.timeout_secs),
        )?;
        let fx = FxClient::new(
            config.fx.url.clone(),
            config.fx.quote_currency.clone(),
            config.fx.fallback_rate,
        );

        Ok(Self {
            config,
            oracle,
            listings,
            fx,
        })
    }

    /// Run one full invocation: fetch the page and push everything.
    pub async fn run_once(&self) -> Result<SyncReport> {
        let markup = self.listings.fetch_markup().await?;
        self.sync_from_markup(&markup).await
    }

    /// Everything after the fetch; split out so tests can drive the
    /// pipeline from fixture markup.
    pub async fn sync_from_markup(&self, markup: &str) -> Result<SyncReport> {
        let quotes = table::parse_quotes(markup)?;
        info!("Extracted {} watchlist quote(s)", quotes.len());

        let mut resolved: Vec<ResolvedQuote> = Vec::with_capacity(quotes.len());
        for quote in quotes {
            match self.config.asset_address(&quote.code) {
                Some(asset) => resolved.push(ResolvedQuote {
                    code: quote.code,
                    asset,
                    price: quote.price,
                }),
                None => warn!("No asset mapping for {}; dropping", quote.code),
            }
        }

        // One snapshot stamps every equity payload in this invocation.
        let timestamp = self.timestamp_snapshot().await;
        let width_bps = self.config.oracle.band_width_bps;

        let assets: Vec<Address> = resolved.iter().map(|r| r.asset).collect();
        let price_updates: Vec<PricePayload> = resolved
            .iter()
            .map(|r| PricePayload::from_price(r.price, timestamp))
            .collect();
        let band_updates: Vec<BandPayload> = resolved
            .iter()
            .map(|r| BandPayload::new(r.price, width_bps, timestamp))
            .collect();

        // Price phase: one batch write. Failure here fails the invocation.
        let price_tx = if assets.is_empty() {
            info!("No mapped quotes; skipping price batch");
            None
        } else {
            let tx = self
                .oracle
                .set_prices(assets.clone(), price_updates)
                .await?;
            info!("Price batch confirmed for {} asset(s)", assets.len());
            Some(tx)
        };
        let prices_updated = if price_tx.is_some() { assets.len() } else { 0 };

        // Band phase: batch first, per-asset fallback on failure.
        let (band_tx, bands_updated) = self.submit_bands(&assets, &band_updates).await;

        // Failure-isolated tails.
        let fx = self.run_fx_phase().await;
        let freshness = if self.config.oracle.audit_freshness {
            let audited: Vec<(String, Address)> = resolved
                .iter()
                .map(|r| (r.code.clone(), r.asset))
                .collect();
            self.run_audit_phase(&audited).await
        } else {
            Vec::new()
        };

        Ok(SyncReport {
            success: true,
            prices_updated,
            bands_updated,
            price_tx_hash: price_tx.map(|tx| format!("{:?}", tx)),
            band_tx_hash: band_tx.map(|tx| format!("{:?}", tx)),
            band_width_bps: width_bps,
            fx,
            freshness,
        })
    }

    /// Submit band updates: one batch call when the contract supports it,
    /// otherwise one confirmed write per asset, continuing through
    /// individual failures. No rollback: partial band coverage beats an
    /// all-or-nothing failure for downstream consumers.
    async fn submit_bands(
        &self,
        assets: &[Address],
        updates: &[BandPayload],
    ) -> (Option<TxHash>, usize) {
        if assets.is_empty() {
            return (None, 0);
        }

        if self.oracle.supports_batch_bands() {
            match self
                .oracle
                .set_bands(assets.to_vec(), updates.to_vec())
                .await
            {
                Ok(tx) => {
                    info!("Band batch confirmed for {} asset(s)", assets.len());
                    return (Some(tx), assets.len());
                }
                Err(e) => {
                    warn!("Band batch failed ({}); falling back to per-asset writes", e);
                }
            }
        }

        let mut last_tx = None;
        let mut updated = 0;
        for (asset, update) in assets.iter().zip(updates) {
            match self.oracle.set_band(*asset, update.clone()).await {
                Ok(tx) => {
                    last_tx = Some(tx);
                    updated += 1;
                }
                Err(e) => warn!("Band write failed for {:?}: {}", asset, e),
            }
        }
        info!("Per-asset band writes: {}/{} succeeded", updated, assets.len());

        (last_tx, updated)
    }

    /// FX side-channel. Every failure in here folds into the returned
    /// outcome; the equity results above are never touched.
    async fn run_fx_phase(&self) -> FxOutcome {
        match self.try_fx_update().await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("FX update failed: {}", e);
                FxOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn try_fx_update(&self) -> anyhow::Result<FxOutcome> {
        let asset = self.config.fx_asset()?;
        let (rate, used_fallback) = self.fx.fetch_rate().await;

        // Fresh snapshot for this phase; not reused from the equity batch.
        let timestamp = self.timestamp_snapshot().await;
        let price = PricePayload::from_price(rate, timestamp);
        let band = BandPayload::new(rate, self.config.oracle.band_width_bps, timestamp);

        let tx = self.oracle.set_price(asset, price).await?;
        self.oracle.set_band(asset, band).await?;

        info!(
            "FX rate USD/{} = {} pushed (fallback: {})",
            self.config.fx.quote_currency, rate, used_fallback
        );

        Ok(FxOutcome::Updated {
            tx_hash: format!("{:?}", tx),
            rate,
            used_fallback,
        })
    }

    /// Read-back staleness check. Diagnostic only: every failure is logged
    /// and swallowed.
    async fn run_audit_phase(&self, assets: &[(String, Address)]) -> Vec<FreshnessRecord> {
        let max_staleness = match self.oracle.max_staleness().await {
            Ok(value) => value,
            Err(e) => {
                warn!("Freshness audit skipped: {}", e);
                return Vec::new();
            }
        };

        let now = Utc::now().timestamp() as u64;
        let mut records = Vec::with_capacity(assets.len());

        for (code, asset) in assets {
            match self.oracle.get_band(*asset).await {
                Ok(band) => {
                    let is_fresh = now <= band.timestamp + max_staleness;
                    if !is_fresh {
                        warn!("{} band is stale (last update at {})", code, band.timestamp);
                    }
                    records.push(FreshnessRecord {
                        code: code.clone(),
                        asset: format!("{:?}", asset),
                        last_timestamp: band.timestamp,
                        is_fresh,
                    });
                }
                Err(e) => warn!("Freshness read failed for {}: {}", code, e),
            }
        }

        records
    }

    /// Staleness sweep over every configured asset, for read-only tooling.
    pub async fn audit_assets(&self) -> Vec<FreshnessRecord> {
        let assets: Vec<(String, Address)> = self
            .config
            .assets
            .keys()
            .filter_map(|code| {
                self.config
                    .asset_address(code)
                    .map(|asset| (code.clone(), asset))
            })
            .collect();
        self.run_audit_phase(&assets).await
    }

    /// Single timestamp snapshot: chain block time when reachable, local
    /// wall clock otherwise.
    async fn timestamp_snapshot(&self) -> u64 {
        match self.oracle.block_timestamp().await {
            Ok(ts) => ts,
            Err(e) => {
                warn!("Block timestamp unavailable ({}); using wall clock", e);
                Utc::now().timestamp() as u64
            }
        }
    }
}
