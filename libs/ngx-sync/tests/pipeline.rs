//! End-to-end pipeline tests: fixture markup in, oracle writes out.

use async_trait::async_trait;
use ethers::types::{Address, TxHash};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use ngx_sync::config::{ChainConfig, FxConfig, ListingsConfig, OracleConfig};
use ngx_sync::infrastructure::client::oracle::Result as OracleResult;
use ngx_sync::{BandPayload, OracleApi, PricePayload, SyncConfig, SyncService};

const BLOCK_TIME: u64 = 1_700_000_000;

/// Records every write; all calls succeed.
#[derive(Default)]
struct RecordingOracle {
    price_batches: Mutex<Vec<(Vec<Address>, Vec<PricePayload>)>>,
    band_batches: Mutex<Vec<(Vec<Address>, Vec<BandPayload>)>>,
    single_writes: Mutex<Vec<Address>>,
}

/// Local newtype handle so the trait impl satisfies coherence: `OracleApi`
/// and `Arc` are both foreign, so the impl must live on a type defined here.
#[derive(Clone)]
struct SharedOracle(Arc<RecordingOracle>);

#[async_trait]
impl OracleApi for SharedOracle {
    fn supports_batch_bands(&self) -> bool {
        true
    }

    async fn block_timestamp(&self) -> OracleResult<u64> {
        Ok(BLOCK_TIME)
    }

    async fn set_prices(
        &self,
        assets: Vec<Address>,
        updates: Vec<PricePayload>,
    ) -> OracleResult<TxHash> {
        self.0.price_batches.lock().unwrap().push((assets, updates));
        Ok(TxHash::from_low_u64_be(1))
    }

    async fn set_bands(
        &self,
        assets: Vec<Address>,
        updates: Vec<BandPayload>,
    ) -> OracleResult<TxHash> {
        self.0.band_batches.lock().unwrap().push((assets, updates));
        Ok(TxHash::from_low_u64_be(2))
    }

    async fn set_price(&self, asset: Address, _update: PricePayload) -> OracleResult<TxHash> {
        self.0.single_writes.lock().unwrap().push(asset);
        Ok(TxHash::from_low_u64_be(3))
    }

    async fn set_band(&self, asset: Address, _update: BandPayload) -> OracleResult<TxHash> {
        self.0.single_writes.lock().unwrap().push(asset);
        Ok(TxHash::from_low_u64_be(4))
    }

    async fn get_band(&self, _asset: Address) -> OracleResult<BandPayload> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        Ok(BandPayload {
            mid_fixed: 1,
            width_bps: 150,
            timestamp: now,
        })
    }

    async fn max_staleness(&self) -> OracleResult<u64> {
        Ok(3600)
    }
}

const MTNN_ASSET: &str = "0x00000000000000000000000000000000000000aa";
const DANGCEM_ASSET: &str = "0x00000000000000000000000000000000000000bb";
const FX_ASSET: &str = "0x00000000000000000000000000000000000000f0";

fn config(assets: &[(&str, &str)]) -> SyncConfig {
    SyncConfig {
        listings: ListingsConfig {
            url: "https://example.com/listed-companies".to_string(),
            timeout_secs: 30,
        },
        chain: ChainConfig {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 1337,
            oracle_address: "0x0000000000000000000000000000000000000001".to_string(),
        },
        oracle: OracleConfig {
            band_width_bps: 150,
            batch_bands: true,
            audit_freshness: false,
        },
        assets: assets
            .iter()
            .map(|(code, addr)| (code.to_string(), addr.to_string()))
            .collect::<HashMap<String, String>>(),
        fx: FxConfig {
            // Unreachable: forces the fallback rate without network access.
            url: "http://127.0.0.1:9/latest/USD".to_string(),
            quote_currency: "NGN".to_string(),
            fallback_rate: 1600.0,
            asset: FX_ASSET.to_string(),
        },
        private_key: String::new(),
    }
}

fn page(rows: &str) -> String {
    format!(
        r#"<html><body>
        <table><tr><td>Nav</td><td>Bar</td></tr></table>
        <table>
          <tr><th>Company</th><th>Sector</th><th>Price</th><th>1D</th><th>YTD</th></tr>
          {rows}
        </table>
        </body></html>"#
    )
}

#[tokio::test]
async fn test_single_row_end_to_end() {
    let oracle = Arc::new(RecordingOracle::default());
    let service =
        SyncService::new(config(&[("MTNN", MTNN_ASSET)]), SharedOracle(oracle.clone())).unwrap();

    let markup = page(
        r#"<tr><td><a href="company?code=MTNN">MTN Nigeria</a></td><td>Telecom</td><td>250.50</td><td>+1.20%</td><td>-3.40%</td></tr>"#,
    );

    let report = service.sync_from_markup(&markup).await.unwrap();

    assert!(report.success);
    assert_eq!(report.prices_updated, 1);
    assert_eq!(report.bands_updated, 1);
    assert_eq!(report.band_width_bps, 150);

    let price_batches = oracle.price_batches.lock().unwrap();
    assert_eq!(price_batches.len(), 1);
    let (assets, updates) = &price_batches[0];
    assert_eq!(assets[0], MTNN_ASSET.parse::<Address>().unwrap());
    assert_eq!(updates[0].price_fixed, 250_500_000);
    assert_eq!(updates[0].timestamp, BLOCK_TIME);

    let band_batches = oracle.band_batches.lock().unwrap();
    assert_eq!(band_batches.len(), 1);
    assert_eq!(band_batches[0].1[0].mid_fixed, 250_500_000);
    assert_eq!(band_batches[0].1[0].width_bps, 150);

    // FX side-channel pushed one price and one band for the synthetic asset.
    let fx_asset = FX_ASSET.parse::<Address>().unwrap();
    let single_writes = oracle.single_writes.lock().unwrap();
    assert_eq!(
        single_writes.iter().filter(|a| **a == fx_asset).count(),
        2
    );
}

#[tokio::test]
async fn test_surviving_rows_produce_matching_payload_arrays() {
    let oracle = Arc::new(RecordingOracle::default());
    let service = SyncService::new(
        config(&[("MTNN", MTNN_ASSET), ("DANGCEM", DANGCEM_ASSET)]),
        SharedOracle(oracle.clone()),
    )
    .unwrap();

    // Four rows: two survive, one is off-watchlist, one has no price.
    let markup = page(concat!(
        r#"<tr><td><a href="?code=mtnn">MTN</a></td><td>T</td><td>250.50</td><td>-</td><td>-</td></tr>"#,
        r#"<tr><td><a href="?code=TSLA">Tesla</a></td><td>A</td><td>900.00</td><td>-</td><td>-</td></tr>"#,
        r#"<tr><td><a href="?code=DANGCEM">Dangote</a></td><td>C</td><td>1,234.50</td><td>-</td><td>-</td></tr>"#,
        r#"<tr><td><a href="?code=UBA">UBA</a></td><td>B</td><td>-</td><td>-</td><td>-</td></tr>"#,
    ));

    let report = service.sync_from_markup(&markup).await.unwrap();

    assert_eq!(report.prices_updated, 2);
    assert_eq!(report.bands_updated, 2);

    let price_batches = oracle.price_batches.lock().unwrap();
    let (assets, updates) = &price_batches[0];
    assert_eq!(assets.len(), 2);
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].price_fixed, 250_500_000);
    assert_eq!(updates[1].price_fixed, 1_234_500_000);

    // Every payload in the invocation shares the one snapshot.
    assert!(updates.iter().all(|u| u.timestamp == BLOCK_TIME));
    let band_batches = oracle.band_batches.lock().unwrap();
    assert!(band_batches[0].1.iter().all(|u| u.timestamp == BLOCK_TIME));

    // The excluded tickers never reach any batch.
    let mtnn = MTNN_ASSET.parse::<Address>().unwrap();
    let dangcem = DANGCEM_ASSET.parse::<Address>().unwrap();
    assert!(assets.iter().all(|a| *a == mtnn || *a == dangcem));
}

#[tokio::test]
async fn test_off_watchlist_rows_contribute_nothing() {
    let oracle = Arc::new(RecordingOracle::default());
    let service =
        SyncService::new(config(&[("MTNN", MTNN_ASSET)]), SharedOracle(oracle.clone())).unwrap();

    let markup = page(
        r#"<tr><td><a href="?code=TSLA">Tesla</a></td><td>A</td><td>900.00</td><td>+1%</td><td>+2%</td></tr>"#,
    );

    let report = service.sync_from_markup(&markup).await.unwrap();

    assert!(report.success);
    assert_eq!(report.prices_updated, 0);
    assert_eq!(report.bands_updated, 0);
    assert!(report.price_tx_hash.is_none());
    assert!(oracle.price_batches.lock().unwrap().is_empty());
    assert!(oracle.band_batches.lock().unwrap().is_empty());
}
