//! Read-only staleness sweep over every configured asset.
//!
//! Run with: cargo run --bin audit_freshness
//!
//! Needs no signing key: bands are read back over a plain provider and the
//! result is printed as JSON.

use std::sync::Arc;

use anyhow::Result;
use ethers::providers::{Http, Provider};
use ngx_oracle_sync::bin_common::{load_config_from_env, ConfigType};
use ngx_sync::{init_tracing, EthOracle, SyncConfig, SyncService};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config_path = load_config_from_env(ConfigType::Sync);
    let config = SyncConfig::load_readonly(&config_path)?;

    let provider = Arc::new(Provider::<Http>::try_from(config.chain.rpc_url.as_str())?);
    let oracle = EthOracle::new(
        config.oracle_address()?,
        provider,
        config.oracle.batch_bands,
    );
    let service = SyncService::new(config, oracle)?;

    let records = service.audit_assets().await;
    info!("Audited {} asset(s)", records.len());
    println!("{}", serde_json::to_string_pretty(&records)?);

    Ok(())
}
