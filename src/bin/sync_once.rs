//! Run one synchronization pass and print the JSON report.
//!
//! Run with: cargo run --bin sync_once
//!
//! The trigger layer (scheduler, HTTP shim) consumes stdout: a
//! `SyncReport` on success, `{"success": false, "error": …}` on failure.

use anyhow::Result;
use ngx_oracle_sync::bin_common::{load_config_from_env, ConfigType};
use ngx_sync::{create_signer_provider, init_tracing, EthOracle, SyncConfig, SyncService};
use serde_json::json;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config_path = load_config_from_env(ConfigType::Sync);
    let config = SyncConfig::load(&config_path)?;
    config.log();

    let provider = create_signer_provider(
        &config.chain.rpc_url,
        &config.private_key,
        config.chain.chain_id,
    )?;
    let oracle = EthOracle::new(
        config.oracle_address()?,
        provider,
        config.oracle.batch_bands,
    );
    let service = SyncService::new(config, oracle)?;

    match service.run_once().await {
        Ok(report) => {
            info!(
                "Sync complete: {} price(s), {} band(s)",
                report.prices_updated, report.bands_updated
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!("Sync failed: {}", e);
            let failure = json!({ "success": false, "error": e.to_string() });
            println!("{}", serde_json::to_string_pretty(&failure)?);
            std::process::exit(1);
        }
    }
}
