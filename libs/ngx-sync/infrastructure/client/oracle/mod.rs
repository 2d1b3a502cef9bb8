//! Mark price oracle client.
//!
//! Wraps the on-chain oracle contract behind [`OracleApi`] so the
//! submission protocol can be exercised against a recording mock. Whether
//! the deployed contract accepts batched band writes is a capability
//! resolved once at construction, never probed mid-run.

use async_trait::async_trait;
use ethers::contract::abigen;
use ethers::prelude::*;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::models::{BandPayload, PricePayload};

abigen!(
    MarkOracle,
    r#"[
        struct PriceUpdate { uint64 price; uint64 sequence; uint64 timestamp; bytes32 sourceId; }
        struct BandUpdate { uint64 mid; uint16 widthBps; uint64 timestamp; }
        function setPrices(address[] calldata assets, PriceUpdate[] calldata updates) external
        function setBands(address[] calldata assets, BandUpdate[] calldata updates) external
        function setPrice(address asset, PriceUpdate calldata update) external
        function setBand(address asset, BandUpdate calldata update) external
        function getBand(address asset) external view returns (BandUpdate)
        function maxStaleness() external view returns (uint64)
    ]"#
);

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

pub type Result<T> = std::result::Result<T, OracleError>;

impl From<&PricePayload> for PriceUpdate {
    fn from(payload: &PricePayload) -> Self {
        Self {
            price: payload.price_fixed,
            sequence: payload.sequence,
            timestamp: payload.timestamp,
            source_id: payload.source_id,
        }
    }
}

impl From<&BandPayload> for BandUpdate {
    fn from(payload: &BandPayload) -> Self {
        Self {
            mid: payload.mid_fixed,
            width_bps: payload.width_bps,
            timestamp: payload.timestamp,
        }
    }
}

impl From<BandUpdate> for BandPayload {
    fn from(update: BandUpdate) -> Self {
        Self {
            mid_fixed: update.mid,
            width_bps: update.width_bps,
            timestamp: update.timestamp,
        }
    }
}

/// Read/write surface of the oracle contract, as the sync pipeline sees it.
#[async_trait]
pub trait OracleApi {
    /// Whether the deployed contract accepts `setBands` batches.
    fn supports_batch_bands(&self) -> bool;

    /// Timestamp of the latest chain block.
    async fn block_timestamp(&self) -> Result<u64>;

    async fn set_prices(&self, assets: Vec<Address>, updates: Vec<PricePayload>) -> Result<TxHash>;

    async fn set_bands(&self, assets: Vec<Address>, updates: Vec<BandPayload>) -> Result<TxHash>;

    async fn set_price(&self, asset: Address, update: PricePayload) -> Result<TxHash>;

    async fn set_band(&self, asset: Address, update: BandPayload) -> Result<TxHash>;

    async fn get_band(&self, asset: Address) -> Result<BandPayload>;

    async fn max_staleness(&self) -> Result<u64>;
}

/// Oracle client over a live chain connection.
pub struct EthOracle<M: Middleware> {
    contract: MarkOracle<M>,
    provider: Arc<M>,
    batch_bands: bool,
}

impl<M: Middleware + 'static> EthOracle<M> {
    pub fn new(address: Address, provider: Arc<M>, batch_bands: bool) -> Self {
        Self {
            contract: MarkOracle::new(address, provider.clone()),
            provider,
            batch_bands,
        }
    }

    /// Send a write and wait for its receipt.
    ///
    /// The wait is deliberately unbounded: writes share one signing
    /// identity, and each must be confirmed before the next is issued to
    /// keep submission order intact.
    async fn send_and_confirm(&self, call: ContractCall<M, ()>) -> Result<TxHash> {
        let pending_tx = call
            .send()
            .await
            .map_err(|e| OracleError::Contract(e.to_string()))?;

        let tx_hash = pending_tx.tx_hash();
        debug!("Transaction sent: {:?}", tx_hash);

        let receipt = pending_tx
            .await
            .map_err(|e| OracleError::TransactionFailed(e.to_string()))?
            .ok_or_else(|| OracleError::TransactionFailed("No receipt".to_string()))?;

        if receipt.status == Some(U64::from(1)) {
            info!("Transaction confirmed: {:?}", tx_hash);
            Ok(tx_hash)
        } else {
            Err(OracleError::TransactionFailed(
                "Transaction reverted".to_string(),
            ))
        }
    }
}

#[async_trait]
impl<M: Middleware + 'static> OracleApi for EthOracle<M> {
    fn supports_batch_bands(&self) -> bool {
        self.batch_bands
    }

    async fn block_timestamp(&self) -> Result<u64> {
        let block = self
            .provider
            .get_block(BlockNumber::Latest)
            .await
            .map_err(|e| OracleError::Provider(e.to_string()))?
            .ok_or_else(|| OracleError::Provider("Latest block unavailable".to_string()))?;
        Ok(block.timestamp.as_u64())
    }

    async fn set_prices(&self, assets: Vec<Address>, updates: Vec<PricePayload>) -> Result<TxHash> {
        let updates: Vec<PriceUpdate> = updates.iter().map(PriceUpdate::from).collect();
        self.send_and_confirm(self.contract.set_prices(assets, updates))
            .await
    }

    async fn set_bands(&self, assets: Vec<Address>, updates: Vec<BandPayload>) -> Result<TxHash> {
        let updates: Vec<BandUpdate> = updates.iter().map(BandUpdate::from).collect();
        self.send_and_confirm(self.contract.set_bands(assets, updates))
            .await
    }

    async fn set_price(&self, asset: Address, update: PricePayload) -> Result<TxHash> {
        self.send_and_confirm(self.contract.set_price(asset, PriceUpdate::from(&update)))
            .await
    }

    async fn set_band(&self, asset: Address, update: BandPayload) -> Result<TxHash> {
        self.send_and_confirm(self.contract.set_band(asset, BandUpdate::from(&update)))
            .await
    }

    async fn get_band(&self, asset: Address) -> Result<BandPayload> {
        self.contract
            .get_band(asset)
            .call()
            .await
            .map(|(mid, width_bps, timestamp)| BandPayload {
                mid_fixed: mid,
                width_bps,
                timestamp,
            })
            .map_err(|e| OracleError::Contract(e.to_string()))
    }

    async fn max_staleness(&self) -> Result<u64> {
        self.contract
            .max_staleness()
            .call()
            .await
            .map_err(|e| OracleError::Contract(e.to_string()))
    }
}

/// Build a signing provider for the configured chain.
pub fn create_signer_provider(
    rpc_url: &str,
    private_key: &str,
    chain_id: u64,
) -> Result<Arc<SignerMiddleware<Provider<Http>, LocalWallet>>> {
    let provider = Provider::<Http>::try_from(rpc_url)
        .map_err(|e| OracleError::Provider(e.to_string()))?;
    let wallet: LocalWallet = private_key
        .trim_start_matches("0x")
        .parse()
        .map_err(|e: WalletError| OracleError::Provider(e.to_string()))?;
    Ok(Arc::new(SignerMiddleware::new(
        provider,
        wallet.with_chain_id(chain_id),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_update_conversion() {
        let payload = PricePayload {
            price_fixed: 250_500_000,
            sequence: 1_700_000_000,
            timestamp: 1_700_000_000,
            source_id: [0u8; 32],
        };
        let update = PriceUpdate::from(&payload);
        assert_eq!(update.price, 250_500_000);
        assert_eq!(update.sequence, 1_700_000_000);
        assert_eq!(update.source_id, [0u8; 32]);
    }

    #[test]
    fn test_band_update_round_trip() {
        let payload = BandPayload {
            mid_fixed: 1_600_000_000,
            width_bps: 150,
            timestamp: 99,
        };
        let update = BandUpdate::from(&payload);
        assert_eq!(BandPayload::from(update), payload);
    }

    #[test]
    fn test_capability_flag_is_fixed_at_construction() {
        let provider = Arc::new(Provider::<Http>::try_from("http://localhost:8545").unwrap());
        let address = Address::zero();

        let batching = EthOracle::new(address, provider.clone(), true);
        let fallback_only = EthOracle::new(address, provider, false);

        assert!(batching.supports_batch_bands());
        assert!(!fallback_only.supports_batch_bands());
    }
}
