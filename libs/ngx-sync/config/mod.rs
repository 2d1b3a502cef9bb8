//! Job configuration.
//!
//! Everything external the pipeline needs is read here, once, at entry:
//! YAML file for the deployment surface, `.env` for the signing key. Nothing
//! downstream reads the environment again.

use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarMissing(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Full configuration for one sync invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub listings: ListingsConfig,
    pub chain: ChainConfig,
    pub oracle: OracleConfig,
    /// Ticker code to on-chain asset address.
    pub assets: HashMap<String, String>,
    pub fx: FxConfig,

    /// Signing key from .env (never in YAML).
    #[serde(skip)]
    pub private_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsConfig {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub oracle_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Band width in basis points published with every mid price.
    #[serde(default = "default_band_width_bps")]
    pub band_width_bps: u16,
    /// Whether the deployed contract accepts batched band writes.
    #[serde(default = "default_batch_bands")]
    pub batch_bands: bool,
    /// Run the read-back staleness audit after submitting.
    #[serde(default)]
    pub audit_freshness: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxConfig {
    #[serde(default = "default_fx_url")]
    pub url: String,
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,
    /// Rate used when the endpoint is unreachable or incomplete.
    pub fallback_rate: f64,
    /// Synthetic asset the FX rate is published under.
    pub asset: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_band_width_bps() -> u16 {
    150
}

fn default_batch_bands() -> bool {
    true
}

fn default_fx_url() -> String {
    "https://open.er-api.com/v6/latest/USD".to_string()
}

fn default_quote_currency() -> String {
    "NGN".to_string()
}

impl SyncConfig {
    /// Load configuration from YAML file and .env.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::load_readonly(config_path)?;

        config.private_key = std::env::var("PRIVATE_KEY")
            .map_err(|_| ConfigError::EnvVarMissing("PRIVATE_KEY".to_string()))?;

        config.validate_key()?;

        Ok(config)
    }

    /// Load without requiring a signing key, for read-only tooling.
    pub fn load_readonly(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config: SyncConfig = serde_yaml::from_str(&yaml_content)?;

        dotenv::dotenv().ok(); // Don't fail if .env doesn't exist

        // Override RPC URL from environment if present
        if let Ok(rpc_url) = std::env::var("RPC_URL") {
            info!("Overriding RPC URL from environment variable");
            config.chain.rpc_url = rpc_url;
        }

        config.validate()?;

        Ok(config)
    }

    /// Parsed oracle contract address.
    pub fn oracle_address(&self) -> Result<Address> {
        parse_address("chain.oracle_address", &self.chain.oracle_address)
    }

    /// Parsed synthetic FX asset address.
    pub fn fx_asset(&self) -> Result<Address> {
        parse_address("fx.asset", &self.fx.asset)
    }

    /// On-chain asset for a ticker code, if one is configured.
    pub fn asset_address(&self, code: &str) -> Option<Address> {
        self.assets.get(code).and_then(|raw| raw.parse().ok())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.listings.url.is_empty() {
            return Err(ConfigError::ValidationError(
                "listings.url cannot be empty".to_string(),
            ));
        }

        if self.listings.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "listings.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.chain.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "chain.rpc_url cannot be empty".to_string(),
            ));
        }

        self.oracle_address()?;

        if self.oracle.band_width_bps == 0 || self.oracle.band_width_bps > 10_000 {
            return Err(ConfigError::ValidationError(
                "oracle.band_width_bps must be between 1 and 10000".to_string(),
            ));
        }

        if self.assets.is_empty() {
            return Err(ConfigError::ValidationError(
                "assets cannot be empty".to_string(),
            ));
        }

        for (code, raw) in &self.assets {
            parse_address(&format!("assets.{}", code), raw)?;
        }

        if self.fx.fallback_rate <= 0.0 {
            return Err(ConfigError::ValidationError(
                "fx.fallback_rate must be positive".to_string(),
            ));
        }

        self.fx_asset()?;

        Ok(())
    }

    fn validate_key(&self) -> Result<()> {
        // 0x followed by 64 hex characters
        if !self.private_key.starts_with("0x") || self.private_key.len() != 66 {
            return Err(ConfigError::ValidationError(
                "PRIVATE_KEY must be a valid hex string (0x followed by 64 hex characters)"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  Listings URL: {}", self.listings.url);
        info!("  Fetch timeout: {}s", self.listings.timeout_secs);
        info!("  Chain ID: {}", self.chain.chain_id);
        info!("  Oracle: {}", self.chain.oracle_address);
        info!("  Band width: {} bps", self.oracle.band_width_bps);
        info!("  Batched band writes: {}", self.oracle.batch_bands);
        info!("  Freshness audit: {}", self.oracle.audit_freshness);
        info!("  Mapped assets: {}", self.assets.len());
        info!(
            "  FX: USD/{} (fallback {})",
            self.fx.quote_currency, self.fx.fallback_rate
        );
    }
}

fn parse_address(field: &str, raw: &str) -> Result<Address> {
    raw.parse().map_err(|_| {
        ConfigError::ValidationError(format!("{} is not a valid address: {}", field, raw))
    })
}
