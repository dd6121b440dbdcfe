//! Runtime configuration
//!
//! Chain endpoints and relay tuning knobs are read from the environment
//! (after loading a `.env` file if present). The contract registry is a
//! separate JSON document, see [`crate::registry`].

use eyre::{eyre, Result, WrapErr};
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::types::{
    ChainRole, DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE_BUMP_PERCENT, DEFAULT_SCAN_WINDOW,
};

/// AVAX C-chain testnet (Fuji)
pub const DEFAULT_SOURCE_RPC_URL: &str = "https://api.avax-test.network/ext/bc/C/rpc";

/// BSC testnet
pub const DEFAULT_DESTINATION_RPC_URL: &str = "https://data-seed-prebsc-1-s1.binance.org:8545/";

/// Conventional file name of the contract registry
pub const DEFAULT_CONTRACT_INFO_PATH: &str = "contract_info.json";

/// Main configuration for the relayer
#[derive(Debug, Clone)]
pub struct Config {
    pub source: ChainEndpoint,
    pub destination: ChainEndpoint,
    pub relay: RelayConfig,
}

/// RPC endpoint of one chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEndpoint {
    pub rpc_url: String,
    /// Expected `eth_chainId`; checked at connect time when set
    pub expected_chain_id: Option<u64>,
}

/// Relay cycle configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub scan_window: u64,
    pub gas_limit: u64,
    pub gas_price_bump_percent: u32,
    pub rpc_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            scan_window: DEFAULT_SCAN_WINDOW,
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price_bump_percent: DEFAULT_GAS_PRICE_BUMP_PERCENT,
            rpc_timeout: Duration::from_secs(default_rpc_timeout_secs()),
        }
    }
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: ChainEndpoint {
                rpc_url: DEFAULT_SOURCE_RPC_URL.to_string(),
                expected_chain_id: None,
            },
            destination: ChainEndpoint {
                rpc_url: DEFAULT_DESTINATION_RPC_URL.to_string(),
                expected_chain_id: None,
            },
            relay: RelayConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    /// Loads .env file if present, then reads from environment
    pub fn load() -> Result<Self> {
        Self::load_from_file(".env")
    }

    /// Load from a specific .env file path
    pub fn load_from_file(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            dotenvy::from_filename(path)
                .wrap_err_with(|| format!("Failed to load .env file from {}", path))?;
            tracing::debug!(path, "Loaded .env file");
        }
        Self::load_from_env()
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Self> {
        let defaults = Config::default();

        let source = ChainEndpoint {
            rpc_url: env::var("SOURCE_RPC_URL").unwrap_or(defaults.source.rpc_url),
            expected_chain_id: optional_u64("SOURCE_CHAIN_ID")?,
        };
        let destination = ChainEndpoint {
            rpc_url: env::var("DESTINATION_RPC_URL").unwrap_or(defaults.destination.rpc_url),
            expected_chain_id: optional_u64("DESTINATION_CHAIN_ID")?,
        };

        let relay = RelayConfig {
            scan_window: optional_u64("SCAN_WINDOW_BLOCKS")?
                .unwrap_or(defaults.relay.scan_window),
            gas_limit: optional_u64("GAS_LIMIT")?.unwrap_or(defaults.relay.gas_limit),
            gas_price_bump_percent: match env::var("GAS_PRICE_BUMP_PERCENT") {
                Ok(v) => v
                    .trim()
                    .parse()
                    .wrap_err("GAS_PRICE_BUMP_PERCENT must be a valid u32")?,
                Err(_) => defaults.relay.gas_price_bump_percent,
            },
            rpc_timeout: optional_u64("RPC_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.relay.rpc_timeout),
        };

        let config = Config {
            source,
            destination,
            relay,
        };

        config.validate()?;
        Ok(config)
    }

    /// Endpoint configured for a chain role
    pub fn endpoint(&self, role: ChainRole) -> &ChainEndpoint {
        match role {
            ChainRole::Source => &self.source,
            ChainRole::Destination => &self.destination,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for role in [ChainRole::Source, ChainRole::Destination] {
            if self.endpoint(role).rpc_url.trim().is_empty() {
                return Err(eyre!("{} rpc_url cannot be empty", role));
            }
        }

        if self.relay.scan_window == 0 {
            return Err(eyre!("relay.scan_window must be at least 1 block"));
        }

        if self.relay.gas_limit == 0 {
            return Err(eyre!("relay.gas_limit cannot be zero"));
        }

        if self.relay.gas_price_bump_percent > 100 {
            return Err(eyre!("relay.gas_price_bump_percent cannot exceed 100"));
        }

        Ok(())
    }
}

fn optional_u64(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map(Some)
            .wrap_err_with(|| format!("{} must be a valid u64", name)),
        Err(_) => Ok(None),
    }
}
