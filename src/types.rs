//! Common types for the relay cycle
//!
//! Chain roles, decoded bridge events, the outbound call shapes and the
//! per-invocation scan window.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RelayError;
use crate::redact::SecretKey;

/// Default trailing window, in blocks, re-scanned on every invocation
pub const DEFAULT_SCAN_WINDOW: u64 = 25;

/// Default gas limit for relayed calls; no on-chain estimation is made
pub const DEFAULT_GAS_LIMIT: u64 = 700_000;

/// Default surcharge applied to the sampled gas price, in percent
pub const DEFAULT_GAS_PRICE_BUMP_PERCENT: u32 = 20;

// ============================================================================
// Chain Roles
// ============================================================================

/// One side of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainRole {
    Source,
    Destination,
}

impl ChainRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainRole::Source => "source",
            ChainRole::Destination => "destination",
        }
    }

    /// The chain that receives the relayed transaction when this one is scanned
    pub fn counterpart(&self) -> ChainRole {
        match self {
            ChainRole::Source => ChainRole::Destination,
            ChainRole::Destination => ChainRole::Source,
        }
    }

    /// Name of the event watched on this chain
    pub fn watched_event(&self) -> &'static str {
        match self {
            ChainRole::Source => "Deposit",
            ChainRole::Destination => "Unwrap",
        }
    }

    /// Function called on the counterpart when this chain is scanned
    pub fn relayed_call(&self) -> TargetFunction {
        match self {
            ChainRole::Source => TargetFunction::Wrap,
            ChainRole::Destination => TargetFunction::Withdraw,
        }
    }
}

impl fmt::Display for ChainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChainRole {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(ChainRole::Source),
            "destination" => Ok(ChainRole::Destination),
            other => Err(RelayError::InvalidRole(other.to_string())),
        }
    }
}

// ============================================================================
// Signer
// ============================================================================

/// Wallet address and private key used to sign relayed transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerCredential {
    pub wallet_address: String,
    pub private_key: SecretKey,
}

// ============================================================================
// Scan Window
// ============================================================================

/// Inclusive block range scanned on one chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanWindow {
    pub role: ChainRole,
    pub from_block: u64,
    pub to_block: u64,
}

impl ScanWindow {
    /// Trailing window ending at `height`: `[max(0, height - window), height]`
    pub fn trailing(role: ChainRole, height: u64, window: u64) -> Self {
        Self {
            role,
            from_block: height.saturating_sub(window),
            to_block: height,
        }
    }

    /// Number of blocks covered, both ends inclusive
    pub fn block_count(&self) -> u64 {
        self.to_block - self.from_block + 1
    }
}

// ============================================================================
// Events
// ============================================================================

/// `Deposit(token, recipient, amount)` emitted by the source bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEvent {
    pub token: Address,
    pub recipient: Address,
    pub amount: U256,
}

/// `Unwrap(underlying_token, wrapped_token, from, to, amount)` emitted by the
/// destination bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnwrapEvent {
    pub underlying_token: Address,
    pub wrapped_token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

/// A decoded bridge event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayEvent {
    Deposit(DepositEvent),
    Unwrap(UnwrapEvent),
}

impl RelayEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RelayEvent::Deposit(_) => "Deposit",
            RelayEvent::Unwrap(_) => "Unwrap",
        }
    }
}

/// Where a scanned event was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPosition {
    pub block_number: u64,
    pub log_index: u64,
    pub tx_hash: B256,
}

/// Event together with its position in the scanned chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedEvent {
    pub event: RelayEvent,
    pub position: LogPosition,
}

/// Idempotency key of a scanned log: `(chain_id, tx_hash, log_index)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelayKey {
    pub chain_id: u64,
    pub tx_hash: B256,
    pub log_index: u64,
}

impl RelayKey {
    pub fn new(chain_id: u64, position: &LogPosition) -> Self {
        Self {
            chain_id,
            tx_hash: position.tx_hash,
            log_index: position.log_index,
        }
    }
}

impl fmt::Display for RelayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.chain_id, self.tx_hash, self.log_index)
    }
}

// ============================================================================
// Outbound Calls
// ============================================================================

/// Function invoked on the counterpart bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFunction {
    Wrap,
    Withdraw,
}

impl TargetFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetFunction::Wrap => "wrap",
            TargetFunction::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for TargetFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target function plus its `(token, recipient, amount)` argument tuple
///
/// Both `wrap(token, recipient, amount)` and
/// `withdraw(underlying_token, to, amount)` share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayCall {
    pub function: TargetFunction,
    pub token: Address,
    pub recipient: Address,
    pub amount: U256,
}

impl RelayCall {
    /// Arguments in ABI order
    pub fn abi_args(&self) -> Vec<DynSolValue> {
        vec![
            DynSolValue::Address(self.token),
            DynSolValue::Address(self.recipient),
            DynSolValue::Uint(self.amount, 256),
        ]
    }
}

/// Fully parameterised transaction for one relayed event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCall {
    pub call: RelayCall,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub chain_id: u64,
}
