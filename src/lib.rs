//! Bridge Relayer: event relay between two EVM chains
//!
//! Watches the bridge contract on one chain and replays each bridge event as a
//! transaction on the other:
//!
//! - **Source** `Deposit(token, recipient, amount)` -> `wrap(token, recipient, amount)` on destination
//! - **Destination** `Unwrap(underlying, wrapped, from, to, amount)` -> `withdraw(underlying, to, amount)` on source
//!
//! Each invocation scans a trailing block window of one chain, fetches the
//! signer's pending nonce and the gas price of the other chain once, then
//! signs and broadcasts one transaction per event in log order.
//!
//! ## Modules
//!
//! - [`registry`] - contract addresses, ABIs and signer credential
//! - [`chain`] - RPC connections ([`ChainClient`], [`Connector`])
//! - [`scanner`] - trailing-window log scan and event decoding
//! - [`mapper`] - event to outbound call mapping
//! - [`submitter`] - nonce/gas sampling, local signing and broadcast
//! - [`checkpoint`] - optional idempotency seam keyed by `(chain_id, tx_hash, log_index)`
//! - [`orchestrator`] - one relay cycle end to end

pub mod chain;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod mapper;
pub mod orchestrator;
pub mod redact;
pub mod registry;
pub mod scanner;
pub mod submitter;
pub mod types;

pub use chain::{ChainClient, Connector, ContractHandle, LogQuery, RpcConnection, RpcConnector};
pub use checkpoint::{BoundedRelayCache, NoCheckpoint, RelayCheckpoint};
pub use config::{ChainEndpoint, Config, RelayConfig};
pub use error::{ErrorCategory, RelayError};
pub use mapper::map_event;
pub use orchestrator::{FailedRelay, RelayOrchestrator, RelayReport, SubmittedRelay};
pub use registry::{ContractEntry, ContractRegistry};
pub use scanner::EventWindowScanner;
pub use submitter::{bumped_gas_price, RelaySigner, TransactionSubmitter};
pub use types::{
    ChainRole, DepositEvent, OutboundCall, RelayCall, RelayEvent, RelayKey, ScanWindow,
    ScannedEvent, SignerCredential, TargetFunction, UnwrapEvent,
};
