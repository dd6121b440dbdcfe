//! Chain connections
//!
//! [`ChainClient`] is the RPC surface the relay cycle needs from one chain.
//! [`RpcConnection`] implements it over an alloy HTTP provider; tests plug
//! in an in-memory chain instead.
//!
//! Only `eth_blockNumber`, `eth_getTransactionCount`, `eth_gasPrice`,
//! `eth_chainId`, `eth_getLogs` and `eth_sendRawTransaction` are used. Full
//! block headers are never decoded, so proof-of-authority chains with long
//! `extraData` fields (BSC, AVAX testnets) need no header rewriting.

use alloy::json_abi::{Event, Function, JsonAbi};
use alloy::primitives::{Address, B256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::{Filter, Log};
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::{ChainEndpoint, Config};
use crate::error::RelayError;
use crate::types::ChainRole;

/// `eth_getLogs` query for one event of one contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogQuery {
    pub address: Address,
    pub event_signature: B256,
    pub from_block: u64,
    pub to_block: u64,
}

impl From<&LogQuery> for Filter {
    fn from(query: &LogQuery) -> Self {
        Filter::new()
            .address(query.address)
            .event_signature(query.event_signature)
            .from_block(query.from_block)
            .to_block(query.to_block)
    }
}

/// RPC operations against a single chain
///
/// Every call is one network round-trip with no retry; a transport failure
/// is returned to the caller as-is.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Role this connection was opened for
    fn role(&self) -> ChainRole;

    /// Chain id reported by the endpoint at connect time
    fn chain_id(&self) -> u64;

    async fn block_number(&self) -> Result<u64, RelayError>;

    /// Transaction count of `address` including pending transactions
    async fn pending_nonce(&self, address: Address) -> Result<u64, RelayError>;

    async fn gas_price(&self) -> Result<u128, RelayError>;

    async fn logs(&self, query: &LogQuery) -> Result<Vec<Log>, RelayError>;

    /// Broadcast a signed, EIP-2718 encoded transaction
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RelayError>;

    /// Bind a contract deployed on this chain
    fn bind_contract(&self, address: Address, abi: JsonAbi) -> ContractHandle {
        ContractHandle::new(self.role(), address, abi)
    }
}

#[async_trait]
impl<C: ChainClient + ?Sized> ChainClient for Arc<C> {
    fn role(&self) -> ChainRole {
        (**self).role()
    }

    fn chain_id(&self) -> u64 {
        (**self).chain_id()
    }

    async fn block_number(&self) -> Result<u64, RelayError> {
        (**self).block_number().await
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, RelayError> {
        (**self).pending_nonce(address).await
    }

    async fn gas_price(&self) -> Result<u128, RelayError> {
        (**self).gas_price().await
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<Log>, RelayError> {
        (**self).logs(query).await
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RelayError> {
        (**self).send_raw_transaction(raw).await
    }
}

/// A bridge contract bound to an address and ABI on one chain
#[derive(Debug, Clone)]
pub struct ContractHandle {
    role: ChainRole,
    address: Address,
    abi: JsonAbi,
}

impl ContractHandle {
    pub fn new(role: ChainRole, address: Address, abi: JsonAbi) -> Self {
        Self { role, address, abi }
    }

    pub fn role(&self) -> ChainRole {
        self.role
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Event by name; overloaded events are rejected as ambiguous
    pub fn event(&self, name: &str) -> Result<&Event, RelayError> {
        match self.abi.event(name).map(Vec::as_slice) {
            Some([event]) => Ok(event),
            Some(_) => Err(RelayError::scan(
                self.role,
                format!("event '{}' is overloaded in the {} ABI", name, self.role),
            )),
            None => Err(RelayError::scan(
                self.role,
                format!("event '{}' not found in the {} ABI", name, self.role),
            )),
        }
    }

    /// Function by name; overloaded functions are rejected as ambiguous
    pub fn function(&self, name: &str) -> Option<&Function> {
        match self.abi.function(name).map(Vec::as_slice) {
            Some([function]) => Some(function),
            _ => None,
        }
    }
}

/// Opens chain connections for the orchestrator
#[async_trait]
pub trait Connector: Send + Sync {
    type Client: ChainClient;

    async fn connect(&self, role: ChainRole) -> Result<Self::Client, RelayError>;
}

/// Connector backed by the runtime [`Config`] endpoints
#[derive(Debug, Clone)]
pub struct RpcConnector {
    config: Config,
}

impl RpcConnector {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for RpcConnector {
    type Client = RpcConnection;

    async fn connect(&self, role: ChainRole) -> Result<RpcConnection, RelayError> {
        RpcConnection::connect(role, self.config.endpoint(role), &self.config).await
    }
}

/// Alloy HTTP connection to one chain
pub struct RpcConnection {
    role: ChainRole,
    chain_id: u64,
    provider: RootProvider<Http<Client>>,
}

impl RpcConnection {
    /// Open the endpoint and verify its chain id
    pub async fn connect(
        role: ChainRole,
        endpoint: &ChainEndpoint,
        config: &Config,
    ) -> Result<Self, RelayError> {
        let url = endpoint
            .rpc_url
            .trim()
            .parse::<reqwest::Url>()
            .map_err(|e| RelayError::connection(role, format!("Invalid RPC URL: {}", e)))?;

        let http_client = Client::builder()
            .timeout(config.relay.rpc_timeout)
            .build()
            .map_err(|e| RelayError::connection(role, format!("Failed to build HTTP client: {}", e)))?;

        let transport = Http::with_client(http_client, url);
        let provider = ProviderBuilder::new().on_client(RpcClient::new(transport, false));

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| RelayError::connection(role, format!("Failed to get chain id: {}", e)))?;

        if let Some(expected) = endpoint.expected_chain_id {
            if expected != chain_id {
                return Err(RelayError::ChainIdMismatch {
                    role,
                    expected,
                    actual: chain_id,
                });
            }
        }

        info!(
            role = %role,
            rpc_url = %endpoint.rpc_url,
            chain_id,
            "Connected to chain"
        );

        Ok(Self {
            role,
            chain_id,
            provider,
        })
    }
}

#[async_trait]
impl ChainClient for RpcConnection {
    fn role(&self) -> ChainRole {
        self.role
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn block_number(&self) -> Result<u64, RelayError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| RelayError::connection(self.role, format!("Failed to get block number: {}", e)))
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, RelayError> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| {
                RelayError::connection(self.role, format!("Failed to get pending nonce: {}", e))
            })
    }

    async fn gas_price(&self) -> Result<u128, RelayError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| RelayError::connection(self.role, format!("Failed to get gas price: {}", e)))
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<Log>, RelayError> {
        self.provider
            .get_logs(&Filter::from(query))
            .await
            .map_err(|e| {
                RelayError::connection(
                    self.role,
                    format!(
                        "Failed to get logs from block {} to {}: {}",
                        query.from_block, query.to_block, e
                    ),
                )
            })
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RelayError> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| RelayError::connection(self.role, format!("Broadcast rejected: {}", e)))?;
        Ok(*pending.tx_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Minimal JSON-RPC endpoint answering every request with `chain_id`
    async fn chain_id_endpoint(chain_id: u64) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(answer_chain_id(socket, chain_id));
            }
        });
        format!("http://{}", addr)
    }

    async fn answer_chain_id(mut socket: TcpStream, chain_id: u64) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let body = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let len = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                break buf[end + 4..end + 4 + len].to_vec();
            }
        };

        let request: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let response = json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "result": format!("0x{:x}", chain_id)
        })
        .to_string();
        let reply = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            response.len(),
            response
        );
        socket.write_all(reply.as_bytes()).await.unwrap();
    }

    fn bridge_abi() -> JsonAbi {
        serde_json::from_value(json!([
            {
                "type": "event",
                "name": "Deposit",
                "anonymous": false,
                "inputs": [
                    {"name": "token", "type": "address", "indexed": true},
                    {"name": "recipient", "type": "address", "indexed": true},
                    {"name": "amount", "type": "uint256", "indexed": false}
                ]
            },
            {
                "type": "function",
                "name": "withdraw",
                "stateMutability": "nonpayable",
                "inputs": [
                    {"name": "token", "type": "address"},
                    {"name": "recipient", "type": "address"},
                    {"name": "amount", "type": "uint256"}
                ],
                "outputs": []
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_log_query_to_filter() {
        let query = LogQuery {
            address: Address::repeat_byte(0x11),
            event_signature: B256::repeat_byte(0x22),
            from_block: 975,
            to_block: 1_000,
        };
        let filter = Filter::from(&query);
        assert_eq!(filter.get_from_block(), Some(975));
        assert_eq!(filter.get_to_block(), Some(1_000));
    }

    #[test]
    fn test_contract_handle_lookup() {
        let handle = ContractHandle::new(ChainRole::Source, Address::ZERO, bridge_abi());
        assert_eq!(handle.event("Deposit").unwrap().inputs.len(), 3);
        assert!(handle.function("withdraw").is_some());
        assert!(handle.function("wrap").is_none());

        let err = handle.event("Unwrap").unwrap_err();
        assert!(matches!(err, RelayError::Scan { role: ChainRole::Source, .. }));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let endpoint = ChainEndpoint {
            rpc_url: "not a url".to_string(),
            expected_chain_id: None,
        };
        let result = RpcConnection::connect(ChainRole::Source, &endpoint, &Config::default()).await;
        assert!(matches!(
            result,
            Err(RelayError::Connection { role: ChainRole::Source, .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_rejects_chain_id_mismatch() {
        let endpoint = ChainEndpoint {
            rpc_url: chain_id_endpoint(97).await,
            expected_chain_id: Some(43113),
        };
        let result = RpcConnection::connect(ChainRole::Source, &endpoint, &Config::default()).await;
        match result {
            Err(RelayError::ChainIdMismatch {
                role,
                expected,
                actual,
            }) => {
                assert_eq!(role, ChainRole::Source);
                assert_eq!(expected, 43113);
                assert_eq!(actual, 97);
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("connected despite chain id mismatch"),
        }
    }

    #[tokio::test]
    async fn test_connect_accepts_matching_chain_id() {
        let endpoint = ChainEndpoint {
            rpc_url: chain_id_endpoint(97).await,
            expected_chain_id: Some(97),
        };
        let connection = RpcConnection::connect(ChainRole::Destination, &endpoint, &Config::default())
            .await
            .unwrap();
        assert_eq!(connection.chain_id(), 97);
        assert_eq!(connection.role(), ChainRole::Destination);
    }
}
