//! Transaction submission
//!
//! One [`TransactionSubmitter`] is opened per relay cycle. It samples the
//! pending nonce and the gas price of the submitting chain exactly once, then
//! signs every call locally as a legacy EIP-155 transaction and broadcasts
//! the raw bytes. Receipts are not awaited.

use alloy::dyn_abi::JsonAbiExt;
use alloy::eips::eip2718::Encodable2718;
use alloy::json_abi::Function;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::chain::{ChainClient, ContractHandle};
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::types::{OutboundCall, RelayCall, SignerCredential};

/// Local signing key whose address matches the configured wallet address
#[derive(Clone)]
pub struct RelaySigner {
    wallet: EthereumWallet,
    address: Address,
}

impl fmt::Debug for RelaySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelaySigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl RelaySigner {
    pub fn from_credential(credential: &SignerCredential) -> Result<Self, RelayError> {
        let signer: PrivateKeySigner = credential
            .private_key
            .expose()
            .parse()
            .map_err(|_| RelayError::config("'signer_key' is not a valid secp256k1 private key"))?;

        let configured = Address::from_str(&credential.wallet_address).map_err(|e| {
            RelayError::config(format!("'signer' is not a valid address: {}", e))
        })?;

        let address = signer.address();
        if address != configured {
            return Err(RelayError::config(format!(
                "'signer_key' derives {} but 'signer' is {}",
                address, configured
            )));
        }

        Ok(Self {
            wallet: EthereumWallet::from(signer),
            address,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn wallet(&self) -> &EthereumWallet {
        &self.wallet
    }
}

/// Gas price with a percentage surcharge, in integer math
pub fn bumped_gas_price(sampled: u128, bump_percent: u32) -> u128 {
    sampled.saturating_mul(100 + u128::from(bump_percent)) / 100
}

/// Per-cycle submitter bound to the counterpart chain
pub struct TransactionSubmitter<'a, C: ChainClient + ?Sized> {
    client: &'a C,
    contract: &'a ContractHandle,
    signer: &'a RelaySigner,
    gas_limit: u64,
    gas_price: u128,
    next_nonce: u64,
}

impl<'a, C: ChainClient + ?Sized> TransactionSubmitter<'a, C> {
    /// Sample nonce and gas price for a new cycle
    ///
    /// This is the only place either value is read from the chain.
    pub async fn begin_cycle(
        client: &'a C,
        contract: &'a ContractHandle,
        signer: &'a RelaySigner,
        relay: &RelayConfig,
    ) -> Result<Self, RelayError> {
        let next_nonce = client.pending_nonce(signer.address()).await?;
        let sampled = client.gas_price().await?;
        let gas_price = bumped_gas_price(sampled, relay.gas_price_bump_percent);

        info!(
            role = %client.role(),
            chain_id = client.chain_id(),
            signer = %signer.address(),
            nonce = next_nonce,
            sampled_gas_price = sampled,
            gas_price,
            "Opened submission cycle"
        );

        Ok(Self {
            client,
            contract,
            signer,
            gas_limit: relay.gas_limit,
            gas_price,
            next_nonce,
        })
    }

    /// Nonce the next built call will carry
    pub fn next_nonce(&self) -> u64 {
        self.next_nonce
    }

    pub fn gas_price(&self) -> u128 {
        self.gas_price
    }

    /// Parameterise `call`, consuming one nonce
    pub fn build(&mut self, call: &RelayCall) -> OutboundCall {
        let nonce = self.next_nonce;
        self.next_nonce += 1;
        OutboundCall {
            call: call.clone(),
            nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            chain_id: self.client.chain_id(),
        }
    }

    /// Encode, sign and broadcast `call`; returns the transaction hash
    ///
    /// The nonce stays consumed when signing or broadcasting fails.
    pub async fn submit(&mut self, call: &RelayCall) -> Result<B256, RelayError> {
        let function = self.target_function(call)?;
        let input = function.abi_encode_input(&call.abi_args()).map_err(|e| {
            RelayError::Submission {
                function: call.function,
                nonce: self.next_nonce,
                message: format!("Failed to encode call: {}", e),
            }
        })?;

        let outbound = self.build(call);
        let failed = |message: String| RelayError::Submission {
            function: outbound.call.function,
            nonce: outbound.nonce,
            message,
        };

        let tx = TransactionRequest::default()
            .with_from(self.signer.address())
            .with_to(self.contract.address())
            .with_input(Bytes::from(input))
            .with_nonce(outbound.nonce)
            .with_gas_price(outbound.gas_price)
            .with_gas_limit(outbound.gas_limit)
            .with_chain_id(outbound.chain_id);

        let envelope = tx
            .build(self.signer.wallet())
            .await
            .map_err(|e| failed(format!("Failed to sign transaction: {}", e)))?;

        debug!(
            function = %outbound.call.function,
            nonce = outbound.nonce,
            gas_price = outbound.gas_price,
            gas_limit = outbound.gas_limit,
            "Broadcasting signed transaction"
        );

        let tx_hash = self
            .client
            .send_raw_transaction(&envelope.encoded_2718())
            .await
            .map_err(|e| failed(e.to_string()))?;

        info!(
            role = %self.client.role(),
            function = %outbound.call.function,
            nonce = outbound.nonce,
            tx_hash = %tx_hash,
            "Relay transaction broadcast"
        );

        Ok(tx_hash)
    }

    fn target_function(&self, call: &RelayCall) -> Result<&'a Function, RelayError> {
        self.contract
            .function(call.function.as_str())
            .ok_or_else(|| RelayError::Submission {
                function: call.function,
                nonce: self.next_nonce,
                message: format!(
                    "'{}' is missing or overloaded in the {} ABI",
                    call.function,
                    self.contract.role()
                ),
            })
    }
}
