//! Event window scanner
//!
//! Pulls every occurrence of the watched bridge event inside a trailing block
//! window with a single `eth_getLogs` request and decodes it into a typed
//! [`RelayEvent`].
//!
//! Decoding is positional over the ABI declaration order, so the field names
//! used by a particular deployment (`underlying_token` vs `underlyingToken`,
//! `frm` vs `from`) do not matter. A log that fails to decode aborts the scan.

use alloy::dyn_abi::{DynSolValue, EventExt};
use alloy::json_abi::Event;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::Log;
use tracing::{debug, info, warn};

use crate::chain::{ChainClient, ContractHandle, LogQuery};
use crate::error::RelayError;
use crate::types::{
    ChainRole, DepositEvent, LogPosition, RelayEvent, ScanWindow, ScannedEvent, UnwrapEvent,
};

/// Scans a bounded trailing window of one chain
#[derive(Debug, Clone, Copy)]
pub struct EventWindowScanner {
    window: u64,
}

impl EventWindowScanner {
    pub fn new(window: u64) -> Self {
        Self { window }
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    /// Window ending at the current height of the chain being scanned
    pub async fn current_window<C: ChainClient + ?Sized>(
        &self,
        client: &C,
    ) -> Result<ScanWindow, RelayError> {
        let height = client.block_number().await?;
        Ok(ScanWindow::trailing(client.role(), height, self.window))
    }

    /// Fetch and decode all `event_name` logs emitted by `contract` in `window`,
    /// in chain order (block number, then log index).
    pub async fn scan<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        contract: &ContractHandle,
        event_name: &str,
        window: &ScanWindow,
    ) -> Result<Vec<ScannedEvent>, RelayError> {
        let role = contract.role();
        let event = contract.event(event_name)?;
        let query = LogQuery {
            address: contract.address(),
            event_signature: event.selector(),
            from_block: window.from_block,
            to_block: window.to_block,
        };

        debug!(
            role = %role,
            event = event_name,
            from_block = query.from_block,
            to_block = query.to_block,
            "Fetching event logs"
        );

        let logs = client.logs(&query).await?;
        let mut scanned = Vec::with_capacity(logs.len());

        for log in logs {
            if log.removed {
                warn!(
                    role = %role,
                    tx_hash = ?log.transaction_hash,
                    log_index = ?log.log_index,
                    "Skipping log removed by reorg"
                );
                continue;
            }
            if log.inner.address != contract.address() {
                return Err(RelayError::scan(
                    role,
                    format!(
                        "log emitted by {} does not belong to bridge {}",
                        log.inner.address,
                        contract.address()
                    ),
                ));
            }

            let position = log_position(role, &log)?;
            let fields = decode_fields(role, event, &log)?;
            let relay_event = build_event(role, event_name, &fields).map_err(|e| {
                RelayError::scan(
                    role,
                    format!(
                        "{} at block {} log {}: {}",
                        event_name, position.block_number, position.log_index, e
                    ),
                )
            })?;

            scanned.push(ScannedEvent {
                event: relay_event,
                position,
            });
        }

        scanned.sort_by_key(|e| (e.position.block_number, e.position.log_index));

        info!(
            role = %role,
            event = event_name,
            from_block = window.from_block,
            to_block = window.to_block,
            blocks = window.block_count(),
            count = scanned.len(),
            "Scanned event window"
        );

        Ok(scanned)
    }
}

fn log_position(role: ChainRole, log: &Log) -> Result<LogPosition, RelayError> {
    let missing = |field: &str| RelayError::scan(role, format!("log is missing {}", field));
    Ok(LogPosition {
        block_number: log.block_number.ok_or_else(|| missing("block number"))?,
        log_index: log.log_index.ok_or_else(|| missing("log index"))?,
        tx_hash: log.transaction_hash.ok_or_else(|| missing("transaction hash"))?,
    })
}

/// Decoded event inputs in ABI declaration order
fn decode_fields(role: ChainRole, event: &Event, log: &Log) -> Result<Vec<DynSolValue>, RelayError> {
    let decoded = event.decode_log(log.data(), true).map_err(|e| {
        RelayError::scan(
            role,
            format!(
                "failed to decode {} log in tx {:?}: {}",
                event.name, log.transaction_hash, e
            ),
        )
    })?;

    let mut indexed = decoded.indexed.into_iter();
    let mut body = decoded.body.into_iter();
    event
        .inputs
        .iter()
        .map(|input| {
            if input.indexed {
                indexed.next()
            } else {
                body.next()
            }
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| RelayError::scan(role, format!("{} log has fewer fields than its ABI", event.name)))
}

/// Build the typed event expected on `role`; any other role/event pairing is rejected
fn build_event(role: ChainRole, event_name: &str, fields: &[DynSolValue]) -> Result<RelayEvent, String> {
    match (role, event_name) {
        (ChainRole::Source, "Deposit") => {
            expect_arity(fields, 3)?;
            Ok(RelayEvent::Deposit(DepositEvent {
                token: address_at(fields, 0, "token")?,
                recipient: address_at(fields, 1, "recipient")?,
                amount: uint_at(fields, 2, "amount")?,
            }))
        }
        (ChainRole::Destination, "Unwrap") => {
            expect_arity(fields, 5)?;
            Ok(RelayEvent::Unwrap(UnwrapEvent {
                underlying_token: address_at(fields, 0, "underlying_token")?,
                wrapped_token: address_at(fields, 1, "wrapped_token")?,
                from: address_at(fields, 2, "from")?,
                to: address_at(fields, 3, "to")?,
                amount: uint_at(fields, 4, "amount")?,
            }))
        }
        (role, name) => Err(format!("'{}' is not a relayable event on the {} chain", name, role)),
    }
}

fn expect_arity(fields: &[DynSolValue], expected: usize) -> Result<(), String> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(format!("expected {} fields, ABI declares {}", expected, fields.len()))
    }
}

fn address_at(fields: &[DynSolValue], index: usize, name: &str) -> Result<Address, String> {
    fields
        .get(index)
        .and_then(DynSolValue::as_address)
        .ok_or_else(|| format!("field {} ({}) is not an address", index, name))
}

fn uint_at(fields: &[DynSolValue], index: usize, name: &str) -> Result<U256, String> {
    fields
        .get(index)
        .and_then(DynSolValue::as_uint)
        .map(|(value, _)| value)
        .ok_or_else(|| format!("field {} ({}) is not an unsigned integer", index, name))
}
