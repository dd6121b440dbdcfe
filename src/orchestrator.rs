//! Relay orchestrator
//!
//! Runs one relay cycle for one scanned chain:
//!
//! ```text
//! validate role -> resolve contracts & signer -> connect -> compute window
//!   -> scan -> (no events: done) | (map & submit each in scan order: done)
//! ```
//!
//! Config, connection and scan errors abort the cycle before anything is
//! broadcast. A failed submission is recorded in the [`RelayReport`] and the
//! remaining events are still attempted with the next nonce.

use alloy::primitives::B256;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::chain::{ChainClient, Connector};
use crate::checkpoint::{NoCheckpoint, RelayCheckpoint};
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::mapper::map_event;
use crate::registry::ContractRegistry;
use crate::scanner::EventWindowScanner;
use crate::submitter::TransactionSubmitter;
use crate::types::{ChainRole, RelayCall, RelayKey, ScanWindow, TargetFunction};

/// A broadcast made during the cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedRelay {
    pub key: RelayKey,
    pub function: TargetFunction,
    pub nonce: u64,
    pub tx_hash: B256,
}

/// A submission that failed during the cycle
#[derive(Debug)]
pub struct FailedRelay {
    pub key: RelayKey,
    pub error: RelayError,
}

/// Outcome of one relay cycle
#[derive(Debug)]
pub struct RelayReport {
    pub role: ChainRole,
    pub window: ScanWindow,
    pub events_found: usize,
    pub submitted: Vec<SubmittedRelay>,
    /// Events skipped because the checkpoint had already seen them
    pub skipped: usize,
    pub failures: Vec<FailedRelay>,
}

impl RelayReport {
    fn empty(role: ChainRole, window: ScanWindow) -> Self {
        Self {
            role,
            window,
            events_found: 0,
            submitted: Vec::new(),
            skipped: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

enum RegistrySource {
    File(PathBuf),
    Loaded(ContractRegistry),
}

/// Wires registry, connections, scanner, mapper and submitter together
pub struct RelayOrchestrator<K, P = NoCheckpoint> {
    registry: RegistrySource,
    relay: RelayConfig,
    connector: K,
    checkpoint: P,
}

impl<K: Connector> RelayOrchestrator<K, NoCheckpoint> {
    /// Orchestrator that reads the contract registry from `contract_info` on each run
    pub fn new(contract_info: impl Into<PathBuf>, relay: RelayConfig, connector: K) -> Self {
        Self {
            registry: RegistrySource::File(contract_info.into()),
            relay,
            connector,
            checkpoint: NoCheckpoint,
        }
    }

    /// Orchestrator over an already parsed registry
    pub fn with_registry(registry: ContractRegistry, relay: RelayConfig, connector: K) -> Self {
        Self {
            registry: RegistrySource::Loaded(registry),
            relay,
            connector,
            checkpoint: NoCheckpoint,
        }
    }
}

impl<K: Connector, P: RelayCheckpoint> RelayOrchestrator<K, P> {
    /// Replace the checkpoint consulted before each submission
    pub fn with_checkpoint<Q: RelayCheckpoint>(self, checkpoint: Q) -> RelayOrchestrator<K, Q> {
        RelayOrchestrator {
            registry: self.registry,
            relay: self.relay,
            connector: self.connector,
            checkpoint,
        }
    }

    pub fn checkpoint(&self) -> &P {
        &self.checkpoint
    }

    pub fn connector(&self) -> &K {
        &self.connector
    }

    /// Run one relay cycle scanning the chain named by `role_arg`
    pub async fn run(&mut self, role_arg: &str) -> Result<RelayReport, RelayError> {
        let role: ChainRole = role_arg.parse()?;
        let target = role.counterpart();
        info!(role = %role, target = %target, "Starting relay cycle");

        // Resolve everything local before touching the network
        let loaded;
        let registry = match &self.registry {
            RegistrySource::File(path) => {
                loaded = ContractRegistry::load(path)?;
                &loaded
            }
            RegistrySource::Loaded(registry) => registry,
        };
        let scanned_entry = registry.resolve(role)?;
        let target_entry = registry.resolve(target)?;
        target_entry.function(role.relayed_call().as_str())?;
        let signer = registry.resolve_signer(target)?;
        debug!(signer = %signer.address(), "Resolved relay signer");

        let scanned_client = self.connector.connect(role).await?;
        let target_client = self.connector.connect(target).await?;

        let scanned_contract = scanned_client.bind_contract(scanned_entry.address, scanned_entry.abi);
        let target_contract = target_client.bind_contract(target_entry.address, target_entry.abi);

        let scanner = EventWindowScanner::new(self.relay.scan_window);
        let window = scanner.current_window(&scanned_client).await?;
        let events = scanner
            .scan(&scanned_client, &scanned_contract, role.watched_event(), &window)
            .await?;

        let mut report = RelayReport::empty(role, window);
        report.events_found = events.len();
        if events.is_empty() {
            info!(
                role = %role,
                from_block = window.from_block,
                to_block = window.to_block,
                "No events to relay"
            );
            return Ok(report);
        }

        // Every event is mapped before the first broadcast so a bad mapping
        // cannot abort the cycle halfway.
        let scanned_chain_id = scanned_client.chain_id();
        let mut pending: Vec<(RelayKey, RelayCall)> = Vec::with_capacity(events.len());
        for scanned in &events {
            let key = RelayKey::new(scanned_chain_id, &scanned.position);
            let call = map_event(role, &scanned.event)?;
            if self.checkpoint.already_relayed(&key) {
                debug!(key = %key, "Already relayed, skipping");
                report.skipped += 1;
                continue;
            }
            pending.push((key, call));
        }

        if pending.is_empty() {
            info!(role = %role, skipped = report.skipped, "All scanned events already relayed");
            return Ok(report);
        }

        let mut submitter =
            TransactionSubmitter::begin_cycle(&target_client, &target_contract, &signer, &self.relay)
                .await?;

        for (key, call) in pending {
            let nonce = submitter.next_nonce();
            match submitter.submit(&call).await {
                Ok(tx_hash) => {
                    self.checkpoint.record(key, tx_hash);
                    report.submitted.push(SubmittedRelay {
                        key,
                        function: call.function,
                        nonce,
                        tx_hash,
                    });
                }
                Err(e) => {
                    error!(key = %key, nonce, error = %e, "Relay submission failed");
                    report.failures.push(FailedRelay { key, error: e });
                }
            }
        }

        if report.is_success() {
            info!(
                role = %role,
                submitted = report.submitted.len(),
                skipped = report.skipped,
                "Relay cycle complete"
            );
        } else {
            warn!(
                role = %role,
                submitted = report.submitted.len(),
                failed = report.failures.len(),
                "Relay cycle finished with failures"
            );
        }

        Ok(report)
    }
}
