//! Relay checkpoints
//!
//! A checkpoint remembers which scanned logs already produced a broadcast, so
//! an embedder that keeps the process alive can skip them when the trailing
//! window overlaps. The command-line relayer uses [`NoCheckpoint`] and relays
//! every event it scans.

use alloy::primitives::B256;
use std::collections::{HashMap, VecDeque};

use crate::types::RelayKey;

/// Idempotency store consulted before each submission
pub trait RelayCheckpoint {
    fn already_relayed(&self, key: &RelayKey) -> bool;

    /// Remember the broadcast made for `key`
    fn record(&mut self, key: RelayKey, tx_hash: B256);
}

/// Remembers nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCheckpoint;

impl RelayCheckpoint for NoCheckpoint {
    fn already_relayed(&self, _key: &RelayKey) -> bool {
        false
    }

    fn record(&mut self, _key: RelayKey, _tx_hash: B256) {}
}

/// In-memory checkpoint holding at most `max_size` keys.
///
/// When full, the oldest recorded key is evicted on insert.
#[derive(Debug, Clone)]
pub struct BoundedRelayCache {
    relayed: HashMap<RelayKey, B256>,
    order: VecDeque<RelayKey>,
    max_size: usize,
}

impl BoundedRelayCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            relayed: HashMap::new(),
            order: VecDeque::new(),
            max_size: max_size.max(1),
        }
    }

    /// Transaction hash recorded for `key`
    pub fn relayed_tx(&self, key: &RelayKey) -> Option<B256> {
        self.relayed.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.relayed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relayed.is_empty()
    }

    /// Returns (current len, max_size)
    pub fn capacity_info(&self) -> (usize, usize) {
        (self.relayed.len(), self.max_size)
    }
}

impl RelayCheckpoint for BoundedRelayCache {
    fn already_relayed(&self, key: &RelayKey) -> bool {
        self.relayed.contains_key(key)
    }

    fn record(&mut self, key: RelayKey, tx_hash: B256) {
        if self.relayed.insert(key, tx_hash).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.relayed.remove(&oldest);
            }
        }
    }
}
