//! # Outbound Ports (Driven Ports / SPI)
//!
//! Dependencies the admission service needs from its host:
//! - [`KeyValueStore`]: raw byte storage (RocksDB in a node, in-memory in tests)
//! - [`NodeStore`]: the typed get/set contract over validators, nodes and the
//!   consensus-address index
//! - [`TimeSource`]: the clock certificate validity is checked against

use crate::domain::address::ConsensusAddress;
use crate::domain::entities::{Node, Params, Validator};
use crate::domain::errors::StoreError;
use crate::domain::genesis::AdmittedValidator;

/// Result of a prefix scan: `(key, value)` pairs.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Abstract interface for key-value database operations.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either all operations in the batch are applied, or none are.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), StoreError>;

    /// Iterate over keys with a prefix, in ascending key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, StoreError>;
}

/// A put staged for an atomic batch write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOperation {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl BatchOperation {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Typed store for admission state.
///
/// Validators and nodes are keyed by their decoded identifiers.
pub trait NodeStore: Send + Sync {
    fn set_params(&mut self, params: &Params) -> Result<(), StoreError>;

    /// Stored params, or the defaults if none were ever written.
    fn params(&self) -> Result<Params, StoreError>;

    fn set_root_cert(&mut self, pem: &str) -> Result<(), StoreError>;

    fn root_cert(&self) -> Result<Option<String>, StoreError>;

    fn set_validator(&mut self, id: &[u8], validator: &Validator) -> Result<(), StoreError>;

    fn validator(&self, id: &[u8]) -> Result<Option<Validator>, StoreError>;

    /// All validators, ordered by id.
    fn all_validators(&self) -> Result<Vec<Validator>, StoreError>;

    fn set_consensus_address(
        &mut self,
        node_id: &[u8],
        address: ConsensusAddress,
    ) -> Result<(), StoreError>;

    fn consensus_address(&self, node_id: &[u8]) -> Result<Option<ConsensusAddress>, StoreError>;

    fn set_node(&mut self, id: &[u8], node: &Node) -> Result<(), StoreError>;

    fn node(&self, id: &[u8]) -> Result<Option<Node>, StoreError>;

    /// All nodes, ordered by id.
    fn nodes(&self) -> Result<Vec<Node>, StoreError>;

    /// Write a whole genesis snapshot: params, root certificate, validator
    /// records with their consensus-address index entries, and nodes.
    ///
    /// Stores that can batch should make this all-or-nothing.
    fn store_genesis(
        &mut self,
        params: &Params,
        root_cert: &str,
        validators: &[AdmittedValidator],
        nodes: &[(Vec<u8>, &Node)],
    ) -> Result<(), StoreError> {
        self.set_params(params)?;
        self.set_root_cert(root_cert)?;
        for val in validators {
            self.set_validator(&val.id, &val.record)?;
            self.set_consensus_address(&val.id, val.address)?;
        }
        for (id, node) in nodes {
            self.set_node(id, node)?;
        }
        Ok(())
    }

    /// The bonded validator set: unjailed validators with non-zero power,
    /// highest power first, ties broken by id.
    fn last_validators(&self) -> Result<Vec<Validator>, StoreError> {
        let mut bonded: Vec<_> = self
            .all_validators()?
            .into_iter()
            .filter(|v| !v.jailed && v.power > 0)
            .collect();
        bonded.sort_by(|a, b| b.power.cmp(&a.power).then_with(|| a.id.cmp(&b.id)));
        Ok(bonded)
    }
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Current time in seconds since the unix epoch.
    fn now(&self) -> i64;
}
