//! # Key-Value Node Store
//!
//! [`NodeStore`] over any [`KeyValueStore`]. Records are bincode-encoded
//! under single-byte prefixes:
//!
//! | Prefix | Key suffix      | Value              |
//! |--------|-----------------|--------------------|
//! | `0x01` | (none)          | `Params`           |
//! | `0x02` | (none)          | root cert PEM      |
//! | `0x21` | validator id    | `Validator`        |
//! | `0x22` | node id         | `Node`             |
//! | `0x23` | node id         | consensus address  |

use crate::domain::address::ConsensusAddress;
use crate::domain::entities::{Node, Params, Validator};
use crate::domain::errors::StoreError;
use crate::domain::genesis::AdmittedValidator;
use crate::ports::outbound::{BatchOperation, KeyValueStore, NodeStore};
use serde::de::DeserializeOwned;
use serde::Serialize;

const PARAMS_KEY: &[u8] = &[0x01];
const ROOT_CERT_KEY: &[u8] = &[0x02];
const VALIDATOR_PREFIX: u8 = 0x21;
const NODE_PREFIX: u8 = 0x22;
const CONS_ADDR_INDEX_PREFIX: u8 = 0x23;

fn prefixed(prefix: u8, id: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + id.len());
    key.push(prefix);
    key.extend_from_slice(id);
    key
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Codec(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Codec(e.to_string()))
}

/// Typed admission store backed by a key-value store.
#[derive(Debug, Default)]
pub struct KvNodeStore<S: KeyValueStore> {
    kv: S,
}

impl<S: KeyValueStore> KvNodeStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn inner(&self) -> &S {
        &self.kv
    }

    pub fn into_inner(self) -> S {
        self.kv
    }

    fn get_decoded<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, StoreError> {
        self.kv.get(key)?.map(|bytes| decode(&bytes)).transpose()
    }

    fn scan_decoded<T: DeserializeOwned>(&self, prefix: u8) -> Result<Vec<T>, StoreError> {
        self.kv
            .prefix_scan(&[prefix])?
            .iter()
            .map(|(_, bytes)| decode(bytes))
            .collect()
    }
}

impl<S: KeyValueStore> NodeStore for KvNodeStore<S> {
    fn set_params(&mut self, params: &Params) -> Result<(), StoreError> {
        self.kv.put(PARAMS_KEY, &encode(params)?)
    }

    fn params(&self) -> Result<Params, StoreError> {
        Ok(self.get_decoded(PARAMS_KEY)?.unwrap_or_default())
    }

    fn set_root_cert(&mut self, pem: &str) -> Result<(), StoreError> {
        self.kv.put(ROOT_CERT_KEY, pem.as_bytes())
    }

    fn root_cert(&self) -> Result<Option<String>, StoreError> {
        self.kv
            .get(ROOT_CERT_KEY)?
            .map(|bytes| String::from_utf8(bytes).map_err(|e| StoreError::Codec(e.to_string())))
            .transpose()
    }

    fn set_validator(&mut self, id: &[u8], validator: &Validator) -> Result<(), StoreError> {
        self.kv
            .put(&prefixed(VALIDATOR_PREFIX, id), &encode(validator)?)
    }

    fn validator(&self, id: &[u8]) -> Result<Option<Validator>, StoreError> {
        self.get_decoded(&prefixed(VALIDATOR_PREFIX, id))
    }

    fn all_validators(&self) -> Result<Vec<Validator>, StoreError> {
        self.scan_decoded(VALIDATOR_PREFIX)
    }

    fn set_consensus_address(
        &mut self,
        node_id: &[u8],
        address: ConsensusAddress,
    ) -> Result<(), StoreError> {
        self.kv
            .put(&prefixed(CONS_ADDR_INDEX_PREFIX, node_id), address.as_bytes())
    }

    fn consensus_address(&self, node_id: &[u8]) -> Result<Option<ConsensusAddress>, StoreError> {
        self.kv
            .get(&prefixed(CONS_ADDR_INDEX_PREFIX, node_id))?
            .map(|bytes| {
                ConsensusAddress::try_from(bytes.as_slice())
                    .map_err(|e| StoreError::Codec(e.to_string()))
            })
            .transpose()
    }

    fn set_node(&mut self, id: &[u8], node: &Node) -> Result<(), StoreError> {
        self.kv.put(&prefixed(NODE_PREFIX, id), &encode(node)?)
    }

    fn node(&self, id: &[u8]) -> Result<Option<Node>, StoreError> {
        self.get_decoded(&prefixed(NODE_PREFIX, id))
    }

    fn nodes(&self) -> Result<Vec<Node>, StoreError> {
        self.scan_decoded(NODE_PREFIX)
    }

    fn store_genesis(
        &mut self,
        params: &Params,
        root_cert: &str,
        validators: &[AdmittedValidator],
        nodes: &[(Vec<u8>, &Node)],
    ) -> Result<(), StoreError> {
        let mut batch = Vec::with_capacity(2 + validators.len() * 2 + nodes.len());
        batch.push(BatchOperation::put(PARAMS_KEY, encode(params)?));
        batch.push(BatchOperation::put(ROOT_CERT_KEY, root_cert.as_bytes()));

        for val in validators {
            batch.push(BatchOperation::put(
                prefixed(VALIDATOR_PREFIX, &val.id),
                encode(&val.record)?,
            ));
            batch.push(BatchOperation::put(
                prefixed(CONS_ADDR_INDEX_PREFIX, &val.id),
                val.address.as_bytes(),
            ));
        }
        for (id, node) in nodes {
            batch.push(BatchOperation::put(prefixed(NODE_PREFIX, id), encode(node)?));
        }

        self.kv.atomic_batch_write(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryKVStore;

    fn store() -> KvNodeStore<InMemoryKVStore> {
        KvNodeStore::new(InMemoryKVStore::new())
    }

    #[test]
    fn test_params_default_when_unset() {
        let mut store = store();
        assert_eq!(store.params().unwrap(), Params::default());

        let params = Params {
            historical_entries: 7,
        };
        store.set_params(&params).unwrap();
        assert_eq!(store.params().unwrap(), params);
    }

    #[test]
    fn test_root_cert_round_trip() {
        let mut store = store();
        assert_eq!(store.root_cert().unwrap(), None);
        store.set_root_cert("-----BEGIN CERTIFICATE-----").unwrap();
        assert_eq!(
            store.root_cert().unwrap().as_deref(),
            Some("-----BEGIN CERTIFICATE-----")
        );
    }

    #[test]
    fn test_validators_are_scanned_in_id_order() {
        let mut store = store();
        store
            .set_validator(&[2], &Validator::new("02", "b", "k2", 1))
            .unwrap();
        store
            .set_validator(&[1], &Validator::new("01", "a", "k1", 1))
            .unwrap();

        let names: Vec<_> = store
            .all_validators()
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(store.validator(&[1]).unwrap().unwrap().name, "a");
        assert!(store.validator(&[9]).unwrap().is_none());
    }

    #[test]
    fn test_record_kinds_do_not_collide() {
        let mut store = store();
        store
            .set_validator(&[1], &Validator::new("01", "v", "k", 1))
            .unwrap();
        store.set_node(&[1], &Node::new("01", "n")).unwrap();
        store
            .set_consensus_address(&[1], ConsensusAddress([4; 20]))
            .unwrap();

        assert_eq!(store.all_validators().unwrap().len(), 1);
        assert_eq!(store.nodes().unwrap().len(), 1);
        assert_eq!(
            store.consensus_address(&[1]).unwrap(),
            Some(ConsensusAddress([4; 20]))
        );
    }

    #[test]
    fn test_last_validators_filters_and_orders() {
        let mut store = store();
        let mut jailed = Validator::new("01", "jailed", "k1", 100);
        jailed.jailed = true;
        store.set_validator(&[1], &jailed).unwrap();
        store
            .set_validator(&[2], &Validator::new("02", "zero", "k2", 0))
            .unwrap();
        store
            .set_validator(&[3], &Validator::new("03", "low", "k3", 5))
            .unwrap();
        store
            .set_validator(&[4], &Validator::new("04", "high", "k4", 50))
            .unwrap();

        let names: Vec<_> = store
            .last_validators()
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["high", "low"]);
    }

    #[test]
    fn test_corrupt_record_is_codec_error() {
        let mut kv = InMemoryKVStore::new();
        kv.put(&[VALIDATOR_PREFIX, 1], &[0xff]).unwrap();
        let store = KvNodeStore::new(kv);
        assert!(matches!(store.validator(&[1]), Err(StoreError::Codec(_))));
    }

    #[test]
    fn test_store_genesis_writes_every_record() {
        let mut store = store();
        let record = Validator::new("0a", "val", "canonical", 3);
        let admitted = AdmittedValidator {
            record: record.clone(),
            id: vec![0x0a],
            address: ConsensusAddress([7; 20]),
            update: crate::domain::entities::ValidatorUpdate {
                pub_key: crate::domain::keys::ConsensusPubKey::Sr25519([1; 32]),
                power: 3,
            },
        };
        let node = Node::new("0b", "node");
        let params = Params {
            historical_entries: 5,
        };

        store
            .store_genesis(&params, "root", &[admitted], &[(vec![0x0b], &node)])
            .unwrap();

        assert_eq!(store.params().unwrap(), params);
        assert_eq!(store.root_cert().unwrap().as_deref(), Some("root"));
        assert_eq!(store.validator(&[0x0a]).unwrap(), Some(record));
        assert_eq!(
            store.consensus_address(&[0x0a]).unwrap(),
            Some(ConsensusAddress([7; 20]))
        );
        assert_eq!(store.nodes().unwrap(), vec![node]);
        assert_eq!(store.inner().len(), 5);
    }
}
