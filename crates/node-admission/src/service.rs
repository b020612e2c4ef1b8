//! # Genesis Admission Service
//!
//! Application service implementing [`GenesisApi`] and [`AdmissionQueryApi`].
//!
//! ## Initialization Sequence
//!
//! 1. Validate the snapshot (no writes happen before this passes)
//! 2. Admit every validator: transcode its key, decode its id, derive its
//!    consensus address. Any failure is fatal and nothing is written.
//! 3. Decode every node id
//! 4. Persist params, root certificate, validators, index entries and nodes
//!    in a single store write
//! 5. Return one validator update per validator, in document order

use crate::config::AdmissionConfig;
use crate::domain::address::ConsensusAddress;
use crate::domain::entities::{
    GenesisState, GenesisValidator, Node, Params, Validator, ValidatorUpdate,
};
use crate::domain::errors::{FatalError, ValidationError};
use crate::domain::genesis::{admit_validator, derive_genesis_validators, AdmittedValidator};
use crate::domain::keys::KeyTranscoder;
use crate::domain::validation::validate_genesis;
use crate::ports::inbound::{AdmissionQueryApi, GenesisApi};
use crate::ports::outbound::{NodeStore, TimeSource};
use tracing::{debug, error, info};

/// Genesis admission service over a [`NodeStore`].
pub struct GenesisService<S: NodeStore> {
    store: S,
    transcoder: KeyTranscoder,
    clock: Box<dyn TimeSource>,
}

impl<S: NodeStore> GenesisService<S> {
    pub fn new(store: S, transcoder: KeyTranscoder, clock: Box<dyn TimeSource>) -> Self {
        Self {
            store,
            transcoder,
            clock,
        }
    }

    pub fn from_config(store: S, config: &AdmissionConfig) -> Self {
        Self::new(store, config.transcoder(), config.time_source())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transcoder(&self) -> &KeyTranscoder {
        &self.transcoder
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn decode_id(id: &str) -> Result<Vec<u8>, FatalError> {
        hex::decode(id).map_err(|source| FatalError::InvalidHexId {
            id: id.to_string(),
            source,
        })
    }

    fn persist(
        &mut self,
        genesis: &GenesisState,
        admitted: &[AdmittedValidator],
        nodes: &[(Vec<u8>, &Node)],
    ) -> Result<(), FatalError> {
        self.store.store_genesis(
            &genesis.params,
            &genesis.root_cert,
            admitted,
            nodes,
        )?;

        for val in admitted {
            debug!(id = %val.record.id, name = %val.record.name, power = val.record.power, "Stored genesis validator");
        }
        for (_, node) in nodes {
            debug!(id = %node.id, name = %node.name, "Stored genesis node");
        }

        Ok(())
    }
}

impl<S: NodeStore> GenesisApi for GenesisService<S> {
    fn validate_genesis(&self, genesis: &GenesisState) -> Result<(), ValidationError> {
        validate_genesis(genesis, self.clock.now())
    }

    fn init_genesis(&mut self, genesis: &GenesisState) -> Result<Vec<ValidatorUpdate>, FatalError> {
        if let Err(e) = self.validate_genesis(genesis) {
            error!(error = %e, "Genesis validation failed");
            return Err(e.into());
        }

        let admitted = genesis
            .validators
            .iter()
            .map(|val| admit_validator(val, &self.transcoder))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| error!(error = %e, "Genesis validator admission failed"))?;

        let nodes = genesis
            .nodes
            .iter()
            .map(|node| Self::decode_id(&node.id).map(|id| (id, node)))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| error!(error = %e, "Genesis node admission failed"))?;

        self.persist(genesis, &admitted, &nodes)
            .inspect_err(|e| error!(error = %e, "Failed to persist genesis state"))?;

        info!(
            validators = admitted.len(),
            nodes = nodes.len(),
            "Genesis state initialized"
        );

        Ok(admitted.into_iter().map(|val| val.update).collect())
    }

    fn export_genesis(&self) -> Result<GenesisState, FatalError> {
        let root_cert = self.store.root_cert()?.unwrap_or_default();
        let genesis = GenesisState::new(
            root_cert,
            self.store.params()?,
            self.store.all_validators()?,
            self.store.nodes()?,
        );

        info!(
            validators = genesis.validators.len(),
            nodes = genesis.nodes.len(),
            "Genesis state exported"
        );
        Ok(genesis)
    }

    fn write_validators(&self) -> Result<Vec<GenesisValidator>, FatalError> {
        let bonded = self.store.last_validators()?;
        Ok(derive_genesis_validators(&bonded, &self.transcoder))
    }
}

impl<S: NodeStore> AdmissionQueryApi for GenesisService<S> {
    fn params(&self) -> Result<Params, FatalError> {
        Ok(self.store.params()?)
    }

    fn root_certificate(&self) -> Result<Option<String>, FatalError> {
        Ok(self.store.root_cert()?)
    }

    fn validator(&self, id: &str) -> Result<Option<Validator>, FatalError> {
        Ok(self.store.validator(&Self::decode_id(id)?)?)
    }

    fn node(&self, id: &str) -> Result<Option<Node>, FatalError> {
        Ok(self.store.node(&Self::decode_id(id)?)?)
    }

    fn consensus_address(&self, node_id: &str) -> Result<Option<ConsensusAddress>, FatalError> {
        Ok(self.store.consensus_address(&Self::decode_id(node_id)?)?)
    }
}
