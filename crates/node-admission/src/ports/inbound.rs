//! # Inbound Ports (Driving Ports / API)
//!
//! The genesis lifecycle as seen by the node that embeds this crate.

use crate::domain::address::ConsensusAddress;
use crate::domain::entities::{GenesisState, GenesisValidator, Node, Params, Validator, ValidatorUpdate};
use crate::domain::errors::{FatalError, ValidationError};

/// Genesis admission API.
///
/// `validate_genesis` is a pure check and may be called any number of times.
/// `init_genesis` runs once per process before consensus starts; its errors
/// are terminal.
pub trait GenesisApi {
    /// Check every admission invariant without touching the store.
    fn validate_genesis(&self, genesis: &GenesisState) -> Result<(), ValidationError>;

    /// Validate, then persist the snapshot and return the initial validator
    /// updates in document order.
    fn init_genesis(&mut self, genesis: &GenesisState) -> Result<Vec<ValidatorUpdate>, FatalError>;

    /// Rebuild a snapshot from store state. Performs no validation.
    fn export_genesis(&self) -> Result<GenesisState, FatalError>;

    /// Genesis validator list for the consensus engine's own genesis
    /// document, built from the bonded set. Undecodable keys are skipped.
    fn write_validators(&self) -> Result<Vec<GenesisValidator>, FatalError>;
}

/// Read-only queries over admitted state.
pub trait AdmissionQueryApi {
    fn params(&self) -> Result<Params, FatalError>;

    fn root_certificate(&self) -> Result<Option<String>, FatalError>;

    /// Look up a validator by hex id.
    fn validator(&self, id: &str) -> Result<Option<Validator>, FatalError>;

    /// Look up a node by hex id.
    fn node(&self, id: &str) -> Result<Option<Node>, FatalError>;

    /// Consensus address indexed under a hex node identifier.
    fn consensus_address(&self, node_id: &str) -> Result<Option<ConsensusAddress>, FatalError>;
}
