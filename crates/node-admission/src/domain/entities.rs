//! # Domain Entities
//!
//! Genesis document records and the consensus-boundary outputs derived
//! from them. Field names follow the JSON genesis document.

use super::certificate::Certificate;
use super::errors::ValidationError;
use super::keys::ConsensusPubKey;
use serde::{Deserialize, Serialize};

/// Length of a node identifier in bytes.
pub const NODE_ID_LEN: usize = 20;

/// Default number of historical entries kept by the module.
pub const DEFAULT_HISTORICAL_ENTRIES: u32 = 10_000;

/// Module parameters. Opaque to admission; persisted and exported as-is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub historical_entries: u32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            historical_entries: DEFAULT_HISTORICAL_ENTRIES,
        }
    }
}

/// A validator admitted at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Validator {
    /// Hex-encoded identifier.
    pub id: String,
    /// Display moniker.
    pub name: String,
    /// bech32 consensus public key. Wire form in a genesis document,
    /// canonical form once stored.
    pub pubkey: String,
    /// Optional PEM certificate issued under the root certificate.
    #[serde(default)]
    pub certificate: String,
    /// Voting power.
    pub power: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub jailed: bool,
    /// Operator account address.
    #[serde(default)]
    pub operator: String,
}

impl Validator {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        pubkey: impl Into<String>,
        power: u64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            pubkey: pubkey.into(),
            certificate: String::new(),
            power,
            description: String::new(),
            jailed: false,
            operator: String::new(),
        }
    }

    pub fn with_certificate(mut self, certificate: impl Into<String>) -> Self {
        self.certificate = certificate.into();
        self
    }

    pub fn has_certificate(&self) -> bool {
        !self.certificate.is_empty()
    }

    /// Decode the hex identifier.
    pub fn id_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(&self.id)
    }
}

/// A network node admitted at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Hex-encoded node identifier.
    pub id: String,
    pub name: String,
    /// Optional PEM certificate.
    #[serde(default)]
    pub certificate: String,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            certificate: String::new(),
        }
    }

    /// Decode the hex identifier.
    pub fn id_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(&self.id)
    }

    /// Self-consistency check for a node record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidNode {
            id: self.id.clone(),
            reason,
        };

        if self.id.is_empty() {
            return Err(invalid("node id cannot be empty".to_string()));
        }
        let id = self
            .id_bytes()
            .map_err(|e| invalid(format!("node id is not valid hex: {e}")))?;
        if id.len() != NODE_ID_LEN {
            return Err(invalid(format!(
                "node id must be {NODE_ID_LEN} bytes, got {}",
                id.len()
            )));
        }
        if self.name.trim().is_empty() {
            return Err(invalid("node name cannot be blank".to_string()));
        }
        if !self.certificate.is_empty() {
            Certificate::from_pem(self.certificate.as_bytes())
                .map_err(|e| invalid(format!("invalid certificate: {e}")))?;
        }
        Ok(())
    }
}

/// Aggregate genesis snapshot for the admission module.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub params: Params,
    /// PEM root certificate.
    #[serde(default)]
    pub root_cert: String,
    #[serde(default)]
    pub validators: Vec<Validator>,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl GenesisState {
    pub fn new(
        root_cert: impl Into<String>,
        params: Params,
        validators: Vec<Validator>,
        nodes: Vec<Node>,
    ) -> Self {
        Self {
            params,
            root_cert: root_cert.into(),
            validators,
            nodes,
        }
    }
}

/// Validator-set change handed to the consensus engine at initialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pub_key: ConsensusPubKey,
    pub power: u64,
}

/// Validator record for the consensus engine's own genesis document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidator {
    pub pub_key: ConsensusPubKey,
    pub power: u64,
    pub name: String,
}
