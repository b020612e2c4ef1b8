//! # Genesis Validation
//!
//! Structural and trust invariants over a genesis snapshot. Fail-fast: the
//! first violation found, in document order, is the one reported.
//!
//! ## Invariants
//!
//! - A root certificate is present and parses.
//! - Every validator certificate that is present chains to the root.
//! - Validator ids, names and pubkeys are each unique. Ids and pubkeys
//!   are compared ignoring ASCII case.
//! - No validator is jailed.
//! - Every node passes its own self-check.

use super::certificate::{verify_chain, Certificate};
use super::entities::{GenesisState, Node, Validator};
use super::errors::ValidationError;
use std::collections::HashSet;
use tracing::debug;

/// Validate a genesis snapshot. Certificates are checked at `at` (unix seconds).
pub fn validate_genesis(genesis: &GenesisState, at: i64) -> Result<(), ValidationError> {
    if genesis.root_cert.is_empty() {
        return Err(ValidationError::MissingRootCertificate);
    }

    let root = Certificate::from_pem(genesis.root_cert.as_bytes())
        .map_err(ValidationError::InvalidRootCertificate)?;

    validate_validators(&root, &genesis.validators, at)?;
    validate_nodes(&genesis.nodes)?;

    debug!(
        validators = genesis.validators.len(),
        nodes = genesis.nodes.len(),
        "Genesis state validated"
    );
    Ok(())
}

fn validate_validators(
    root: &Certificate,
    validators: &[Validator],
    at: i64,
) -> Result<(), ValidationError> {
    let mut ids = HashSet::with_capacity(validators.len());
    let mut names = HashSet::with_capacity(validators.len());
    let mut pubkeys = HashSet::with_capacity(validators.len());

    for val in validators {
        if val.has_certificate() {
            let invalid = |source| ValidationError::InvalidCertificate {
                id: val.id.clone(),
                name: val.name.clone(),
                source,
            };
            let cert = Certificate::from_pem(val.certificate.as_bytes()).map_err(invalid)?;
            verify_chain(&cert, root, at).map_err(invalid)?;
        }

        // Hex ids and bech32 keys are case-insensitive.
        let id = val.id.to_ascii_lowercase();
        let pubkey = val.pubkey.to_ascii_lowercase();

        if ids.contains(&id) {
            return Err(ValidationError::DuplicateId {
                id: val.id.clone(),
                pubkey: val.pubkey.clone(),
            });
        }
        if names.contains(val.name.as_str()) {
            return Err(ValidationError::DuplicateName {
                id: val.id.clone(),
                name: val.name.clone(),
            });
        }
        if pubkeys.contains(&pubkey) {
            return Err(ValidationError::DuplicatePubkey {
                id: val.id.clone(),
                pubkey: val.pubkey.clone(),
            });
        }
        if val.jailed {
            return Err(ValidationError::JailedValidator {
                id: val.id.clone(),
                name: val.name.clone(),
            });
        }

        ids.insert(id);
        names.insert(val.name.as_str());
        pubkeys.insert(pubkey);
    }

    Ok(())
}

fn validate_nodes(nodes: &[Node]) -> Result<(), ValidationError> {
    nodes.iter().try_for_each(Node::validate)
}
