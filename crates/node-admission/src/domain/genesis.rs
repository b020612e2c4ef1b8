//! # Genesis Derivations
//!
//! Pure transforms used by initialization and export: admitting a single
//! validator (key transcoding, id decoding, address derivation) and building
//! the consensus engine's genesis validator list.
//!
//! Admission failures here are fatal. The genesis-validator list is built
//! leniently: entries whose key cannot be decoded are left out.

use super::address::ConsensusAddress;
use super::entities::{GenesisValidator, Validator, ValidatorUpdate};
use super::errors::FatalError;
use super::keys::KeyTranscoder;
use tracing::warn;

/// A validator ready to be persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdmittedValidator {
    /// The record with its pubkey replaced by the canonical form.
    pub record: Validator,
    /// Decoded identifier, used as the store and index key.
    pub id: Vec<u8>,
    /// Consensus address of the validator key.
    pub address: ConsensusAddress,
    /// Update record for the consensus engine.
    pub update: ValidatorUpdate,
}

/// Transcode, decode and derive everything initialization needs for `val`.
pub fn admit_validator(
    val: &Validator,
    transcoder: &KeyTranscoder,
) -> Result<AdmittedValidator, FatalError> {
    let transcode_err = |source| FatalError::KeyTranscoding {
        id: val.id.clone(),
        source,
    };

    let canonical = transcoder.to_canonical(&val.pubkey).map_err(transcode_err)?;
    let pub_key = transcoder
        .decode_canonical(&canonical)
        .map_err(transcode_err)?;
    let id = val.id_bytes().map_err(|source| FatalError::InvalidHexId {
        id: val.id.clone(),
        source,
    })?;

    let mut record = val.clone();
    record.pubkey = canonical;

    Ok(AdmittedValidator {
        record,
        id,
        address: pub_key.address(),
        update: ValidatorUpdate {
            pub_key,
            power: val.power,
        },
    })
}

/// Build the consensus engine's genesis validator list from stored
/// (canonical-key) validators, skipping entries whose key does not decode.
pub fn derive_genesis_validators(
    validators: &[Validator],
    transcoder: &KeyTranscoder,
) -> Vec<GenesisValidator> {
    validators
        .iter()
        .filter_map(|val| match transcoder.decode_canonical(&val.pubkey) {
            Ok(pub_key) => Some(GenesisValidator {
                pub_key,
                power: val.power,
                name: val.name.clone(),
            }),
            Err(e) => {
                warn!(id = %val.id, name = %val.name, error = %e, "Skipping validator with undecodable consensus key");
                None
            }
        })
        .collect()
}
