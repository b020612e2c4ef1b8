//! # Bech32 Address Encoding
//!
//! Human-readable wrapping for consensus public keys and consensus addresses.
//! Prefixes follow the `<main>valconspub` / `<main>valcons` convention.

use super::errors::KeyError;
use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};

/// Default main prefix for the network.
pub const DEFAULT_MAIN_PREFIX: &str = "cosmos";

/// Length of a consensus address in bytes.
pub const CONSENSUS_ADDRESS_LEN: usize = 20;

/// Network address-encoding context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressConfig {
    /// Prefix for bech32-wrapped consensus public keys.
    pub consensus_pubkey_prefix: String,
    /// Prefix for bech32-wrapped consensus addresses.
    pub consensus_address_prefix: String,
}

impl AddressConfig {
    /// Derive both prefixes from a network main prefix.
    pub fn from_main_prefix(main: &str) -> Self {
        Self {
            consensus_pubkey_prefix: format!("{main}valconspub"),
            consensus_address_prefix: format!("{main}valcons"),
        }
    }
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self::from_main_prefix(DEFAULT_MAIN_PREFIX)
    }
}

/// Decode a bech32 string, requiring the given human-readable prefix.
pub fn decode_bech32(encoded: &str, expected_prefix: &str) -> Result<Vec<u8>, KeyError> {
    let checked = CheckedHrpstring::new::<Bech32>(encoded)
        .map_err(|e| KeyError::Bech32(e.to_string()))?;

    let hrp = checked.hrp();
    if !hrp.as_str().eq_ignore_ascii_case(expected_prefix) {
        return Err(KeyError::PrefixMismatch {
            expected: expected_prefix.to_string(),
            actual: hrp.as_str().to_string(),
        });
    }

    Ok(checked.byte_iter().collect())
}

/// Encode bytes as a lowercase bech32 string under `prefix`.
pub fn encode_bech32(prefix: &str, data: &[u8]) -> Result<String, KeyError> {
    let hrp = Hrp::parse(prefix).map_err(|e| KeyError::Bech32(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, data).map_err(|e| KeyError::Bech32(e.to_string()))
}

/// Consensus address of a validator key (20 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsensusAddress(pub [u8; CONSENSUS_ADDRESS_LEN]);

impl ConsensusAddress {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Render with the consensus-address prefix.
    pub fn to_bech32(&self, config: &AddressConfig) -> Result<String, KeyError> {
        encode_bech32(&config.consensus_address_prefix, &self.0)
    }

    /// Parse a bech32 consensus address.
    pub fn from_bech32(encoded: &str, config: &AddressConfig) -> Result<Self, KeyError> {
        let bytes = decode_bech32(encoded, &config.consensus_address_prefix)?;
        let array: [u8; CONSENSUS_ADDRESS_LEN] =
            bytes.as_slice().try_into().map_err(|_| KeyError::Bech32(format!(
                "consensus address must be {CONSENSUS_ADDRESS_LEN} bytes, got {}",
                bytes.len()
            )))?;
        Ok(Self(array))
    }
}

impl TryFrom<&[u8]> for ConsensusAddress {
    type Error = KeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; CONSENSUS_ADDRESS_LEN] =
            bytes.try_into().map_err(|_| KeyError::Truncated)?;
        Ok(Self(array))
    }
}
