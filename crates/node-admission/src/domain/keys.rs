//! # Consensus Key Transcoding
//!
//! The consensus engine ships validator keys as bech32-wrapped amino
//! structures: a 4-byte type prefix derived from the registered type name,
//! a uvarint length, then the raw key bytes. The application stores keys in
//! its own canonical string form.
//!
//! ## Algorithm Registry
//!
//! Supported algorithms form a closed set ([`KeyAlgorithm`]). A
//! [`KeyRegistry`] enables a subset of them and is handed to the
//! [`KeyTranscoder`] explicitly; there is no global registration state.
//!
//! ## Canonical Form
//!
//! The application registers the same amino names as the engine, so the
//! canonical form shares the wire layout and its codec delegates to the wire
//! one. Transcoding resolves the algorithm, checks the key material and
//! re-emits lowercase bech32. Anything that does not survive that path is rejected.

use super::address::{decode_bech32, encode_bech32, AddressConfig, ConsensusAddress};
use super::errors::KeyError;
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of the amino type prefix.
pub const AMINO_PREFIX_LEN: usize = 4;

/// Signature schemes a consensus key may use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    Ed25519,
    Secp256k1,
    Sr25519,
    Sm2,
}

impl KeyAlgorithm {
    /// Every algorithm the codec understands.
    pub const ALL: [KeyAlgorithm; 4] = [
        KeyAlgorithm::Ed25519,
        KeyAlgorithm::Secp256k1,
        KeyAlgorithm::Sr25519,
        KeyAlgorithm::Sm2,
    ];

    /// Registered amino type name.
    pub fn amino_name(&self) -> &'static str {
        match self {
            KeyAlgorithm::Ed25519 => "tendermint/PubKeyEd25519",
            KeyAlgorithm::Secp256k1 => "tendermint/PubKeySecp256k1",
            KeyAlgorithm::Sr25519 => "tendermint/PubKeySr25519",
            KeyAlgorithm::Sm2 => "tendermint/PubKeySm2",
        }
    }

    /// Public key length in bytes.
    pub fn key_len(&self) -> usize {
        match self {
            KeyAlgorithm::Ed25519 | KeyAlgorithm::Sr25519 => 32,
            KeyAlgorithm::Secp256k1 | KeyAlgorithm::Sm2 => 33,
        }
    }

    /// Amino type prefix for this algorithm.
    pub fn amino_prefix(&self) -> [u8; AMINO_PREFIX_LEN] {
        amino_prefix(self.amino_name())
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyAlgorithm::Ed25519 => "ed25519",
            KeyAlgorithm::Secp256k1 => "secp256k1",
            KeyAlgorithm::Sr25519 => "sr25519",
            KeyAlgorithm::Sm2 => "sm2",
        };
        f.write_str(name)
    }
}

impl FromStr for KeyAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ed25519" => Ok(KeyAlgorithm::Ed25519),
            "secp256k1" => Ok(KeyAlgorithm::Secp256k1),
            "sr25519" => Ok(KeyAlgorithm::Sr25519),
            "sm2" => Ok(KeyAlgorithm::Sm2),
            other => Err(format!("unknown key algorithm: {other}")),
        }
    }
}

/// Compute the amino prefix bytes for a registered type name.
///
/// `sha256(name)`, skip leading zero bytes, drop the 3 disambiguation bytes,
/// skip leading zero bytes again, take 4.
pub fn amino_prefix(name: &str) -> [u8; AMINO_PREFIX_LEN] {
    let digest = Sha256::digest(name.as_bytes());
    let mut rest: &[u8] = digest.as_slice();
    while rest.first() == Some(&0) {
        rest = &rest[1..];
    }
    rest = &rest[3..];
    while rest.first() == Some(&0) {
        rest = &rest[1..];
    }

    let mut prefix = [0u8; AMINO_PREFIX_LEN];
    prefix.copy_from_slice(&rest[..AMINO_PREFIX_LEN]);
    prefix
}

// =============================================================================
// REGISTRY
// =============================================================================

/// The set of algorithms a transcoder will resolve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRegistry {
    entries: Vec<(KeyAlgorithm, [u8; AMINO_PREFIX_LEN])>,
}

impl KeyRegistry {
    /// Registry enabling exactly `algorithms` (duplicates ignored).
    pub fn new(algorithms: &[KeyAlgorithm]) -> Self {
        let mut entries: Vec<_> = Vec::with_capacity(algorithms.len());
        for algorithm in algorithms {
            if !entries.iter().any(|(a, _)| a == algorithm) {
                entries.push((*algorithm, algorithm.amino_prefix()));
            }
        }
        Self { entries }
    }

    pub fn algorithms(&self) -> impl Iterator<Item = KeyAlgorithm> + '_ {
        self.entries.iter().map(|(a, _)| *a)
    }

    pub fn is_enabled(&self, algorithm: KeyAlgorithm) -> bool {
        self.entries.iter().any(|(a, _)| *a == algorithm)
    }

    /// Resolve an amino prefix to an enabled algorithm.
    pub fn resolve(&self, prefix: [u8; AMINO_PREFIX_LEN]) -> Result<KeyAlgorithm, KeyError> {
        if let Some((algorithm, _)) = self.entries.iter().find(|(_, p)| *p == prefix) {
            return Ok(*algorithm);
        }
        match KeyAlgorithm::ALL.iter().find(|a| a.amino_prefix() == prefix) {
            Some(known) => Err(KeyError::UnsupportedAlgorithm(*known)),
            None => Err(KeyError::UnknownAlgorithm(prefix)),
        }
    }

    fn prefix_of(&self, algorithm: KeyAlgorithm) -> Result<[u8; AMINO_PREFIX_LEN], KeyError> {
        self.entries
            .iter()
            .find(|(a, _)| *a == algorithm)
            .map(|(_, p)| *p)
            .ok_or(KeyError::UnsupportedAlgorithm(algorithm))
    }
}

impl Default for KeyRegistry {
    fn default() -> Self {
        Self::new(&KeyAlgorithm::ALL)
    }
}

// =============================================================================
// CONSENSUS PUBLIC KEY
// =============================================================================

/// A validated consensus public key, as handed to the consensus engine.
///
/// Serializes as `{"type": <amino name>, "value": <hex key bytes>}`;
/// deserializing re-checks the key material.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "TaggedKey", try_from = "TaggedKey")]
pub enum ConsensusPubKey {
    Ed25519([u8; 32]),
    Secp256k1([u8; 33]),
    Sr25519([u8; 32]),
    Sm2([u8; 33]),
}

#[serde_as]
#[derive(Serialize, Deserialize)]
struct TaggedKey {
    #[serde(rename = "type")]
    kind: String,
    #[serde_as(as = "Hex")]
    value: Vec<u8>,
}

impl From<ConsensusPubKey> for TaggedKey {
    fn from(key: ConsensusPubKey) -> Self {
        Self {
            kind: key.algorithm().amino_name().to_string(),
            value: key.as_bytes().to_vec(),
        }
    }
}

impl TryFrom<TaggedKey> for ConsensusPubKey {
    type Error = String;

    fn try_from(tagged: TaggedKey) -> Result<Self, Self::Error> {
        let algorithm = KeyAlgorithm::ALL
            .into_iter()
            .find(|a| a.amino_name() == tagged.kind)
            .ok_or_else(|| format!("unknown key type {}", tagged.kind))?;
        Self::from_raw(algorithm, &tagged.value).map_err(|e| e.to_string())
    }
}

impl ConsensusPubKey {
    /// Build a key from raw bytes, checking length and key material.
    pub fn from_raw(algorithm: KeyAlgorithm, bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != algorithm.key_len() {
            return Err(KeyError::InvalidLength {
                algorithm,
                expected: algorithm.key_len(),
                actual: bytes.len(),
            });
        }

        let invalid = |reason: String| KeyError::InvalidKeyMaterial { algorithm, reason };

        match algorithm {
            KeyAlgorithm::Ed25519 => {
                let mut key = [0u8; 32];
                key.copy_from_slice(bytes);
                ed25519_dalek::VerifyingKey::from_bytes(&key)
                    .map_err(|e| invalid(e.to_string()))?;
                Ok(ConsensusPubKey::Ed25519(key))
            }
            KeyAlgorithm::Secp256k1 => {
                k256::PublicKey::from_sec1_bytes(bytes).map_err(|e| invalid(e.to_string()))?;
                let mut key = [0u8; 33];
                key.copy_from_slice(bytes);
                Ok(ConsensusPubKey::Secp256k1(key))
            }
            KeyAlgorithm::Sr25519 => {
                let mut key = [0u8; 32];
                key.copy_from_slice(bytes);
                Ok(ConsensusPubKey::Sr25519(key))
            }
            KeyAlgorithm::Sm2 => {
                if !matches!(bytes[0], 0x02 | 0x03) {
                    return Err(invalid(format!(
                        "expected compressed point tag 0x02 or 0x03, got {:#04x}",
                        bytes[0]
                    )));
                }
                let mut key = [0u8; 33];
                key.copy_from_slice(bytes);
                Ok(ConsensusPubKey::Sm2(key))
            }
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            ConsensusPubKey::Ed25519(_) => KeyAlgorithm::Ed25519,
            ConsensusPubKey::Secp256k1(_) => KeyAlgorithm::Secp256k1,
            ConsensusPubKey::Sr25519(_) => KeyAlgorithm::Sr25519,
            ConsensusPubKey::Sm2(_) => KeyAlgorithm::Sm2,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ConsensusPubKey::Ed25519(k) | ConsensusPubKey::Sr25519(k) => k.as_slice(),
            ConsensusPubKey::Secp256k1(k) | ConsensusPubKey::Sm2(k) => k.as_slice(),
        }
    }

    /// Derive the 20-byte consensus address.
    ///
    /// secp256k1 uses `ripemd160(sha256(key))`; the others truncate
    /// `sha256(key)`.
    pub fn address(&self) -> ConsensusAddress {
        let mut out = [0u8; 20];
        match self {
            ConsensusPubKey::Secp256k1(key) => {
                let sha = Sha256::digest(key);
                out.copy_from_slice(&Ripemd160::digest(sha));
            }
            _ => {
                let sha = Sha256::digest(self.as_bytes());
                out.copy_from_slice(&sha[..20]);
            }
        }
        ConsensusAddress(out)
    }

    /// Amino binary encoding: prefix, uvarint length, key bytes.
    pub fn to_amino(&self, registry: &KeyRegistry) -> Result<Vec<u8>, KeyError> {
        let prefix = registry.prefix_of(self.algorithm())?;
        let key = self.as_bytes();

        let mut out = Vec::with_capacity(AMINO_PREFIX_LEN + 1 + key.len());
        out.extend_from_slice(&prefix);
        put_uvarint(&mut out, key.len() as u64);
        out.extend_from_slice(key);
        Ok(out)
    }

    /// Parse an amino binary encoding, resolving the prefix in `registry`.
    pub fn from_amino(bytes: &[u8], registry: &KeyRegistry) -> Result<Self, KeyError> {
        if bytes.len() < AMINO_PREFIX_LEN {
            return Err(KeyError::Truncated);
        }
        let mut prefix = [0u8; AMINO_PREFIX_LEN];
        prefix.copy_from_slice(&bytes[..AMINO_PREFIX_LEN]);
        let algorithm = registry.resolve(prefix)?;

        let rest = &bytes[AMINO_PREFIX_LEN..];
        let (len, consumed) = read_uvarint(rest)?;
        let body = &rest[consumed..];
        let len = usize::try_from(len).map_err(|_| KeyError::Truncated)?;
        if body.len() < len {
            return Err(KeyError::Truncated);
        }
        if body.len() > len {
            return Err(KeyError::TrailingBytes(body.len() - len));
        }

        Self::from_raw(algorithm, body)
    }
}

fn put_uvarint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn read_uvarint(bytes: &[u8]) -> Result<(u64, usize), KeyError> {
    let mut value = 0u64;
    for (i, byte) in bytes.iter().enumerate().take(10) {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(KeyError::Truncated)
}

// =============================================================================
// TRANSCODER
// =============================================================================

/// Converts between wire-encoded and canonical consensus key strings.
#[derive(Clone, Debug, Default)]
pub struct KeyTranscoder {
    registry: KeyRegistry,
    address: AddressConfig,
}

impl KeyTranscoder {
    pub fn new(registry: KeyRegistry, address: AddressConfig) -> Self {
        Self { registry, address }
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    pub fn address_config(&self) -> &AddressConfig {
        &self.address
    }

    /// Decode a bech32 consensus-engine key.
    pub fn decode_wire(&self, wire: &str) -> Result<ConsensusPubKey, KeyError> {
        let bytes = decode_bech32(wire, &self.address.consensus_pubkey_prefix)?;
        ConsensusPubKey::from_amino(&bytes, &self.registry)
    }

    /// Encode a key in the consensus-engine wire form.
    pub fn encode_wire(&self, key: &ConsensusPubKey) -> Result<String, KeyError> {
        let bytes = key.to_amino(&self.registry)?;
        encode_bech32(&self.address.consensus_pubkey_prefix, &bytes)
    }

    /// Decode an application canonical key.
    pub fn decode_canonical(&self, canonical: &str) -> Result<ConsensusPubKey, KeyError> {
        self.decode_wire(canonical)
    }

    /// Encode a key in the application canonical form.
    pub fn encode_canonical(&self, key: &ConsensusPubKey) -> Result<String, KeyError> {
        self.encode_wire(key)
    }

    /// Wire key string to canonical key string.
    pub fn to_canonical(&self, wire: &str) -> Result<String, KeyError> {
        let key = self.decode_wire(wire)?;
        self.encode_canonical(&key)
    }

    /// Canonical key string back to wire key string.
    pub fn from_canonical(&self, canonical: &str) -> Result<String, KeyError> {
        let key = self.decode_canonical(canonical)?;
        self.encode_wire(&key)
    }

    /// Consensus address of a canonical key.
    pub fn consensus_address(&self, canonical: &str) -> Result<ConsensusAddress, KeyError> {
        Ok(self.decode_canonical(canonical)?.address())
    }
}
