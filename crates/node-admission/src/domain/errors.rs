//! # Admission Errors
//!
//! Two tiers of failure:
//!
//! - [`ValidationError`]: a genesis document was rejected. Returned as a value
//!   before any state is touched; the caller decides what to do with it.
//! - [`FatalError`]: genesis execution itself cannot proceed identically on
//!   every node. Binaries log it and terminate.
//!
//! The lower-level [`CertificateError`], [`KeyError`] and [`StoreError`] are
//! wrapped by whichever tier surfaces them.

use super::keys::KeyAlgorithm;
use thiserror::Error;

/// Certificate parsing and chain-of-trust failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CertificateError {
    /// Input is not a PEM block.
    #[error("malformed PEM: {0}")]
    MalformedPem(String),

    /// PEM block is not labelled as a certificate.
    #[error("unexpected PEM label: {0}")]
    UnexpectedLabel(String),

    /// DER payload is not a valid X.509 certificate.
    #[error("malformed X.509 certificate: {0}")]
    MalformedDer(String),

    /// Leaf issuer does not name the root subject.
    #[error("issuer {issuer} does not match root subject {root}")]
    IssuerMismatch { issuer: String, root: String },

    /// Root carries a basic-constraints extension that forbids signing.
    #[error("root certificate is not a certificate authority")]
    NotCertificateAuthority,

    /// Root key usage does not include keyCertSign.
    #[error("root certificate key usage does not permit certificate signing")]
    MissingKeyCertSign,

    /// Leaf signature does not verify under the root public key.
    #[error("signature verification failed: {0}")]
    BadSignature(String),

    /// Certificate is outside its validity window.
    #[error("certificate {subject} not valid at {at} (valid {not_before}..={not_after})")]
    OutsideValidity {
        subject: String,
        at: i64,
        not_before: i64,
        not_after: i64,
    },
}

/// Consensus key decoding and encoding failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    /// The bech32 wrapper is invalid.
    #[error("invalid bech32 string: {0}")]
    Bech32(String),

    /// The bech32 human-readable part is not the expected prefix.
    #[error("invalid bech32 prefix: expected {expected}, got {actual}")]
    PrefixMismatch { expected: String, actual: String },

    /// The amino type prefix is not one of the known algorithms.
    #[error("unregistered key type prefix {}", hex::encode(.0))]
    UnknownAlgorithm([u8; 4]),

    /// The algorithm is known but not enabled in this registry.
    #[error("key algorithm {0} is not enabled")]
    UnsupportedAlgorithm(KeyAlgorithm),

    /// Input ended before a complete key structure was read.
    #[error("truncated key encoding")]
    Truncated,

    /// Bytes remain after the key structure.
    #[error("{0} trailing bytes after key encoding")]
    TrailingBytes(usize),

    /// Key material has the wrong length for its algorithm.
    #[error("invalid {algorithm} key length: expected {expected}, got {actual}")]
    InvalidLength {
        algorithm: KeyAlgorithm,
        expected: usize,
        actual: usize,
    },

    /// Key material is the right length but not a valid public key.
    #[error("invalid {algorithm} key material: {reason}")]
    InvalidKeyMaterial {
        algorithm: KeyAlgorithm,
        reason: String,
    },
}

/// Store record failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A record could not be encoded or decoded.
    #[error("store codec error: {0}")]
    Codec(String),
}

/// A genesis document violates an admission invariant.
///
/// Raised before any mutation. Each variant carries enough context to locate
/// the offending entry in the document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("root certificate is not set in genesis state")]
    MissingRootCertificate,

    #[error("invalid root certificate in genesis state: {0}")]
    InvalidRootCertificate(CertificateError),

    #[error("invalid certificate for validator {name} ({id}): {source}")]
    InvalidCertificate {
        id: String,
        name: String,
        source: CertificateError,
    },

    #[error("duplicate validator id in genesis state: id {id}, pubkey {pubkey}")]
    DuplicateId { id: String, pubkey: String },

    #[error("duplicate validator name in genesis state: id {id}, name {name}")]
    DuplicateName { id: String, name: String },

    #[error("duplicate validator pubkey in genesis state: id {id}, pubkey {pubkey}")]
    DuplicatePubkey { id: String, pubkey: String },

    #[error("validator is jailed in genesis state: name {name}, id {id}")]
    JailedValidator { id: String, name: String },

    #[error("invalid node {id}: {reason}")]
    InvalidNode { id: String, reason: String },
}

/// Genesis execution cannot continue deterministically.
#[derive(Debug, Error)]
pub enum FatalError {
    /// `initialize` re-validates its input; a rejection there is terminal.
    #[error("genesis validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A validator pubkey could not be transcoded.
    #[error("failed to transcode pubkey of validator {id}: {source}")]
    KeyTranscoding { id: String, source: KeyError },

    /// A validator or node id is not valid hex.
    #[error("invalid hex identifier {id}: {source}")]
    InvalidHexId {
        id: String,
        source: hex::FromHexError,
    },

    /// A store operation failed while populating or reading genesis state.
    #[error("store failure during genesis: {0}")]
    Store(#[from] StoreError),
}
