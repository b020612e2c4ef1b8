//! # Node Admission
//!
//! Genesis admission for the initial validator and node set of a
//! permissioned chain. Every node runs this once, before consensus starts,
//! and must reach byte-identical store state and the same success/failure
//! outcome.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): key transcoding, certificate checks,
//!   genesis validation; pure, no I/O
//! - **Ports Layer** (`ports/`): inbound API and outbound store/clock traits
//! - **Service Layer** (`service.rs`): wires domain logic to ports
//! - **Adapters** (`adapters/`): key-value backed store, clocks, JSON loader
//!
//! ## Error Tiers
//!
//! - [`ValidationError`]: the genesis document is rejected; nothing was written.
//! - [`FatalError`]: initialization cannot proceed identically everywhere;
//!   the embedding process must stop.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::{
    load_genesis, write_genesis, FixedTimeSource, GenesisFileError, InMemoryKVStore, KvNodeStore,
    SystemTimeSource,
};
pub use config::AdmissionConfig;
pub use domain::address::{AddressConfig, ConsensusAddress};
pub use domain::certificate::{verify_chain, verify_pem_chain, Certificate};
pub use domain::entities::{
    GenesisState, GenesisValidator, Node, Params, Validator, ValidatorUpdate, NODE_ID_LEN,
};
pub use domain::errors::{CertificateError, FatalError, KeyError, StoreError, ValidationError};
pub use domain::genesis::derive_genesis_validators;
pub use domain::keys::{ConsensusPubKey, KeyAlgorithm, KeyRegistry, KeyTranscoder};
pub use domain::validation::validate_genesis;
pub use ports::inbound::{AdmissionQueryApi, GenesisApi};
pub use ports::outbound::{KeyValueStore, NodeStore, TimeSource};
pub use service::GenesisService;
