//! # Adapters Module
//!
//! Infrastructure adapters implementing the outbound ports, plus the JSON
//! genesis document loader.

pub mod genesis_file;
pub mod kv_store;
pub mod memory;
pub mod time;

pub use genesis_file::{load_genesis, write_genesis, GenesisFileError};
pub use kv_store::KvNodeStore;
pub use memory::InMemoryKVStore;
pub use time::{FixedTimeSource, SystemTimeSource};
