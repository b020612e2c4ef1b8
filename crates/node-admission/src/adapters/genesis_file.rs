//! JSON genesis document loading and writing.

use crate::domain::entities::GenesisState;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenesisFileError {
    #[error("failed to read genesis file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write genesis file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid genesis JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read a genesis snapshot from a JSON file.
pub fn load_genesis(path: &Path) -> Result<GenesisState, GenesisFileError> {
    let contents = fs::read_to_string(path).map_err(|source| GenesisFileError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write a genesis snapshot as pretty-printed JSON.
pub fn write_genesis(path: &Path, genesis: &GenesisState) -> Result<(), GenesisFileError> {
    let json = serde_json::to_string_pretty(genesis)?;
    fs::write(path, json).map_err(|source| GenesisFileError::Write {
        path: path.display().to_string(),
        source,
    })
}
