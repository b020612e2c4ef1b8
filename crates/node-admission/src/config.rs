//! # Admission Configuration
//!
//! Network address prefixes, the enabled key algorithms and the instant
//! certificates are verified at. Defaults are overridable from the
//! environment:
//!
//! - `ADMISSION_BECH32_PREFIX`: network main prefix (e.g. `iaa`)
//! - `ADMISSION_ALGORITHMS`: comma-separated list (e.g. `ed25519,sm2`)
//! - `ADMISSION_VERIFY_TIME`: unix seconds to pin certificate checks to

use crate::adapters::time::{FixedTimeSource, SystemTimeSource};
use crate::domain::address::AddressConfig;
use crate::domain::keys::{KeyAlgorithm, KeyRegistry, KeyTranscoder};
use crate::ports::outbound::TimeSource;
use tracing::{info, warn};

pub const ENV_BECH32_PREFIX: &str = "ADMISSION_BECH32_PREFIX";
pub const ENV_ALGORITHMS: &str = "ADMISSION_ALGORITHMS";
pub const ENV_VERIFY_TIME: &str = "ADMISSION_VERIFY_TIME";

/// Complete admission configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionConfig {
    /// Bech32 prefixes for consensus keys and addresses.
    pub address: AddressConfig,
    /// Key algorithms the transcoder resolves.
    pub algorithms: Vec<KeyAlgorithm>,
    /// Pinned certificate verification time. `None` uses the system clock.
    pub verification_time: Option<i64>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            address: AddressConfig::default(),
            algorithms: KeyAlgorithm::ALL.to_vec(),
            verification_time: None,
        }
    }
}

impl AdmissionConfig {
    /// Defaults overridden by `ADMISSION_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(prefix) = lookup(ENV_BECH32_PREFIX) {
            let prefix = prefix.trim();
            if prefix.is_empty() {
                warn!("{} is empty, keeping default prefix", ENV_BECH32_PREFIX);
            } else {
                config.address = AddressConfig::from_main_prefix(prefix);
                info!(prefix, "Loaded bech32 prefix from environment");
            }
        }

        if let Some(list) = lookup(ENV_ALGORITHMS) {
            match list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse)
                .collect::<Result<Vec<KeyAlgorithm>, _>>()
            {
                Ok(algorithms) if !algorithms.is_empty() => config.algorithms = algorithms,
                Ok(_) => warn!("{} lists no algorithms, keeping defaults", ENV_ALGORITHMS),
                Err(e) => warn!("{} is invalid ({}), keeping defaults", ENV_ALGORITHMS, e),
            }
        }

        if let Some(time) = lookup(ENV_VERIFY_TIME) {
            match time.trim().parse::<i64>() {
                Ok(t) => config.verification_time = Some(t),
                Err(_) => warn!("{} must be unix seconds, ignoring", ENV_VERIFY_TIME),
            }
        }

        config
    }

    pub fn transcoder(&self) -> KeyTranscoder {
        KeyTranscoder::new(KeyRegistry::new(&self.algorithms), self.address.clone())
    }

    pub fn time_source(&self) -> Box<dyn TimeSource> {
        match self.verification_time {
            Some(t) => Box::new(FixedTimeSource(t)),
            None => Box::new(SystemTimeSource),
        }
    }
}
