//! # genesis-admit
//!
//! Operator tool for a genesis document: checks it exactly as a node would,
//! dry-runs initialization against an in-memory store and transcodes
//! consensus keys.
//!
//! Exit status: `0` on success, `1` when the document is rejected or cannot
//! be read, `2` when initialization hits a fatal error.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_admission::{
    load_genesis, write_genesis, AddressConfig, AdmissionConfig, FatalError, GenesisApi,
    GenesisService, GenesisState, InMemoryKVStore, KvNodeStore, ValidationError,
};

/// Genesis admission operator tool
#[derive(Parser, Debug)]
#[command(name = "genesis-admit")]
#[command(about = "Validate, dry-run and export a genesis validator/node set")]
struct Args {
    /// Bech32 main prefix, e.g. `iaa` (overrides ADMISSION_BECH32_PREFIX)
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Unix seconds to verify certificates at (overrides ADMISSION_VERIFY_TIME)
    #[arg(long, global = true)]
    verify_time: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a genesis document without touching any store
    Validate {
        genesis: PathBuf,
    },

    /// Initialize an in-memory store and print the validator updates
    Init {
        genesis: PathBuf,

        /// Write the updates here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Initialize, then print the genesis reconstructed from the store
    Export {
        genesis: PathBuf,

        /// Write the exported genesis here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show the canonical form and consensus address of a wire key
    Transcode {
        key: String,
    },
}

#[derive(Debug, Serialize)]
struct TranscodeReport {
    algorithm: String,
    wire: String,
    canonical: String,
    address: String,
}

type Service = GenesisService<KvNodeStore<InMemoryKVStore>>;

fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to install log subscriber: {}", e);
    }

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

fn exit_status(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<FatalError>().is_some() {
        2
    } else {
        1
    }
}

fn load_config(args: &Args) -> AdmissionConfig {
    let mut config = AdmissionConfig::from_env();
    if let Some(prefix) = &args.prefix {
        config.address = AddressConfig::from_main_prefix(prefix);
    }
    if let Some(at) = args.verify_time {
        config.verification_time = Some(at);
    }
    config
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args);

    match &args.command {
        Command::Validate { genesis } => {
            let genesis = read(genesis)?;
            validate(&config, &genesis)?;
            println!("ok");
        }
        Command::Init { genesis, out } => {
            let genesis = read(genesis)?;
            let mut service = service(&config);
            let updates = service.init_genesis(&genesis)?;
            emit(&serde_json::to_string_pretty(&updates)?, out.as_deref())?;
        }
        Command::Export { genesis, out } => {
            let genesis = read(genesis)?;
            let mut service = service(&config);
            service.init_genesis(&genesis)?;
            let exported = service.export_genesis()?;
            match out {
                Some(path) => write_genesis(path, &exported)?,
                None => println!("{}", serde_json::to_string_pretty(&exported)?),
            }
        }
        Command::Transcode { key } => {
            let report = transcode(&config, key)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn read(path: &Path) -> Result<GenesisState> {
    let genesis = load_genesis(path)?;
    info!(
        path = %path.display(),
        validators = genesis.validators.len(),
        nodes = genesis.nodes.len(),
        "Loaded genesis document"
    );
    Ok(genesis)
}

fn service(config: &AdmissionConfig) -> Service {
    GenesisService::from_config(KvNodeStore::new(InMemoryKVStore::new()), config)
}

fn validate(config: &AdmissionConfig, genesis: &GenesisState) -> Result<(), ValidationError> {
    service(config).validate_genesis(genesis)
}

fn transcode(config: &AdmissionConfig, wire: &str) -> Result<TranscodeReport> {
    let transcoder = config.transcoder();
    let key = transcoder
        .decode_wire(wire)
        .with_context(|| format!("cannot decode consensus key {}", wire))?;
    let canonical = transcoder.encode_canonical(&key)?;
    let address = key.address().to_bech32(&config.address)?;

    Ok(TranscodeReport {
        algorithm: key.algorithm().to_string(),
        wire: transcoder.encode_wire(&key)?,
        canonical,
        address,
    })
}

fn emit(contents: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{}", contents);
            Ok(())
        }
    }
}
