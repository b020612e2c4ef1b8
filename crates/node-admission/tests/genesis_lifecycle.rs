//! End-to-end genesis lifecycle: validate, initialize, export.
//!
//! Exercises the public API only, the way the node runtime drives it.

use node_admission::{
    AdmissionConfig, AdmissionQueryApi, ConsensusPubKey, FatalError, FixedTimeSource, GenesisApi,
    GenesisService, GenesisState, InMemoryKVStore, KeyTranscoder, KeyValueStore, KvNodeStore, Node,
    Params, ValidationError, Validator,
};
use rcgen::{BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair};
use std::collections::HashSet;

const NOW: i64 = 1_700_000_000;

type Service = GenesisService<KvNodeStore<InMemoryKVStore>>;

struct Authority {
    cert: rcgen::Certificate,
    key: KeyPair,
}

impl Authority {
    fn new(common_name: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, common_name);
        params.distinguished_name = dn;
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let cert = params.self_signed(&key).unwrap();
        Self { cert, key }
    }

    fn issue(&self, common_name: &str) -> String {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, common_name);
        params.distinguished_name = dn;
        params.signed_by(&key, &self.cert, &self.key).unwrap().pem()
    }
}

fn ed25519(seed: u8) -> ConsensusPubKey {
    let signing = ed25519_dalek::SigningKey::from_bytes(&[seed; 32]);
    ConsensusPubKey::Ed25519(signing.verifying_key().to_bytes())
}

fn service() -> Service {
    GenesisService::new(
        KvNodeStore::new(InMemoryKVStore::new()),
        KeyTranscoder::default(),
        Box::new(FixedTimeSource(NOW)),
    )
}

fn genesis_with(root: &Authority, count: u8) -> GenesisState {
    let transcoder = KeyTranscoder::default();
    let validators = (1..=count)
        .map(|n| {
            let val = Validator::new(
                hex::encode([n; 32]),
                format!("validator-{n}"),
                transcoder.encode_wire(&ed25519(n)).unwrap(),
                u64::from(n) * 100,
            );
            if n % 2 == 0 {
                val.with_certificate(root.issue(&format!("validator-{n}")))
            } else {
                val
            }
        })
        .collect();
    let nodes = (1..=count)
        .map(|n| Node::new(hex::encode([n; 20]), format!("node-{n}")))
        .collect();
    GenesisState::new(root.cert.pem(), Params::default(), validators, nodes)
}

#[test]
fn n_valid_validators_produce_n_updates_in_order() {
    let root = Authority::new("Consortium Root");
    let genesis = genesis_with(&root, 6);
    let mut svc = service();

    svc.validate_genesis(&genesis).unwrap();
    let updates = svc.init_genesis(&genesis).unwrap();

    assert_eq!(updates.len(), 6);
    for (n, update) in (1u8..).zip(&updates) {
        assert_eq!(update.pub_key, ed25519(n));
        assert_eq!(update.power, u64::from(n) * 100);
    }
}

#[test]
fn export_reconstructs_initialized_state() {
    let root = Authority::new("Consortium Root");
    let genesis = genesis_with(&root, 5);
    let mut svc = service();
    svc.init_genesis(&genesis).unwrap();

    let exported = svc.export_genesis().unwrap();
    let transcoder = KeyTranscoder::default();

    let expected: HashSet<Validator> = genesis
        .validators
        .iter()
        .map(|v| {
            let mut v = v.clone();
            v.pubkey = transcoder.to_canonical(&v.pubkey).unwrap();
            v
        })
        .collect();
    let actual: HashSet<Validator> = exported.validators.iter().cloned().collect();
    assert_eq!(actual, expected);

    let expected_nodes: HashSet<Node> = genesis.nodes.iter().cloned().collect();
    let actual_nodes: HashSet<Node> = exported.nodes.iter().cloned().collect();
    assert_eq!(actual_nodes, expected_nodes);

    assert_eq!(exported.root_cert, genesis.root_cert);
    assert_eq!(exported.params, genesis.params);

    // The exported snapshot is itself admissible.
    service().validate_genesis(&exported).unwrap();
}

#[test]
fn independent_nodes_reach_identical_state() {
    let root = Authority::new("Consortium Root");
    let genesis = genesis_with(&root, 4);

    let mut first = service();
    let mut second = service();
    let first_updates = first.init_genesis(&genesis).unwrap();
    let second_updates = second.init_genesis(&genesis).unwrap();

    assert_eq!(first_updates, second_updates);
    assert_eq!(
        first.store().inner().prefix_scan(&[]).unwrap(),
        second.store().inner().prefix_scan(&[]).unwrap()
    );
}

#[test]
fn duplicate_id_never_reaches_the_store() {
    let root = Authority::new("Consortium Root");
    let mut genesis = genesis_with(&root, 3);
    genesis.validators[2].id = genesis.validators[0].id.clone();

    let mut svc = service();
    assert!(matches!(
        svc.validate_genesis(&genesis),
        Err(ValidationError::DuplicateId { .. })
    ));
    assert!(matches!(
        svc.init_genesis(&genesis),
        Err(FatalError::Validation(ValidationError::DuplicateId { .. }))
    ));
    assert!(svc.store().inner().is_empty());
}

#[test]
fn certificate_from_foreign_root_is_rejected() {
    let root = Authority::new("Consortium Root");
    let foreign = Authority::new("Foreign Root");
    let mut genesis = genesis_with(&root, 3);
    genesis.validators[0].certificate = foreign.issue("validator-1");

    match service().validate_genesis(&genesis) {
        Err(ValidationError::InvalidCertificate { id, .. }) => {
            assert_eq!(id, genesis.validators[0].id);
        }
        other => panic!("expected certificate error, got {other:?}"),
    }
}

#[test]
fn jailed_validator_is_rejected() {
    let root = Authority::new("Consortium Root");
    let mut genesis = genesis_with(&root, 2);
    genesis.validators[1].jailed = true;
    assert!(matches!(
        service().validate_genesis(&genesis),
        Err(ValidationError::JailedValidator { .. })
    ));
}

#[test]
fn genesis_validator_list_from_initialized_store() {
    let root = Authority::new("Consortium Root");
    let genesis = genesis_with(&root, 3);
    let mut svc = service();
    svc.init_genesis(&genesis).unwrap();

    let vals = svc.write_validators().unwrap();
    let names: Vec<_> = vals.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["validator-3", "validator-2", "validator-1"]);
}

#[test]
fn genesis_document_json_round_trip() {
    let root = Authority::new("Consortium Root");
    let genesis = genesis_with(&root, 2);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("genesis.json");
    node_admission::write_genesis(&path, &genesis).unwrap();
    let loaded = node_admission::load_genesis(&path).unwrap();

    assert_eq!(loaded, genesis);
}

#[test]
fn configured_prefix_flows_through_transcoding() {
    let config = AdmissionConfig {
        address: node_admission::AddressConfig::from_main_prefix("iaa"),
        verification_time: Some(NOW),
        ..Default::default()
    };
    let transcoder = config.transcoder();
    let wire = transcoder.encode_wire(&ed25519(1)).unwrap();
    assert!(wire.starts_with("iaavalconspub1"));

    let root = Authority::new("Consortium Root");
    let genesis = GenesisState::new(
        root.cert.pem(),
        Params::default(),
        vec![Validator::new(hex::encode([1u8; 32]), "v", wire, 1)],
        vec![],
    );

    let mut svc = GenesisService::from_config(KvNodeStore::new(InMemoryKVStore::new()), &config);
    assert_eq!(svc.init_genesis(&genesis).unwrap().len(), 1);

    // The default (cosmos) prefix cannot read an iaa-prefixed key.
    assert!(matches!(
        service().init_genesis(&genesis),
        Err(FatalError::KeyTranscoding { .. })
    ));
}

#[test]
fn node_sharing_a_validator_id_resolves_its_consensus_address() {
    let root = Authority::new("Consortium Root");
    let transcoder = KeyTranscoder::default();
    let id = hex::encode([7u8; 20]);
    let key = ed25519(7);

    let genesis = GenesisState::new(
        root.cert.pem(),
        Params::default(),
        vec![Validator::new(
            id.clone(),
            "validator-7",
            transcoder.encode_wire(&key).unwrap(),
            70,
        )],
        vec![Node::new(id.clone(), "node-7")],
    );

    let mut svc = service();
    svc.init_genesis(&genesis).unwrap();

    let node = svc.node(&id).unwrap().unwrap();
    assert_eq!(svc.consensus_address(&node.id).unwrap(), Some(key.address()));
    assert_eq!(svc.validator(&node.id).unwrap().unwrap().name, "validator-7");
}

#[test]
fn ids_differing_only_in_case_are_one_identity() {
    let root = Authority::new("Consortium Root");
    let mut genesis = genesis_with(&root, 2);
    genesis.validators[0].id = "ab".repeat(32);
    genesis.validators[1].id = "AB".repeat(32);

    let mut svc = service();
    assert!(matches!(
        svc.init_genesis(&genesis),
        Err(FatalError::Validation(ValidationError::DuplicateId { .. }))
    ));
    assert!(svc.store().inner().is_empty());
}

#[test]
fn same_key_in_upper_and_lower_case_is_a_duplicate() {
    let root = Authority::new("Consortium Root");
    let mut genesis = genesis_with(&root, 2);
    genesis.validators[1].pubkey = genesis.validators[0].pubkey.to_uppercase();

    assert!(matches!(
        service().validate_genesis(&genesis),
        Err(ValidationError::DuplicatePubkey { .. })
    ));
}
