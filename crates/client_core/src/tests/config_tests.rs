use super::*;
use std::collections::HashMap;
use std::io::Write;

use alloy_primitives::address;

const GOVERNANCE: Address = address!("1111111111111111111111111111111111111111");
const NFT: Address = address!("2222222222222222222222222222222222222222");

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings(&dir.path().join("absent.toml")).expect("defaults");

    assert_eq!(settings, Settings::default());
    assert_eq!(settings.chain_id, 5);
    assert_eq!(settings.network_name, "goerli");
    assert_eq!(settings.fetch_concurrency, DEFAULT_FETCH_CONCURRENCY);
    assert!(settings.client_options().is_err());
}

#[test]
fn loads_partial_toml_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"
rpc_url = "https://rpc.example.org"
chain_id = 11155111
network_name = "sepolia"
governance_address = "0x1111111111111111111111111111111111111111"
nft_address = "0x2222222222222222222222222222222222222222"
receipt_poll_interval_ms = 250
"#
    )
    .expect("write config");

    let settings = load_settings(file.path()).expect("load");
    assert_eq!(settings.rpc_url, "https://rpc.example.org");
    assert_eq!(settings.network().chain_id, shared::domain::ChainId(11155111));
    assert_eq!(settings.receipt_timeout_secs, 300);
    assert_eq!(
        settings.confirmation().poll_interval,
        Duration::from_millis(250)
    );

    let options = settings.client_options().expect("options");
    assert_eq!(options.contracts.governance, GOVERNANCE);
    assert_eq!(options.contracts.membership_nft, NFT);
    assert_eq!(options.network.name, "sepolia");
}

#[test]
fn env_overrides_file_values() {
    let mut settings = Settings {
        governance_address: Some(GOVERNANCE),
        ..Settings::default()
    };
    apply_env_overrides(
        &mut settings,
        lookup(&[
            ("DAO_RPC_URL", "http://10.0.0.2:8545"),
            ("DAO_CHAIN_ID", " 1337 "),
            ("DAO_NFT_ADDRESS", "0x2222222222222222222222222222222222222222"),
            ("DAO_FETCH_CONCURRENCY", "8"),
        ]),
    )
    .expect("overrides");

    assert_eq!(settings.rpc_url, "http://10.0.0.2:8545");
    assert_eq!(settings.chain_id, 1337);
    assert_eq!(settings.governance_address, Some(GOVERNANCE));
    assert_eq!(settings.nft_address, Some(NFT));
    assert_eq!(settings.fetch_concurrency, 8);
}

#[test]
fn invalid_env_value_names_the_key() {
    let mut settings = Settings::default();
    let err = apply_env_overrides(&mut settings, lookup(&[("DAO_CHAIN_ID", "goerli")]))
        .expect_err("not a number");
    assert!(err.to_string().contains("DAO_CHAIN_ID"));

    let err = apply_env_overrides(&mut settings, lookup(&[("DAO_ACCOUNT", "0x1234")]))
        .expect_err("short address");
    assert!(err.to_string().contains("DAO_ACCOUNT"));
}

#[test]
fn malformed_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "chain_id = \"five\"").expect("write config");
    let err = load_settings(file.path()).expect_err("bad type");
    assert!(err.to_string().contains("invalid config file"));
}

#[test]
fn zero_concurrency_is_clamped() {
    let settings = Settings {
        governance_address: Some(GOVERNANCE),
        nft_address: Some(NFT),
        fetch_concurrency: 0,
        ..Settings::default()
    };
    assert_eq!(settings.client_options().expect("options").fetch_concurrency, 1);
}
