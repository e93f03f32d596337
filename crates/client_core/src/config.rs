use std::{fs, io, path::Path, str::FromStr, time::Duration};

use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::Deserialize;
use shared::domain::NetworkIdentity;

use crate::{
    client::{ClientOptions, ContractAddresses},
    ledger::ConfirmationPolicy,
    proposals::DEFAULT_FETCH_CONCURRENCY,
};

pub const DEFAULT_CONFIG_PATH: &str = "dao.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rpc_url: String,
    pub chain_id: u64,
    pub network_name: String,
    pub governance_address: Option<Address>,
    pub nft_address: Option<Address>,
    pub account: Option<Address>,
    pub fetch_concurrency: usize,
    pub receipt_poll_interval_ms: u64,
    pub receipt_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".into(),
            chain_id: 5,
            network_name: "goerli".into(),
            governance_address: None,
            nft_address: None,
            account: None,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            receipt_poll_interval_ms: 1000,
            receipt_timeout_secs: 300,
        }
    }
}

impl Settings {
    pub fn network(&self) -> NetworkIdentity {
        NetworkIdentity::new(self.chain_id, self.network_name.clone())
    }

    pub fn confirmation(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            poll_interval: Duration::from_millis(self.receipt_poll_interval_ms),
            timeout: Duration::from_secs(self.receipt_timeout_secs),
        }
    }

    pub fn client_options(&self) -> Result<ClientOptions> {
        let governance = self.governance_address.context(
            "governance contract address is not configured (governance_address / DAO_GOVERNANCE_ADDRESS)",
        )?;
        let membership_nft = self.nft_address.context(
            "membership NFT address is not configured (nft_address / DAO_NFT_ADDRESS)",
        )?;
        Ok(ClientOptions {
            network: self.network(),
            contracts: ContractAddresses {
                governance,
                membership_nft,
            },
            account: self.account,
            fetch_concurrency: self.fetch_concurrency.max(1),
            confirmation: self.confirmation(),
        })
    }
}

/// File values first (a missing file means defaults), then `DAO_*` environment
/// overrides.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str::<Settings>(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => Settings::default(),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

pub fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(v) = lookup("DAO_RPC_URL") {
        settings.rpc_url = v;
    }
    if let Some(v) = lookup("DAO_CHAIN_ID") {
        settings.chain_id = parse_env("DAO_CHAIN_ID", &v)?;
    }
    if let Some(v) = lookup("DAO_NETWORK_NAME") {
        settings.network_name = v;
    }
    if let Some(v) = lookup("DAO_GOVERNANCE_ADDRESS") {
        settings.governance_address = Some(parse_env("DAO_GOVERNANCE_ADDRESS", &v)?);
    }
    if let Some(v) = lookup("DAO_NFT_ADDRESS") {
        settings.nft_address = Some(parse_env("DAO_NFT_ADDRESS", &v)?);
    }
    if let Some(v) = lookup("DAO_ACCOUNT") {
        settings.account = Some(parse_env("DAO_ACCOUNT", &v)?);
    }
    if let Some(v) = lookup("DAO_FETCH_CONCURRENCY") {
        settings.fetch_concurrency = parse_env("DAO_FETCH_CONCURRENCY", &v)?;
    }
    Ok(())
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value '{value}'"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
