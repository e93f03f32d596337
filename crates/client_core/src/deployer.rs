use std::{fs, path::Path};

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolValue;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use shared::error::DaoError;
use tracing::info;

use crate::{
    ledger::ConfirmationPolicy,
    session::{SessionManager, SigningAccess},
};

pub const DEFAULT_FUNDING_ETHER: &str = "0.01";

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactBytecode {
    Hex(Bytes),
    Object { object: Bytes },
}

#[derive(Deserialize)]
struct ArtifactFile {
    #[serde(default, rename = "contractName")]
    contract_name: Option<String>,
    bytecode: ArtifactBytecode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    pub name: String,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Reads a compiler artifact (`{"bytecode": "0x.."}` or
    /// `{"bytecode": {"object": "0x.."}}`) or a bare hex file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read artifact '{}'", path.display()))?;
        let fallback_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "contract".to_string());
        Self::parse(&fallback_name, &raw)
            .with_context(|| format!("invalid artifact '{}'", path.display()))
    }

    pub fn parse(fallback_name: &str, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (name, bytecode) = if raw.starts_with('{') {
            let file: ArtifactFile = serde_json::from_str(raw)?;
            let bytecode = match file.bytecode {
                ArtifactBytecode::Hex(bytes) | ArtifactBytecode::Object { object: bytes } => bytes,
            };
            (
                file.contract_name
                    .unwrap_or_else(|| fallback_name.to_string()),
                bytecode,
            )
        } else {
            (fallback_name.to_string(), raw.parse::<Bytes>()?)
        };

        if bytecode.is_empty() {
            return Err(anyhow!(
                "{name} has no bytecode; abstract contracts and interfaces cannot be deployed"
            ));
        }
        Ok(Self { name, bytecode })
    }
}

#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    pub marketplace: ContractArtifact,
    pub governance: ContractArtifact,
    pub membership_nft: Address,
    pub funding: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub marketplace: Address,
    pub governance: Address,
}

/// Publishes init code plus ABI-encoded constructor arguments and returns the
/// created address from the receipt.
pub async fn deploy_contract(
    signer: &SigningAccess,
    artifact: &ContractArtifact,
    constructor_args: &[u8],
    value: Option<U256>,
    policy: ConfirmationPolicy,
) -> Result<Address, DaoError> {
    let mut init_code = artifact.bytecode.to_vec();
    init_code.extend_from_slice(constructor_args);

    let pending = signer.deploy(Bytes::from(init_code), value).await?;
    info!(contract = %artifact.name, tx = %pending.hash(), "deploy: submitted");
    let receipt = pending.confirm(policy).await?;
    receipt.contract_address.ok_or_else(|| {
        DaoError::SubmissionFailure(format!(
            "receipt for {} carries no contract address",
            artifact.name
        ))
    })
}

/// Marketplace first (no constructor arguments), then the governance contract
/// wired to it and to the membership NFT, funded with `plan.funding`.
pub async fn deploy_dao(
    session: &mut SessionManager,
    plan: &DeploymentPlan,
    policy: ConfirmationPolicy,
) -> Result<Deployment, DaoError> {
    session.connect().await?;
    let signer = session.signer().await?;

    let marketplace = deploy_contract(&signer, &plan.marketplace, &[], None, policy).await?;
    info!(contract = %plan.marketplace.name, address = %marketplace, "deploy: done");

    let constructor_args = (marketplace, plan.membership_nft).abi_encode_params();
    let governance = deploy_contract(
        &signer,
        &plan.governance,
        &constructor_args,
        Some(plan.funding),
        policy,
    )
    .await?;
    info!(contract = %plan.governance.name, address = %governance, "deploy: done");

    Ok(Deployment {
        marketplace,
        governance,
    })
}

#[cfg(test)]
#[path = "tests/deployer_tests.rs"]
mod tests;
