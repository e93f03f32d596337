use std::{path::PathBuf, process::ExitCode, sync::Arc};

use alloy_primitives::{
    utils::{format_ether, parse_ether},
    Address, U256,
};
use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    config::{load_settings, DEFAULT_CONFIG_PATH},
    deployer::{deploy_dao, ContractArtifact, DeploymentPlan, DEFAULT_FUNDING_ETHER},
    HttpTransport, SessionManager,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Deploys the NFT marketplace and the DAO governance contract wired to it.
#[derive(Parser, Debug)]
#[command(name = "dao-deploy")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    rpc_url: Option<String>,
    /// Compiler artifact (JSON) or bare hex init code of the marketplace.
    #[arg(long)]
    marketplace_artifact: PathBuf,
    #[arg(long)]
    governance_artifact: PathBuf,
    /// Already deployed membership NFT contract.
    #[arg(long)]
    nft_address: Option<Address>,
    /// Ether sent to the governance constructor.
    #[arg(long, default_value = DEFAULT_FUNDING_ETHER, value_parser = parse_funding)]
    funding: U256,
    #[arg(long)]
    account: Option<Address>,
}

fn parse_funding(raw: &str) -> Result<U256, String> {
    parse_ether(raw).map_err(|err| format!("invalid ether amount '{raw}': {err}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("deployment failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings(&cli.config)?;
    if let Some(rpc_url) = cli.rpc_url {
        settings.rpc_url = rpc_url;
    }
    let membership_nft = cli
        .nft_address
        .or(settings.nft_address)
        .context("membership NFT address is required (--nft-address or DAO_NFT_ADDRESS)")?;

    let plan = DeploymentPlan {
        marketplace: ContractArtifact::load(&cli.marketplace_artifact)?,
        governance: ContractArtifact::load(&cli.governance_artifact)?,
        membership_nft,
        funding: cli.funding,
    };
    info!(
        network = %settings.network_name,
        funding = %format_ether(plan.funding),
        "deploy: starting"
    );

    let transport = Arc::new(HttpTransport::new(&settings.rpc_url)?);
    let mut session = SessionManager::new(transport, settings.network())
        .with_account(cli.account.or(settings.account));
    let deployment = deploy_dao(&mut session, &plan, settings.confirmation()).await?;

    println!("Marketplace deployed to: {}", deployment.marketplace);
    println!("Governance deployed to: {}", deployment.governance);
    Ok(())
}
