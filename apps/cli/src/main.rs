use std::{path::PathBuf, sync::Arc};

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings, DEFAULT_CONFIG_PATH},
    view::{CreateProposalPanel, Overview, ProposalAction, ProposalsPanel, WithdrawControl},
    ClientEvent, DaoClient, HttpTransport,
};
use shared::{
    domain::{ProposalId, TokenId, VoteChoice},
    error::DaoError,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dao", about = "Interact with the membership DAO governance contract")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    rpc_url: Option<String>,
    #[arg(long)]
    governance_address: Option<Address>,
    #[arg(long)]
    nft_address: Option<Address>,
    /// Wallet account to sign with; defaults to the first one exposed.
    #[arg(long)]
    account: Option<Address>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Membership balance, treasury and proposal count.
    Status,
    Proposals,
    Create {
        #[arg(long)]
        token_id: TokenId,
    },
    Vote {
        #[arg(long)]
        proposal_id: u64,
        #[arg(long)]
        choice: VoteChoice,
    },
    Execute {
        #[arg(long)]
        proposal_id: u64,
    },
    Withdraw,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(rpc_url) = args.rpc_url {
        settings.rpc_url = rpc_url;
    }
    if args.governance_address.is_some() {
        settings.governance_address = args.governance_address;
    }
    if args.nft_address.is_some() {
        settings.nft_address = args.nft_address;
    }
    if args.account.is_some() {
        settings.account = args.account;
    }

    let transport = HttpTransport::new(&settings.rpc_url)?;
    info!(
        rpc_url = %transport.endpoint(),
        network = %settings.network_name,
        "cli: using endpoint"
    );
    let client = DaoClient::new(Arc::new(transport), settings.client_options()?);

    let mut events = client.subscribe_events();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ClientEvent::Connected { chain_id, account } => match account {
                    Some(account) => println!("Connected to chain {chain_id} as {account}"),
                    None => println!("Connected to chain {chain_id} (read-only)"),
                },
                ClientEvent::TransactionSubmitted { action, hash } => {
                    println!("{action}: waiting for transaction {hash}..")
                }
                ClientEvent::ActionConfirmed { action, hash } => {
                    println!("{action}: confirmed in {hash}")
                }
                ClientEvent::Alert(alert) => eprintln!("alert: {}", alert.message),
            }
        }
    });

    let outcome = run(&client, args.command).await;
    drop(client);
    printer.await.context("event printer panicked")?;
    outcome
}

async fn run(client: &DaoClient, command: Command) -> Result<()> {
    info!(command = ?command, "cli: connecting");
    client.connect().await?;

    match command {
        Command::Status => {
            let snapshot = client.snapshot().await;
            println!("{}", Overview::from_snapshot(&snapshot));
            let withdraw = WithdrawControl::from_snapshot(&snapshot);
            if withdraw != WithdrawControl::Hidden {
                println!("{withdraw}");
            }
        }
        Command::Proposals => {
            client.refresh_proposals().await?;
            let snapshot = client.snapshot().await;
            println!("{}", ProposalsPanel::from_snapshot(&snapshot, Utc::now()));
        }
        Command::Create { token_id } => {
            let panel = CreateProposalPanel::from_snapshot(&client.snapshot().await);
            if !panel.offers_create() {
                bail!("{panel}");
            }
            let receipt = client.create_proposal(token_id).await?;
            println!(
                "Proposal for NFT {token_id} created in {}",
                receipt.transaction_hash
            );
            println!("{}", Overview::from_snapshot(&client.snapshot().await));
        }
        Command::Vote {
            proposal_id,
            choice,
        } => {
            let id = ProposalId(proposal_id);
            require_action(client, id, |action| action == ProposalAction::Vote).await?;
            client.vote(id, choice).await?;
            print_card(client, id).await;
        }
        Command::Execute { proposal_id } => {
            let id = ProposalId(proposal_id);
            require_action(client, id, |action| {
                matches!(action, ProposalAction::Execute { .. })
            })
            .await?;
            client.execute(id).await?;
            print_card(client, id).await;
        }
        Command::Withdraw => {
            if WithdrawControl::from_snapshot(&client.snapshot().await) == WithdrawControl::Hidden
            {
                return Err(DaoError::NotOwner.into());
            }
            client.withdraw().await?;
            println!("{}", Overview::from_snapshot(&client.snapshot().await));
        }
    }
    Ok(())
}

/// Votes and executions are only offered for the phase a proposal is in, and
/// only to members.
async fn require_action(
    client: &DaoClient,
    id: ProposalId,
    allowed: impl Fn(ProposalAction) -> bool,
) -> Result<()> {
    client.refresh_proposals().await?;
    let snapshot = client.snapshot().await;
    let create = CreateProposalPanel::from_snapshot(&snapshot);
    if create == CreateProposalPanel::Ineligible {
        bail!("{create}");
    }
    let panel = ProposalsPanel::from_snapshot(&snapshot, Utc::now());
    let card = panel
        .card(id)
        .with_context(|| format!("proposal {id} does not exist"))?;
    if !allowed(card.action) {
        bail!("proposal {id} does not admit this action (currently: {})", card.action);
    }
    Ok(())
}

async fn print_card(client: &DaoClient, id: ProposalId) {
    let panel = ProposalsPanel::from_snapshot(&client.snapshot().await, Utc::now());
    if let Some(card) = panel.card(id) {
        println!("{card}");
    }
}
