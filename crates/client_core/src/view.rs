//! Render models for front-ends. They decide what is shown and which actions
//! are offered; presentation is left to the caller.

use std::fmt;

use alloy_primitives::{utils::format_ether, U256};
use chrono::{DateTime, Utc};
use shared::domain::{Proposal, ProposalId, ProposalPhase, VoteChoice};

use crate::client::DaoSnapshot;

const WAITING_FOR_TRANSACTION: &str = "Loading.. Waiting for transaction..";

pub struct Overview {
    pub membership_balance: U256,
    pub treasury_balance: U256,
    pub num_proposals: u64,
}

impl Overview {
    pub fn from_snapshot(snapshot: &DaoSnapshot) -> Self {
        Self {
            membership_balance: snapshot.membership_balance,
            treasury_balance: snapshot.treasury_balance,
            num_proposals: snapshot.num_proposals,
        }
    }
}

impl fmt::Display for Overview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Your membership NFT balance: {}", self.membership_balance)?;
        writeln!(
            f,
            "Treasury balance: {} ETH",
            format_ether(self.treasury_balance)
        )?;
        write!(f, "Total number of proposals: {}", self.num_proposals)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateProposalPanel {
    Loading,
    Ineligible,
    Form,
}

impl CreateProposalPanel {
    pub fn from_snapshot(snapshot: &DaoSnapshot) -> Self {
        if snapshot.busy {
            CreateProposalPanel::Loading
        } else if snapshot.membership_balance.is_zero() {
            CreateProposalPanel::Ineligible
        } else {
            CreateProposalPanel::Form
        }
    }

    pub fn offers_create(&self) -> bool {
        matches!(self, CreateProposalPanel::Form)
    }
}

impl fmt::Display for CreateProposalPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateProposalPanel::Loading => f.write_str(WAITING_FOR_TRANSACTION),
            CreateProposalPanel::Ineligible => f.write_str(
                "You do not own any membership NFTs.\nYou cannot create or vote on proposals",
            ),
            CreateProposalPanel::Form => f.write_str("NFT token id to purchase: <token-id>"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalAction {
    Vote,
    Execute { leading: VoteChoice },
    Executed,
}

impl From<ProposalPhase> for ProposalAction {
    fn from(phase: ProposalPhase) -> Self {
        match phase {
            ProposalPhase::Voting => ProposalAction::Vote,
            ProposalPhase::Executable { leading } => ProposalAction::Execute { leading },
            ProposalPhase::Executed => ProposalAction::Executed,
        }
    }
}

impl fmt::Display for ProposalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalAction::Vote => write!(
                f,
                "Vote {} | Vote {}",
                VoteChoice::Yay,
                VoteChoice::Nay
            ),
            ProposalAction::Execute { leading } => write!(f, "Execute Proposal ({leading})"),
            ProposalAction::Executed => f.write_str("Proposal Executed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalCard {
    pub proposal: Proposal,
    pub action: ProposalAction,
}

impl ProposalCard {
    pub fn new(proposal: Proposal, now: DateTime<Utc>) -> Self {
        let action = proposal.phase(now).into();
        Self { proposal, action }
    }
}

impl fmt::Display for ProposalCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.proposal;
        writeln!(f, "Proposal ID: {}", p.id)?;
        writeln!(f, "NFT to purchase: {}", p.nft_token_id)?;
        writeln!(f, "Deadline: {}", p.deadline.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f, "Yay votes: {}", p.yay_votes)?;
        writeln!(f, "Nay votes: {}", p.nay_votes)?;
        writeln!(f, "Executed: {}", p.executed)?;
        write!(f, "{}", self.action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalsPanel {
    Loading,
    Empty,
    Cards(Vec<ProposalCard>),
}

impl ProposalsPanel {
    pub fn from_snapshot(snapshot: &DaoSnapshot, now: DateTime<Utc>) -> Self {
        if snapshot.busy {
            ProposalsPanel::Loading
        } else if snapshot.num_proposals == 0 {
            ProposalsPanel::Empty
        } else {
            ProposalsPanel::Cards(
                snapshot
                    .proposals
                    .iter()
                    .cloned()
                    .map(|proposal| ProposalCard::new(proposal, now))
                    .collect(),
            )
        }
    }

    pub fn card(&self, id: ProposalId) -> Option<&ProposalCard> {
        match self {
            ProposalsPanel::Cards(cards) => cards.iter().find(|card| card.proposal.id == id),
            _ => None,
        }
    }
}

impl fmt::Display for ProposalsPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalsPanel::Loading => f.write_str(WAITING_FOR_TRANSACTION),
            ProposalsPanel::Empty => f.write_str("No proposals have been created"),
            ProposalsPanel::Cards(cards) => {
                for (index, card) in cards.iter().enumerate() {
                    if index > 0 {
                        f.write_str("\n\n")?;
                    }
                    write!(f, "{card}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawControl {
    Hidden,
    Loading,
    Available,
}

impl WithdrawControl {
    pub fn from_snapshot(snapshot: &DaoSnapshot) -> Self {
        if !snapshot.is_owner {
            WithdrawControl::Hidden
        } else if snapshot.busy {
            WithdrawControl::Loading
        } else {
            WithdrawControl::Available
        }
    }
}

impl fmt::Display for WithdrawControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WithdrawControl::Hidden => Ok(()),
            WithdrawControl::Loading => f.write_str("Loading..."),
            WithdrawControl::Available => f.write_str("Withdraw DAO ETH"),
        }
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
