//! ABI bindings for the governance contract and the membership NFT.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use chrono::{DateTime, Utc};
use shared::{
    domain::{Proposal, ProposalId, TokenId, VoteChoice},
    error::DaoError,
};

use crate::ledger::Ledger;

sol! {
    interface IDaoGovernance {
        function owner() external view returns (address);
        function numProposals() external view returns (uint256);
        function proposals(uint256 index)
            external
            view
            returns (uint256 nftTokenId, uint256 deadline, uint256 yayVotes, uint256 nayVotes, bool executed);
        function createProposal(uint256 nftTokenId) external returns (uint256);
        function voteOnProposal(uint256 proposalIndex, uint8 vote) external;
        function executeProposal(uint256 proposalIndex) external;
        function withdrawEther() external;
    }

    interface IMembershipNft {
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// An encoded state-changing call, ready to be signed and submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub data: Bytes,
    pub value: Option<U256>,
}

impl ContractCall {
    fn encode<C: SolCall>(to: Address, call: C) -> Self {
        Self {
            to,
            data: call.abi_encode().into(),
            value: None,
        }
    }

    pub fn create_proposal(governance: Address, nft_token_id: TokenId) -> Self {
        Self::encode(
            governance,
            IDaoGovernance::createProposalCall {
                nftTokenId: nft_token_id.0,
            },
        )
    }

    pub fn vote(governance: Address, proposal_id: ProposalId, choice: VoteChoice) -> Self {
        Self::encode(
            governance,
            IDaoGovernance::voteOnProposalCall {
                proposalIndex: U256::from(proposal_id.0),
                vote: choice.abi_value(),
            },
        )
    }

    pub fn execute(governance: Address, proposal_id: ProposalId) -> Self {
        Self::encode(
            governance,
            IDaoGovernance::executeProposalCall {
                proposalIndex: U256::from(proposal_id.0),
            },
        )
    }

    pub fn withdraw(governance: Address) -> Self {
        Self::encode(governance, IDaoGovernance::withdrawEtherCall {})
    }
}

async fn read<C: SolCall>(ledger: &Ledger, to: Address, call: C) -> Result<C::Return, DaoError> {
    let data = ledger
        .call(to, call.abi_encode().into())
        .await
        .map_err(DaoError::read)?;
    C::abi_decode_returns(&data)
        .map_err(|err| DaoError::read(format!("cannot decode {} result: {err}", C::SIGNATURE)))
}

#[derive(Clone)]
pub struct GovernanceContract {
    ledger: Ledger,
    address: Address,
}

impl GovernanceContract {
    pub fn new(ledger: Ledger, address: Address) -> Self {
        Self { ledger, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn owner(&self) -> Result<Address, DaoError> {
        read(&self.ledger, self.address, IDaoGovernance::ownerCall {}).await
    }

    pub async fn num_proposals(&self) -> Result<u64, DaoError> {
        let count = read(&self.ledger, self.address, IDaoGovernance::numProposalsCall {}).await?;
        u64::try_from(count)
            .map_err(|_| DaoError::ReadFailure(format!("proposal count {count} out of range")))
    }

    pub async fn proposal(&self, id: ProposalId) -> Result<Proposal, DaoError> {
        let raw = read(
            &self.ledger,
            self.address,
            IDaoGovernance::proposalsCall {
                index: U256::from(id.0),
            },
        )
        .await?;
        let deadline = i64::try_from(raw.deadline)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .ok_or_else(|| {
                DaoError::ReadFailure(format!(
                    "proposal {id} has an invalid deadline {}",
                    raw.deadline
                ))
            })?;
        Ok(Proposal {
            id,
            nft_token_id: TokenId(raw.nftTokenId),
            deadline,
            yay_votes: raw.yayVotes,
            nay_votes: raw.nayVotes,
            executed: raw.executed,
        })
    }

    /// Native balance held by the governance contract.
    pub async fn treasury_balance(&self) -> Result<U256, DaoError> {
        self.ledger
            .balance(self.address)
            .await
            .map_err(DaoError::read)
    }
}

#[derive(Clone)]
pub struct MembershipToken {
    ledger: Ledger,
    address: Address,
}

impl MembershipToken {
    pub fn new(ledger: Ledger, address: Address) -> Self {
        Self { ledger, address }
    }

    pub async fn balance_of(&self, holder: Address) -> Result<U256, DaoError> {
        read(
            &self.ledger,
            self.address,
            IMembershipNft::balanceOfCall { owner: holder },
        )
        .await
    }
}
