use std::{fmt, str::FromStr};

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_newtype!(ProposalId, u64);
id_newtype!(TokenId, U256);
id_newtype!(ChainId, u64);

impl FromStr for TokenId {
    type Err = <U256 as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        U256::from_str(s.trim()).map(Self)
    }
}

/// The single network a session is allowed to run against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkIdentity {
    pub chain_id: ChainId,
    pub name: String,
}

impl NetworkIdentity {
    pub fn new(chain_id: u64, name: impl Into<String>) -> Self {
        Self {
            chain_id: ChainId(chain_id),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Yay,
    Nay,
}

impl VoteChoice {
    /// Discriminant of the governance contract's `Vote` enum.
    pub fn abi_value(self) -> u8 {
        match self {
            VoteChoice::Yay => 0,
            VoteChoice::Nay => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VoteChoice::Yay => "YAY",
            VoteChoice::Nay => "NAY",
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VoteChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yay" | "yes" | "y" => Ok(VoteChoice::Yay),
            "nay" | "no" | "n" => Ok(VoteChoice::Nay),
            other => Err(format!("unknown vote choice '{other}', expected yay or nay")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub nft_token_id: TokenId,
    pub deadline: DateTime<Utc>,
    pub yay_votes: U256,
    pub nay_votes: U256,
    pub executed: bool,
}

/// Which action a proposal admits at a given instant. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalPhase {
    Voting,
    Executable { leading: VoteChoice },
    Executed,
}

impl Proposal {
    pub fn phase(&self, now: DateTime<Utc>) -> ProposalPhase {
        if self.executed {
            ProposalPhase::Executed
        } else if self.deadline > now {
            ProposalPhase::Voting
        } else {
            ProposalPhase::Executable {
                leading: self.leading_choice(),
            }
        }
    }

    /// Ties label as NAY; the contract decides the real outcome.
    pub fn leading_choice(&self) -> VoteChoice {
        if self.yay_votes > self.nay_votes {
            VoteChoice::Yay
        } else {
            VoteChoice::Nay
        }
    }
}
