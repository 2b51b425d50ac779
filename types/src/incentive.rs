//! Incentive records and their lifecycle.

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{Dna, Timestamp};

/// What earned an incentive record its score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncentiveKind {
    /// Accumulated score of an article, owned by its author.
    Article,
    Group,
    Like,
    Comment,
    Share,
}

impl IncentiveKind {
    /// Multiplier applied to the actor's HP when it is added to the article score.
    pub fn article_weight(&self) -> Option<u64> {
        match self {
            Self::Like => Some(1),
            Self::Comment => Some(10),
            Self::Share => Some(100),
            Self::Article | Self::Group => None,
        }
    }

    /// Whether records of this kind share in the contributor slice of an article.
    pub fn is_contribution(&self) -> bool {
        self.article_weight().is_some()
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Article => 1,
            Self::Group => 2,
            Self::Like => 3,
            Self::Comment => 4,
            Self::Share => 5,
        }
    }
}

/// Position of a record in the distribution state machine.
///
/// `Pending -> Calculating -> Paid`. Only the distribution engine moves
/// records past `Pending`, and `Paid` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IncentiveStatus {
    Pending,
    Calculating,
    Paid,
}

impl IncentiveStatus {
    /// Stable byte used as a secondary-index prefix.
    pub fn code(&self) -> u8 {
        match self {
            Self::Pending => 1,
            Self::Calculating => 2,
            Self::Paid => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveRecord {
    /// Assigned by the store on insert.
    pub id: u64,
    pub created_at: Timestamp,
    pub kind: IncentiveKind,
    pub user_address: Address,
    pub article_dna: Dna,
    pub group_dna: Dna,
    pub score: U256,
    pub amount: U256,
    pub status: IncentiveStatus,
}

impl IncentiveRecord {
    /// A new pending record with zero score and amount.
    pub fn pending(kind: IncentiveKind, user_address: Address, now: Timestamp) -> Self {
        Self {
            id: 0,
            created_at: now,
            kind,
            user_address,
            article_dna: Dna::default(),
            group_dna: Dna::default(),
            score: U256::zero(),
            amount: U256::zero(),
            status: IncentiveStatus::Pending,
        }
    }
}

/// One on-chain grant call worth of per-user totals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrantBatch {
    pub users: Vec<Address>,
    pub amounts: Vec<U256>,
}

impl GrantBatch {
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn total(&self) -> U256 {
        self.amounts.iter().fold(U256::zero(), |acc, a| acc.saturating_add(*a))
    }
}
