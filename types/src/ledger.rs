//! Ledger entities reconciled from chain events.
//!
//! Every entity is addressed by its natural key (DNA, address, or a composite
//! of them). Sequential ids exist only for append-only rows that have no
//! natural key (token locks).

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{Dna, Timestamp, TxStatus};

/// A published article.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub dna: Dna,
    /// Author, recovered from the publish signature.
    pub user_address: Address,
    pub title: String,
    pub abstract_text: String,
    pub content_hash: String,
    pub block_hash: String,
    pub license: String,
    pub extra: String,
    /// Hex-encoded 65-byte signature.
    pub signature: String,
    pub tx_status: TxStatus,
    pub like_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
    /// Accumulated owner rewards.
    pub total_incentives: U256,
    pub created_at: Timestamp,
}

impl Article {
    /// The message the author signs when publishing.
    pub fn signature_base(&self) -> String {
        format!("{}{}{}", self.title, self.content_hash, self.license)
    }
}

/// A group that articles can be shared into.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub dna: Dna,
    /// Owner, recovered from the create signature.
    pub user_address: Address,
    pub title: String,
    pub description: String,
    pub signature: String,
    pub tx_status: TxStatus,
    pub member_count: u64,
    pub article_count: u64,
    pub created_at: Timestamp,
}

impl Group {
    pub fn signature_base(&self) -> String {
        format!("{}{}", self.title, self.description)
    }
}

/// Membership of an address in a group. Keyed by `(group_dna, member_address)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_dna: Dna,
    pub member_address: Address,
    pub signature: String,
    pub tx_status: TxStatus,
    pub created_at: Timestamp,
}

impl GroupMember {
    /// Message signed by the joining (or leaving) member.
    pub fn signature_base(group_dna: &Dna) -> String {
        group_dna.as_str().to_string()
    }

    /// Message signed by the group owner when removing a member.
    pub fn owner_signature_base(group_dna: &Dna, member: &str) -> String {
        format!("{}{}", group_dna, member)
    }
}

/// An article shared into a group. Keyed by `(group_dna, article_dna, member_address)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupArticle {
    pub group_dna: Dna,
    pub article_dna: Dna,
    pub member_address: Address,
    pub tx_status: TxStatus,
    pub created_at: Timestamp,
}

/// A like. Keyed by `(article_dna, group_dna, member_address)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleLike {
    pub article_dna: Dna,
    pub group_dna: Dna,
    pub member_address: Address,
    pub signature: String,
    pub tx_status: TxStatus,
    pub created_at: Timestamp,
}

impl ArticleLike {
    pub fn signature_base(article_dna: &Dna, group_dna: &Dna) -> String {
        format!("{}{}", article_dna, group_dna)
    }
}

/// A comment. Keyed by `(article_dna, group_dna, member_address, content_hash)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleComment {
    pub article_dna: Dna,
    pub group_dna: Dna,
    pub member_address: Address,
    pub content_hash: String,
    pub signature: String,
    pub tx_status: TxStatus,
    pub created_at: Timestamp,
}

impl ArticleComment {
    pub fn signature_base(article_dna: &Dna, group_dna: &Dna, content_hash: &str) -> String {
        format!("{}{}{}", article_dna, group_dna, content_hash)
    }
}

/// Separator between group DNAs in a batch share.
pub const SHARE_GROUP_SEPARATOR: char = ',';

/// Message signed when sharing an article into several groups at once.
pub fn share_signature_base(article_dna: &Dna, groups_joined: &str) -> String {
    format!("{}{}", article_dna, groups_joined)
}

/// A token holder known to the ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub address: Address,
    pub name: String,
    pub extra: String,
    pub signature: String,
    /// Balance as observed through transfer events since `start_block`.
    pub balance: U256,
    pub token_burned: bool,
    pub created_at: Timestamp,
}

impl User {
    /// A freshly identified user with no profile and zero balance.
    pub fn unknown(address: Address, now: Timestamp) -> Self {
        Self {
            address,
            name: String::new(),
            extra: "{}".to_string(),
            signature: String::new(),
            balance: U256::zero(),
            token_burned: false,
            created_at: now,
        }
    }
}

/// Tokens locked against a resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLock {
    pub id: u64,
    pub user_address: Address,
    pub resource_type: u64,
    pub resource_dna: Dna,
    pub amount: U256,
    /// Expiry in Unix seconds, 0 for never.
    pub expire: u64,
    pub created_at: Timestamp,
}
