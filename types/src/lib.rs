//! Fundamental types for the Quill ledger node.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! content DNA identifiers, ledger entities, incentive records, raw chain log
//! entries, timestamps, and the status enums that drive confirmation.

pub mod chain;
pub mod dna;
pub mod error;
pub mod incentive;
pub mod ledger;
pub mod state;
pub mod time;

pub use chain::{ChainHead, HeadNotification, RawLogEntry};
pub use dna::Dna;
pub use error::QuillError;
pub use incentive::{GrantBatch, IncentiveKind, IncentiveRecord, IncentiveStatus};
pub use ledger::{
    share_signature_base, Article, ArticleComment, ArticleLike, Group, GroupArticle, GroupMember,
    TokenLock, User, SHARE_GROUP_SEPARATOR,
};
pub use state::TxStatus;
pub use time::{Clock, SystemClock, Timestamp};

/// Token amounts, balances and scores are unsigned 256-bit integers.
pub use ethers::types::U256 as Amount;
/// 20-byte account address.
pub use ethers::types::Address;
/// 32-byte hash (block hashes, log topics, transaction ids).
pub use ethers::types::H256;
