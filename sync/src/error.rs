use quill_chain::{ChainError, ContractKind};
use quill_crypto::CryptoError;
use quill_incentives::IncentiveError;
use quill_store::StoreError;
use quill_types::{Address, Dna};
use thiserror::Error;

/// Any failure that aborts a sync range.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("signature error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("incentive error: {0}")]
    Incentive(#[from] IncentiveError),

    #[error("log event handler does not exist: {0:?}")]
    UnknownSource(Address),

    #[error("{kind} handler cannot apply {event}")]
    UnexpectedEvent {
        kind: ContractKind,
        event: &'static str,
    },

    #[error("article does not exist: {0}")]
    MissingArticle(Dna),

    #[error("group does not exist: {0}")]
    MissingGroup(Dna),

    #[error("member {member:?} is not in group {group}")]
    MissingMember { group: Dna, member: Address },

    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    #[error("{signer:?} does not own group {group}")]
    NotGroupOwner { group: Dna, signer: Address },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}
