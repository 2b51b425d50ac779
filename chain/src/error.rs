use thiserror::Error;

use crate::ContractKind;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid contract interface: {0}")]
    Abi(String),

    #[error("no contract registered at {0:?}")]
    UnknownContract(ethers::types::Address),

    #[error("unrecognized event topic {topic:?} on {kind} contract")]
    UnknownEvent {
        kind: ContractKind,
        topic: Option<ethers::types::H256>,
    },

    #[error("failed to decode {event}: {reason}")]
    Decode { event: String, reason: String },

    #[error("chain transport error: {0}")]
    Transport(String),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },

    #[error("transaction rejected by nonce check: {0}")]
    NonceRejected(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("head subscription failed: {0}")]
    Subscription(String),
}

impl ChainError {
    /// Classify a node's submission error message.
    ///
    /// Nonce conflicts get their own variant so the sequencer can resync.
    pub fn from_submission(message: String) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("nonce too low")
            || lower.contains("already known")
            || lower.contains("replacement transaction underpriced")
            || lower.contains("invalid nonce")
        {
            ChainError::NonceRejected(message)
        } else {
            ChainError::Transport(message)
        }
    }
}
