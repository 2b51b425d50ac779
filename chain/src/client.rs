//! Seams between the node and the chain it follows.

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};
use quill_types::{HeadNotification, RawLogEntry};
use tokio::sync::mpsc;

use crate::ChainError;

/// Request/response access to a chain node.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// All logs emitted by `addresses` in `[from, to]`, in chain order.
    async fn logs_in_range(
        &self,
        addresses: &[Address],
        from: u64,
        to: u64,
    ) -> Result<Vec<RawLogEntry>, ChainError>;

    /// The account's transaction count at the latest block.
    async fn confirmed_nonce(&self, account: Address) -> Result<U256, ChainError>;

    /// Broadcast a signed transaction, returning its hash.
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, ChainError>;
}

/// A stream of new-head notifications.
///
/// The receiver closes when the underlying subscription ends; callers
/// re-subscribe.
#[async_trait]
pub trait HeadSource: Send + Sync {
    async fn subscribe(&self) -> Result<mpsc::Receiver<HeadNotification>, ChainError>;
}
