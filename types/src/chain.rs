//! Raw chain data as it crosses into the node.

use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};

use crate::QuillError;

/// One log entry emitted by a watched contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLogEntry {
    pub address: Address,
    /// `topics[0]` is the event signature hash; the rest are indexed arguments.
    pub topics: Vec<H256>,
    pub data: Vec<u8>,
    pub block_number: u64,
    pub block_hash: Option<H256>,
    pub log_index: Option<u64>,
}

impl RawLogEntry {
    pub fn primary_topic(&self) -> Option<&H256> {
        self.topics.first()
    }
}

/// A `newHeads` subscription payload, kept in its wire form.
///
/// Only the two fields the node uses are decoded; everything else in the
/// notification is ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadNotification {
    /// `0x`-prefixed hexadecimal height.
    pub number: String,
    pub hash: String,
}

impl HeadNotification {
    /// Parse the notification into a validated [`ChainHead`].
    pub fn parse(&self) -> Result<ChainHead, QuillError> {
        let digits = self
            .number
            .strip_prefix("0x")
            .or_else(|| self.number.strip_prefix("0X"))
            .ok_or_else(|| QuillError::InvalidHeight(self.number.clone()))?;
        let height = u64::from_str_radix(digits, 16)
            .map_err(|_| QuillError::InvalidHeight(self.number.clone()))?;
        Ok(ChainHead {
            height,
            hash: self.hash.clone(),
        })
    }
}

/// A validated chain head.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainHead {
    pub height: u64,
    pub hash: String,
}
