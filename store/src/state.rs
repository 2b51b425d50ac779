//! Persisted sync state.

use crate::{LedgerTxn, StoreError};

/// Highest block height whose events are durably applied (decimal string).
pub const CURRENT_BLOCK_NUMBER: &str = "CurrentBlockNumber";

/// Hash of the most recently notified chain head.
pub const CURRENT_BLOCK_HASH: &str = "CurrentBlockHash";

/// Read the sync cursor. `None` when the node has never synced.
pub fn read_cursor<T: LedgerTxn + ?Sized>(txn: &T) -> Result<Option<u64>, StoreError> {
    match txn.get_state(CURRENT_BLOCK_NUMBER)? {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| StoreError::InvalidState {
                key: CURRENT_BLOCK_NUMBER.to_string(),
                value: raw,
            }),
    }
}

pub fn write_cursor<T: LedgerTxn + ?Sized>(txn: &mut T, height: u64) -> Result<(), StoreError> {
    txn.put_state(CURRENT_BLOCK_NUMBER, &height.to_string())
}
