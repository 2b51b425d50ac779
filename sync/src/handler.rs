//! The seam between the dispatcher and the per-contract handlers.

use quill_chain::{ContractEvent, ContractKind};
use quill_incentives::{DistributionSummary, PoolPolicy};
use quill_store::LedgerTxn;
use quill_types::{GrantBatch, Timestamp};

use crate::SyncError;

/// What a handler may consult while applying an event.
#[derive(Clone, Copy, Debug)]
pub struct ApplyContext {
    /// Creation time stamped on new rows and incentive records.
    pub now: Timestamp,
    pub block_number: u64,
    pub policy: PoolPolicy,
}

/// Side results a handler hands back to the driver.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HandlerOutcome {
    /// Grant batches to submit once the range commits.
    pub grants: Vec<GrantBatch>,
    pub distribution: Option<DistributionSummary>,
}

impl HandlerOutcome {
    pub fn merge(&mut self, other: HandlerOutcome) {
        self.grants.extend(other.grants);
        if other.distribution.is_some() {
            self.distribution = other.distribution;
        }
    }
}

/// Applies the decoded events of one contract to the ledger.
///
/// Implementations must be idempotent: applying the same event twice leaves
/// the ledger as applying it once. Every error aborts the enclosing range.
pub trait EventHandler: Send + Sync {
    fn kind(&self) -> ContractKind;

    fn handle(
        &self,
        txn: &mut dyn LedgerTxn,
        event: ContractEvent,
        ctx: &ApplyContext,
    ) -> Result<HandlerOutcome, SyncError>;
}
