//! Incentive engine for the Quill ledger.
//!
//! - [`reputation`]: HP of a user from balance and recent activity.
//! - [`scoring`]: incentive records written when engagement is confirmed.
//! - [`distribute`]: the rank-dampened split of an inflation.
//! - [`assign`]: per-user grant batches, after which records are paid.
//!
//! Everything runs inside the caller's ledger transaction.

pub mod assign;
pub mod distribute;
pub mod error;
pub mod reputation;
pub mod scoring;

pub use assign::{assign_grants, GRANT_BATCH_USERS};
pub use distribute::{
    default_fixed_article_pool, distribute, ArticlePool, DistributionSummary, InflationSplit,
    PoolPolicy,
};
pub use error::IncentiveError;
pub use reputation::{reputation, user_reputation};
pub use scoring::{record_activity, Activity, ActivityScore};

use quill_store::LedgerTxn;
use quill_types::{Amount, GrantBatch};

/// Result of handling one inflation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InflationOutcome {
    pub summary: DistributionSummary,
    pub grants: Vec<GrantBatch>,
}

/// Distribute `inflation`, then assign and pay out every calculated record.
pub fn run_inflation(
    txn: &mut dyn LedgerTxn,
    inflation: Amount,
    policy: &PoolPolicy,
) -> Result<InflationOutcome, IncentiveError> {
    let summary = distribute(txn, inflation, policy)?;
    let grants = assign_grants(txn, GRANT_BATCH_USERS)?;
    Ok(InflationOutcome { summary, grants })
}
