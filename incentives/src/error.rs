use quill_store::StoreError;
use quill_types::{Dna, IncentiveKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IncentiveError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("article {0} has incentive records but no ledger row")]
    MissingArticle(Dna),

    #[error("{0:?} records do not score articles")]
    NotAnActivity(IncentiveKind),

    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
}
