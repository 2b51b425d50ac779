//! Confirmation state of ledger rows.

use serde::{Deserialize, Serialize};

/// Whether a ledger row has been observed on chain.
///
/// The CRUD layer writes `Pending` rows when it submits a transaction; the
/// sync path upgrades them to `Confirmed` once the matching event is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    #[default]
    Pending,
    Confirmed,
}

impl TxStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}
