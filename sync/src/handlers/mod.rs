//! Per-contract event handlers.
//!
//! Every handler follows the same protocol. Entities are looked up by natural
//! key; a missing row is built from the event with its signer recovered from
//! the embedded signature; the row is then saved as `Confirmed`. Counters on
//! the parent aggregate move only when a row is confirmed for the first time,
//! so replaying an event is harmless.

mod group;
mod metadata;
mod token;
mod user;

pub use group::GroupHandler;
pub use metadata::MetadataHandler;
pub use token::TokenHandler;
pub use user::UserHandler;

use quill_chain::ContractKind;
use quill_store::LedgerTxn;
use quill_types::{Address, Amount, Dna, Group, Timestamp, TxStatus, User};

use crate::{EventHandler, SyncError};

/// The default handler for a contract kind, or `None` for write-only kinds.
pub fn handler_for(kind: ContractKind) -> Option<Box<dyn EventHandler>> {
    match kind {
        ContractKind::Metadata => Some(Box::new(MetadataHandler)),
        ContractKind::Group => Some(Box::new(GroupHandler)),
        ContractKind::Token => Some(Box::new(TokenHandler)),
        ContractKind::User => Some(Box::new(UserHandler)),
        ContractKind::Incentives => None,
    }
}

fn recover(base: &str, signature: &[u8]) -> Result<Address, SyncError> {
    Ok(quill_crypto::recover_signer(base, signature)?)
}

/// Signatures are stored as bare lowercase hex.
fn signature_hex(signature: &[u8]) -> String {
    hex::encode(signature)
}

/// Load a user, creating an empty profile on first sight.
fn identify_user(
    txn: &mut dyn LedgerTxn,
    address: Address,
    now: Timestamp,
) -> Result<User, SyncError> {
    if let Some(user) = txn.get_user(&address)? {
        return Ok(user);
    }
    let user = User::unknown(address, now);
    txn.put_user(&user)?;
    tracing::debug!(user = ?address, "identified new user");
    Ok(user)
}

fn load_group(txn: &dyn LedgerTxn, dna: &Dna) -> Result<Group, SyncError> {
    txn.get_group(dna)?
        .ok_or_else(|| SyncError::MissingGroup(dna.clone()))
}

/// `true` when a row in state `existing` becomes confirmed by this event.
fn newly_confirmed(existing: Option<TxStatus>) -> bool {
    !matches!(existing, Some(TxStatus::Confirmed))
}

fn fit_u64(value: Amount, field: &'static str) -> Result<u64, SyncError> {
    if value > Amount::from(u64::MAX) {
        return Err(SyncError::OutOfRange {
            field,
            value: value.to_string(),
        });
    }
    Ok(value.as_u64())
}

fn unexpected(kind: ContractKind, event: &quill_chain::ContractEvent) -> SyncError {
    SyncError::UnexpectedEvent {
        kind,
        event: event.name(),
    }
}
