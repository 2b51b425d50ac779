//! Abstract ledger storage traits for the Quill node.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The sync path, the handlers and the incentive engine depend only on
//! the traits.
//!
//! All mutation happens inside a [`LedgerTxn`]: a range of chain events, the
//! cursor advance that follows it and any distribution run it triggers are
//! applied to one transaction and become visible together on
//! [`LedgerTxn::commit`]. Dropping an uncommitted transaction discards it.

pub mod error;
pub mod keys;
pub mod ledger;
pub mod meta;
pub mod state;

pub use error::StoreError;
pub use ledger::{LedgerStore, LedgerTxn};
pub use meta::MetaStore;
pub use state::{read_cursor, write_cursor, CURRENT_BLOCK_HASH, CURRENT_BLOCK_NUMBER};
