//! Chain-to-ledger synchronization for the Quill node.
//!
//! - [`driver`]: the confirmation-lagged [`SyncDriver`] and its cursor.
//! - [`dispatcher`]: source address to [`EventHandler`] routing.
//! - [`handlers`]: the per-contract handlers.
//!
//! A range of logs, the handlers' writes and the cursor advance share one
//! ledger transaction.

pub mod dispatcher;
pub mod driver;
pub mod error;
pub mod handler;
pub mod handlers;

pub use dispatcher::Dispatcher;
pub use driver::{
    SyncConfig, SyncDriver, SyncReport, DEFAULT_BATCH_WIDTH, DEFAULT_CONFIRMATION_DEPTH,
};
pub use error::SyncError;
pub use handler::{ApplyContext, EventHandler, HandlerOutcome};
pub use handlers::{handler_for, GroupHandler, MetadataHandler, TokenHandler, UserHandler};
