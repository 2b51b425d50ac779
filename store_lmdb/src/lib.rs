//! LMDB storage backend for the Quill ledger.
//!
//! Implements the `quill-store` traits using the `heed` LMDB bindings. Every
//! entity table and incentive index is a named database inside a single
//! environment, so one [`WriteBatch`] covers a whole sync range.

pub mod environment;
pub mod error;
pub mod meta;
pub mod migration;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use write_batch::WriteBatch;
