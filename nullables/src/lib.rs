//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! Everything the node touches outside its own process (clock, chain node,
//! head subscription, storage) sits behind a trait. This crate provides
//! test-friendly implementations that:
//! - Return deterministic, scripted values
//! - Record what the node sent so tests can assert on it
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod chain;
pub mod clock;
pub mod store;

pub use chain::{NullChain, NullHeadSource};
pub use clock::NullClock;
pub use store::{NullStore, NullTxn};
