//! Chain access for the Quill node.
//!
//! Contract interfaces and event decoding, the [`ChainClient`] and
//! [`HeadSource`] seams with their JSON-RPC implementations, the reconnecting
//! [`HeadTracker`] and the [`NonceSequencer`] that serializes outbound writes.

pub mod abi;
pub mod calls;
pub mod client;
pub mod error;
pub mod eth;
pub mod events;
pub mod head;
pub mod registry;
pub mod sequencer;

pub use abi::{ContractAbi, ContractAbis};
pub use calls::ContractCall;
pub use client::{ChainClient, HeadSource};
pub use error::ChainError;
pub use eth::{EthChain, EthHeadSource};
pub use events::ContractEvent;
pub use head::{HeadTracker, DEFAULT_RECONNECT_DELAY};
pub use registry::{ContractKind, ContractRegistry};
pub use sequencer::{GasSettings, NonceSequencer};
