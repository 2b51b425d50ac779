//! Quill node: follows the contracts on chain and keeps the ledger in step.
//!
//! [`QuillNode`] ties together the confirmation-lagged sync, the reconnecting
//! head subscription, outbound transaction submission for grants and
//! inflation, and the `/metrics` endpoint.

pub mod account;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod shutdown;

pub use account::load_wallet;
pub use config::{AccountConfig, ChainConfig, ContractsConfig, IncentivesConfig, NodeConfig};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::{serve_metrics, NodeMetrics};
pub use node::{NodeParts, QuillNode};
pub use shutdown::ShutdownController;
