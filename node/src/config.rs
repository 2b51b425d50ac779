//! Node configuration with TOML file support.

use std::path::PathBuf;
use std::time::Duration;

use ethers::types::{Address, U256};
use quill_chain::{ContractKind, ContractRegistry, GasSettings};
use quill_incentives::{default_fixed_article_pool, ArticlePool, PoolPolicy};
use quill_sync::{SyncConfig, DEFAULT_BATCH_WIDTH, DEFAULT_CONFIRMATION_DEPTH};
use serde::{Deserialize, Serialize};

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a Quill node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for ledger storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to serve Prometheus metrics.
    #[serde(default)]
    pub enable_metrics: bool,

    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    #[serde(default)]
    pub chain: ChainConfig,

    /// Deployed contract addresses.
    #[serde(default)]
    pub contracts: ContractsConfig,

    #[serde(default)]
    pub node_account: AccountConfig,

    #[serde(default)]
    pub incentives: IncentivesConfig,
}

/// Chain endpoints and sync pacing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// WebSocket endpoint for the `newHeads` subscription.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Bound on every RPC call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    #[serde(default = "default_confirmation_depth")]
    pub confirmation_depth: u64,

    #[serde(default = "default_batch_width")]
    pub batch_width: u64,

    /// Cursor for a ledger that has never synced.
    #[serde(default)]
    pub start_block: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContractsConfig {
    #[serde(default)]
    pub metadata: Option<Address>,
    #[serde(default)]
    pub group: Option<Address>,
    #[serde(default)]
    pub token: Option<Address>,
    #[serde(default)]
    pub user: Option<Address>,
    #[serde(default)]
    pub incentives: Option<Address>,
}

/// The node's own signing account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountConfig {
    /// An encrypted JSON keystore file, or a directory whose first keystore
    /// file is used.
    #[serde(default = "default_keystore")]
    pub keystore: PathBuf,

    #[serde(default)]
    pub passphrase: String,

    /// Raw hex key; takes precedence over the keystore. Development only.
    #[serde(default)]
    pub private_key: Option<String>,

    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,

    #[serde(default = "default_gas_price")]
    pub gas_price: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IncentivesConfig {
    #[serde(default)]
    pub article_pool: ArticlePool,

    /// Fixed article pool in base units, as a decimal string.
    #[serde(default = "default_fixed_article_pool_str")]
    pub fixed_article_pool: String,

    /// Submit assigned grants on chain; otherwise they are only logged.
    #[serde(default)]
    pub submit_grants: bool,

    /// Seconds between `inflate` calls. Zero disables the trigger.
    #[serde(default)]
    pub inflation_interval_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./quill_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9184
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_ws_url() -> String {
    "ws://127.0.0.1:8546".to_string()
}

fn default_chain_id() -> u64 {
    1
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_reconnect_delay_secs() -> u64 {
    2
}

fn default_confirmation_depth() -> u64 {
    DEFAULT_CONFIRMATION_DEPTH
}

fn default_batch_width() -> u64 {
    DEFAULT_BATCH_WIDTH
}

fn default_keystore() -> PathBuf {
    PathBuf::from("./keystore")
}

fn default_gas_limit() -> u64 {
    4_000_000
}

fn default_gas_price() -> u64 {
    20_000_000_000
}

fn default_fixed_article_pool_str() -> String {
    default_fixed_article_pool().to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    /// Directory holding the LMDB environment.
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger")
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            confirmation_depth: self.chain.confirmation_depth,
            batch_width: self.chain.batch_width,
            start_block: self.chain.start_block,
        }
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.chain.timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.chain.reconnect_delay_secs)
    }

    /// Every configured contract address, keyed by kind.
    ///
    /// At least one synced contract must be configured.
    pub fn registry(&self) -> Result<ContractRegistry, NodeError> {
        let c = &self.contracts;
        let mut registry = ContractRegistry::new();
        for (kind, address) in [
            (ContractKind::Metadata, c.metadata),
            (ContractKind::Group, c.group),
            (ContractKind::Token, c.token),
            (ContractKind::User, c.user),
            (ContractKind::Incentives, c.incentives),
        ] {
            if let Some(address) = address {
                registry.register(kind, address);
            }
        }
        if registry.synced_addresses().is_empty() {
            return Err(NodeError::Config("registered contract not found".into()));
        }
        Ok(registry)
    }

    pub fn gas(&self) -> GasSettings {
        GasSettings {
            gas_limit: U256::from(self.node_account.gas_limit),
            gas_price: U256::from(self.node_account.gas_price),
        }
    }

    pub fn pool_policy(&self) -> Result<PoolPolicy, NodeError> {
        let fixed_amount = U256::from_dec_str(self.incentives.fixed_article_pool.trim())
            .map_err(|e| {
                NodeError::Config(format!(
                    "fixed_article_pool {:?}: {e}",
                    self.incentives.fixed_article_pool
                ))
            })?;
        Ok(PoolPolicy {
            article_pool: self.incentives.article_pool,
            fixed_amount,
        })
    }

    /// `None` when the inflation trigger is disabled.
    pub fn inflation_interval(&self) -> Option<Duration> {
        match self.incentives.inflation_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
            metrics_port: default_metrics_port(),
            chain: ChainConfig::default(),
            contracts: ContractsConfig::default(),
            node_account: AccountConfig::default(),
            incentives: IncentivesConfig::default(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            ws_url: default_ws_url(),
            chain_id: default_chain_id(),
            timeout_secs: default_timeout_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            confirmation_depth: default_confirmation_depth(),
            batch_width: default_batch_width(),
            start_block: 0,
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            keystore: default_keystore(),
            passphrase: String::new(),
            private_key: None,
            gas_limit: default_gas_limit(),
            gas_price: default_gas_price(),
        }
    }
}

impl Default for IncentivesConfig {
    fn default() -> Self {
        Self {
            article_pool: ArticlePool::default(),
            fixed_article_pool: default_fixed_article_pool_str(),
            submit_grants: false,
            inflation_interval_secs: 0,
        }
    }
}
