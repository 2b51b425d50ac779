//! Quill daemon: entry point for running a Quill node.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use quill_node::{init_logging, NodeConfig, QuillNode};

#[derive(Parser)]
#[command(name = "quill-daemon", about = "Quill ledger node daemon")]
struct Cli {
    /// Path to a TOML configuration file. CLI flags and env vars override
    /// the values it sets.
    #[arg(long, env = "QUILL_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for ledger storage.
    #[arg(long, env = "QUILL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// JSON-RPC endpoint of the chain node.
    #[arg(long, env = "QUILL_RPC_URL")]
    rpc_url: Option<String>,

    /// WebSocket endpoint for head notifications.
    #[arg(long, env = "QUILL_WS_URL")]
    ws_url: Option<String>,

    /// Passphrase unlocking the node keystore.
    #[arg(long, env = "QUILL_KEYSTORE_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    /// Enable the Prometheus metrics endpoint.
    #[arg(long, env = "QUILL_ENABLE_METRICS")]
    metrics: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "QUILL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "QUILL_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Operate the node.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Inspect configuration.
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the node until SIGINT or SIGTERM.
    Run,
}

#[derive(clap::Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_string_lossy();
                NodeConfig::from_toml_file(&path)
                    .with_context(|| format!("loading config from {path}"))?
            }
            None => NodeConfig::default(),
        };

        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(rpc_url) = &self.rpc_url {
            config.chain.rpc_url = rpc_url.clone();
        }
        if let Some(ws_url) = &self.ws_url {
            config.chain.ws_url = ws_url.clone();
        }
        if let Some(passphrase) = &self.passphrase {
            config.node_account.passphrase = passphrase.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        config.enable_metrics |= self.metrics;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    match cli.command {
        Command::Config {
            action: ConfigAction::Show,
        } => {
            let mut shown = config.clone();
            shown.node_account.passphrase.clear();
            shown.node_account.private_key = None;
            print!("{}", shown.to_toml_string()?);
        }
        Command::Node {
            action: NodeAction::Run,
        } => {
            init_logging(config.log_format()?, &config.log_level)?;
            tracing::info!(
                data_dir = %config.data_dir.display(),
                rpc = %config.chain.rpc_url,
                ws = %config.chain.ws_url,
                metrics = config.enable_metrics,
                "starting Quill node"
            );

            let mut node = QuillNode::open(config)?;
            node.start().await?;

            node.wait_for_signal().await;
            node.stop().await?;

            tracing::info!("Quill daemon exited cleanly");
        }
    }

    Ok(())
}
