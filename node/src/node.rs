//! The Quill node: owns the ledger and runs the long-lived tasks around it.
//!
//! - head tracker: keeps the `newHeads` subscription alive
//! - sync consumer: turns each head into a confirmation-lagged sync
//! - grant submitter: sends assigned grant batches through the sequencer
//! - inflation trigger: calls `inflate` on a fixed interval
//! - metrics server: `/metrics` when enabled

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ethers::signers::LocalWallet;
use quill_chain::{
    ChainClient, ContractAbis, ContractCall, EthChain, EthHeadSource, HeadSource, HeadTracker,
    NonceSequencer,
};
use quill_store::LedgerStore;
use quill_store_lmdb::{LmdbEnvironment, Migrator};
use quill_sync::{Dispatcher, SyncDriver};
use quill_types::{ChainHead, Clock, GrantBatch, SystemClock};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::account::load_wallet;
use crate::metrics::{serve_metrics, NodeMetrics};
use crate::{NodeConfig, NodeError, ShutdownController};

/// Maximum time to wait for tasks to drain during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// LMDB map size for the ledger environment.
const LEDGER_MAP_SIZE: usize = 4 * 1024 * 1024 * 1024;

/// Head notifications buffered between the tracker and the sync consumer.
const HEAD_BUFFER: usize = 64;

/// Everything the node needs from the outside world.
pub struct NodeParts<S> {
    pub store: Arc<S>,
    pub chain: Arc<dyn ChainClient>,
    pub head_source: Arc<dyn HeadSource>,
    pub clock: Arc<dyn Clock>,
    pub wallet: LocalWallet,
}

pub struct QuillNode<S> {
    config: NodeConfig,
    store: Arc<S>,
    driver: Arc<SyncDriver<S>>,
    head_source: Arc<dyn HeadSource>,
    sequencer: Arc<NonceSequencer>,
    grants: Option<mpsc::UnboundedReceiver<GrantBatch>>,
    metrics: Arc<NodeMetrics>,
    shutdown: ShutdownController,
    task_handles: Vec<JoinHandle<()>>,
}

impl QuillNode<LmdbEnvironment> {
    /// Open the LMDB ledger under `data_dir` and connect to the configured
    /// endpoints.
    pub fn open(config: NodeConfig) -> Result<Self, NodeError> {
        let path = config.ledger_path();
        let env = LmdbEnvironment::open(&path, 0, LEDGER_MAP_SIZE)?;
        Migrator::run(&env)?;
        tracing::info!(path = %path.display(), "ledger opened");

        let chain = EthChain::new(&config.chain.rpc_url, config.rpc_timeout())?;
        let head_source = EthHeadSource::new(config.chain.ws_url.clone(), config.rpc_timeout());
        let wallet = load_wallet(&config.node_account, config.chain.chain_id)?;

        Self::with_parts(
            config,
            NodeParts {
                store: Arc::new(env),
                chain: Arc::new(chain),
                head_source: Arc::new(head_source),
                clock: Arc::new(SystemClock),
                wallet,
            },
        )
    }
}

impl<S> QuillNode<S>
where
    S: LedgerStore + Send + Sync + 'static,
{
    pub fn with_parts(config: NodeConfig, parts: NodeParts<S>) -> Result<Self, NodeError> {
        let abis = Arc::new(ContractAbis::load()?);
        let registry = config.registry()?;
        let policy = config.pool_policy()?;

        let sequencer = Arc::new(NonceSequencer::new(
            parts.chain.clone(),
            parts.wallet,
            abis.clone(),
            registry.clone(),
            config.gas(),
        ));

        let dispatcher = Dispatcher::from_registry(&registry, abis);
        let mut driver = SyncDriver::new(
            parts.store.clone(),
            parts.chain,
            dispatcher,
            parts.clock,
            config.sync_config(),
        )
        .with_policy(policy);

        let grants = if config.incentives.submit_grants {
            let (sink, grants) = mpsc::unbounded_channel();
            driver = driver.with_grant_sink(sink);
            Some(grants)
        } else {
            None
        };

        Ok(Self {
            config,
            store: parts.store,
            driver: Arc::new(driver),
            head_source: parts.head_source,
            sequencer,
            grants,
            metrics: Arc::new(NodeMetrics::new()),
            shutdown: ShutdownController::new(),
            task_handles: Vec::new(),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn driver(&self) -> &Arc<SyncDriver<S>> {
        &self.driver
    }

    pub fn sequencer(&self) -> &Arc<NonceSequencer> {
        &self.sequencer
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.metrics
    }

    /// Spawn every task. Returns once they are running.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        let cursor = self.driver.cursor()?;
        if let Some(cursor) = cursor {
            self.metrics.sync_cursor.set(cursor as i64);
        }
        tracing::info!(
            ?cursor,
            account = ?self.sequencer.account(),
            "Quill node starting"
        );

        let (heads_tx, heads_rx) = mpsc::channel(HEAD_BUFFER);

        let reconnects = self.metrics.clone();
        let tracker = HeadTracker::new(self.head_source.clone())
            .with_reconnect_delay(self.config.reconnect_delay())
            .with_reconnect_hook(move || reconnects.head_reconnects.inc());
        let shutdown_rx = self.shutdown.subscribe();
        self.task_handles
            .push(tokio::spawn(tracker.run(heads_tx, shutdown_rx)));

        self.task_handles.push(tokio::spawn(sync_heads(
            self.driver.clone(),
            heads_rx,
            self.metrics.clone(),
            self.shutdown.subscribe(),
        )));

        if let Some(grants) = self.grants.take() {
            self.task_handles.push(tokio::spawn(submit_grants(
                self.sequencer.clone(),
                grants,
                self.metrics.clone(),
                self.shutdown.subscribe(),
            )));
        }

        if let Some(period) = self.config.inflation_interval() {
            self.task_handles.push(tokio::spawn(trigger_inflation(
                self.sequencer.clone(),
                period,
                self.metrics.clone(),
                self.shutdown.subscribe(),
            )));
        }

        if self.config.enable_metrics {
            let addr = SocketAddr::from(([0, 0, 0, 0], self.config.metrics_port));
            let metrics = self.metrics.clone();
            let shutdown_rx = self.shutdown.subscribe();
            self.task_handles.push(tokio::spawn(async move {
                if let Err(e) = serve_metrics(addr, metrics, shutdown_rx).await {
                    tracing::error!(%addr, error = %e, "metrics endpoint failed");
                }
            }));
        }

        tracing::info!(tasks = self.task_handles.len(), "Quill node started");
        Ok(())
    }

    /// Resolve on SIGINT or SIGTERM; every task is signalled to stop.
    pub async fn wait_for_signal(&self) {
        self.shutdown.wait_for_signal().await;
    }

    /// Signal every task and wait for them, up to [`SHUTDOWN_TIMEOUT`].
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("Quill node stopping");
        self.shutdown.shutdown();

        let handles = std::mem::take(&mut self.task_handles);
        let wait_all = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all).await.is_err() {
            tracing::warn!(
                "shutdown timeout ({:?}), some tasks may still be running",
                SHUTDOWN_TIMEOUT
            );
        }

        tracing::info!("Quill node stopped");
        Ok(())
    }
}

/// Sync on every head. Heads that queued up during a sync are collapsed
/// into the newest one.
async fn sync_heads<S>(
    driver: Arc<SyncDriver<S>>,
    mut heads: mpsc::Receiver<ChainHead>,
    metrics: Arc<NodeMetrics>,
    mut shutdown: broadcast::Receiver<()>,
) where
    S: LedgerStore + Send + Sync + 'static,
{
    loop {
        let mut head = tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            head = heads.recv() => match head {
                Some(head) => head,
                None => break,
            },
        };
        while let Ok(newer) = heads.try_recv() {
            head = newer;
        }
        metrics.chain_head.set(head.height as i64);

        match driver.on_head(&head).await {
            Ok(report) if report.skipped => {}
            Ok(report) => {
                metrics.ranges_synced.inc_by(report.ranges);
                metrics.events_applied.inc_by(report.events);
                metrics.sync_cursor.set(report.cursor as i64);
            }
            Err(e) => {
                metrics.sync_failures.inc();
                tracing::warn!(height = head.height, error = %e, "block synchronization failed");
            }
        }
    }
    tracing::info!("sync consumer shutting down");
}

async fn submit_grants(
    sequencer: Arc<NonceSequencer>,
    mut grants: mpsc::UnboundedReceiver<GrantBatch>,
    metrics: Arc<NodeMetrics>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let batch = tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            batch = grants.recv() => match batch {
                Some(batch) => batch,
                None => break,
            },
        };
        let users = batch.len();
        let total = batch.total();
        let call = ContractCall::GrantIncentives {
            users: batch.users,
            amounts: batch.amounts,
        };
        if submit(&sequencer, &call, &metrics).await {
            tracing::info!(users, %total, "grant batch submitted");
        }
    }
    tracing::info!("grant submitter shutting down");
}

async fn trigger_inflation(
    sequencer: Arc<NonceSequencer>,
    period: Duration,
    metrics: Arc<NodeMetrics>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            _ = interval.tick() => {
                submit(&sequencer, &ContractCall::Inflate, &metrics).await;
            }
        }
    }
    tracing::info!("inflation trigger shutting down");
}

async fn submit(sequencer: &NonceSequencer, call: &ContractCall, metrics: &NodeMetrics) -> bool {
    match sequencer.submit(call).await {
        Ok(_) => {
            metrics.transactions_submitted.inc();
            true
        }
        Err(e) => {
            metrics.transactions_failed.inc();
            tracing::error!(method = call.method(), error = %e, "transaction submission failed");
            false
        }
    }
}
