//! JSON-RPC backed chain access.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, Ws};
use ethers::types::{Address, BlockId, BlockNumber, Bytes, Filter, H256, U256};
use futures_util::StreamExt;
use quill_types::{HeadNotification, RawLogEntry};
use tokio::sync::{mpsc, oneshot};

use crate::client::{ChainClient, HeadSource};
use crate::ChainError;

const HEAD_CHANNEL_CAPACITY: usize = 64;

/// HTTP JSON-RPC client with a per-call timeout.
#[derive(Clone, Debug)]
pub struct EthChain {
    provider: Provider<Http>,
    timeout: Duration,
}

impl EthChain {
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ChainError::Transport(format!("invalid rpc url {rpc_url}: {e}")))?;
        Ok(Self { provider, timeout })
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, ChainError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| ChainError::Transport(e.to_string())),
            Err(_) => Err(ChainError::Timeout {
                operation,
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl ChainClient for EthChain {
    async fn logs_in_range(
        &self,
        addresses: &[Address],
        from: u64,
        to: u64,
    ) -> Result<Vec<RawLogEntry>, ChainError> {
        let filter = Filter::new()
            .from_block(from)
            .to_block(to)
            .address(addresses.to_vec());
        let logs = self
            .bounded("eth_getLogs", self.provider.get_logs(&filter))
            .await
            .map_err(|e| {
                tracing::error!(from, to, error = %e, "log query failed");
                e
            })?;

        logs.into_iter()
            .map(|log| {
                if !addresses.contains(&log.address) {
                    return Err(ChainError::Transport(format!(
                        "provider returned a log from unrequested address {:?}",
                        log.address
                    )));
                }
                let block_number = log
                    .block_number
                    .ok_or_else(|| {
                        ChainError::Transport("provider returned a log without block_number".into())
                    })?
                    .as_u64();
                Ok(RawLogEntry {
                    address: log.address,
                    topics: log.topics,
                    data: log.data.to_vec(),
                    block_number,
                    block_hash: log.block_hash,
                    log_index: log.log_index.map(|i| i.as_u64()),
                })
            })
            .collect()
    }

    async fn confirmed_nonce(&self, account: Address) -> Result<U256, ChainError> {
        self.bounded(
            "eth_getTransactionCount",
            self.provider
                .get_transaction_count(account, Some(BlockId::Number(BlockNumber::Latest))),
        )
        .await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, ChainError> {
        let result = tokio::time::timeout(self.timeout, self.provider.send_raw_transaction(raw)).await;
        match result {
            Ok(Ok(pending)) => Ok(pending.tx_hash()),
            Ok(Err(e)) => Err(ChainError::from_submission(e.to_string())),
            Err(_) => Err(ChainError::Timeout {
                operation: "eth_sendRawTransaction",
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

/// WebSocket `newHeads` subscription.
///
/// Both the connection handshake and the `eth_subscribe` round trip are
/// bounded by `timeout`, so a silent peer surfaces as an error and the
/// tracker can reconnect.
#[derive(Clone, Debug)]
pub struct EthHeadSource {
    ws_url: String,
    timeout: Duration,
}

impl EthHeadSource {
    pub fn new(ws_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ws_url: ws_url.into(),
            timeout,
        }
    }

    fn timed_out(&self, operation: &'static str) -> ChainError {
        ChainError::Timeout {
            operation,
            secs: self.timeout.as_secs(),
        }
    }
}

#[async_trait]
impl HeadSource for EthHeadSource {
    async fn subscribe(&self) -> Result<mpsc::Receiver<HeadNotification>, ChainError> {
        let connect = Provider::<Ws>::connect(self.ws_url.as_str());
        let provider = match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(provider)) => provider,
            Ok(Err(e)) => return Err(ChainError::Subscription(e.to_string())),
            Err(_) => return Err(self.timed_out("ws connect")),
        };

        let (tx, rx) = mpsc::channel(HEAD_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut stream = match provider.subscribe::<_, HeadNotification>(["newHeads"]).await {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };
            while let Some(head) = stream.next().await {
                if tx.send(head).await.is_err() {
                    break;
                }
            }
            tracing::debug!("newHeads stream ended");
        });

        match tokio::time::timeout(self.timeout, ready_rx).await {
            Ok(Ok(Ok(()))) => Ok(rx),
            Ok(Ok(Err(reason))) => Err(ChainError::Subscription(reason)),
            Ok(Err(_)) => Err(ChainError::Subscription("subscription task exited".into())),
            Err(_) => {
                task.abort();
                Err(self.timed_out("eth_subscribe"))
            }
        }
    }
}
