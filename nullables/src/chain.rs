//! Nullable chain: scripted logs, nonces and head notifications.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;
use quill_chain::{ChainClient, ChainError, HeadSource};
use quill_types::{HeadNotification, RawLogEntry};
use tokio::sync::mpsc;

/// A chain client that serves pre-loaded logs and records submissions.
#[derive(Default)]
pub struct NullChain {
    logs: Mutex<Vec<RawLogEntry>>,
    nonce: Mutex<U256>,
    sent: Mutex<Vec<Bytes>>,
    send_failures: Mutex<VecDeque<ChainError>>,
    queries: Mutex<Vec<(u64, u64)>>,
    fail_logs_at: Mutex<Option<u64>>,
}

impl NullChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a log to the simulated chain.
    pub fn push_log(&self, log: RawLogEntry) {
        self.logs.lock().unwrap().push(log);
    }

    /// Set the account nonce the chain reports.
    pub fn set_nonce(&self, nonce: u64) {
        *self.nonce.lock().unwrap() = U256::from(nonce);
    }

    /// Make the next send fail with `error`.
    pub fn fail_next_send(&self, error: ChainError) {
        self.send_failures.lock().unwrap().push_back(error);
    }

    /// Make every log query whose range covers `height` fail.
    pub fn fail_logs_at(&self, height: u64) {
        *self.fail_logs_at.lock().unwrap() = Some(height);
    }

    pub fn clear_log_failure(&self) {
        *self.fail_logs_at.lock().unwrap() = None;
    }

    /// Raw transactions accepted so far.
    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().unwrap().clone()
    }

    /// `(from, to)` of every log query, in call order.
    pub fn queries(&self) -> Vec<(u64, u64)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for NullChain {
    async fn logs_in_range(
        &self,
        addresses: &[Address],
        from: u64,
        to: u64,
    ) -> Result<Vec<RawLogEntry>, ChainError> {
        self.queries.lock().unwrap().push((from, to));
        if let Some(height) = *self.fail_logs_at.lock().unwrap() {
            if (from..=to).contains(&height) {
                return Err(ChainError::Transport(format!(
                    "scripted failure at block {height}"
                )));
            }
        }
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| {
                addresses.contains(&log.address) && (from..=to).contains(&log.block_number)
            })
            .cloned()
            .collect())
    }

    async fn confirmed_nonce(&self, _account: Address) -> Result<U256, ChainError> {
        Ok(*self.nonce.lock().unwrap())
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, ChainError> {
        if let Some(error) = self.send_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        let hash = H256(keccak256(&raw));
        self.sent.lock().unwrap().push(raw);
        Ok(hash)
    }
}

/// A head source that plays back scripted subscription sessions.
///
/// Each `subscribe` consumes one session: the notifications are delivered and
/// the stream closes. Once the script is exhausted, subscriptions stay open
/// and silent.
#[derive(Default)]
pub struct NullHeadSource {
    sessions: Mutex<VecDeque<Result<Vec<HeadNotification>, String>>>,
    subscriptions: Mutex<u64>,
    idle: Mutex<Vec<mpsc::Sender<HeadNotification>>>,
}

impl NullHeadSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a session delivering `heads` (as `0x` hex heights) then closing.
    pub fn push_session(&self, heads: &[u64]) {
        let notifications = heads
            .iter()
            .map(|h| HeadNotification {
                number: format!("0x{h:x}"),
                hash: format!("0x{h:064x}"),
            })
            .collect();
        self.sessions.lock().unwrap().push_back(Ok(notifications));
    }

    /// Queue a session delivering raw notifications, malformed or not.
    pub fn push_raw_session(&self, notifications: Vec<HeadNotification>) {
        self.sessions.lock().unwrap().push_back(Ok(notifications));
    }

    /// Queue a failed subscription attempt.
    pub fn push_failure(&self, reason: &str) {
        self.sessions.lock().unwrap().push_back(Err(reason.to_string()));
    }

    /// How many times `subscribe` was called.
    pub fn subscriptions(&self) -> u64 {
        *self.subscriptions.lock().unwrap()
    }
}

#[async_trait]
impl HeadSource for NullHeadSource {
    async fn subscribe(&self) -> Result<mpsc::Receiver<HeadNotification>, ChainError> {
        *self.subscriptions.lock().unwrap() += 1;
        let session = self.sessions.lock().unwrap().pop_front();
        match session {
            Some(Ok(notifications)) => {
                let (tx, rx) = mpsc::channel(notifications.len().max(1));
                for n in notifications {
                    // capacity covers every notification
                    let _ = tx.try_send(n);
                }
                Ok(rx)
            }
            Some(Err(reason)) => Err(ChainError::Subscription(reason)),
            None => {
                let (tx, rx) = mpsc::channel(1);
                self.idle.lock().unwrap().push(tx);
                Ok(rx)
            }
        }
    }
}
