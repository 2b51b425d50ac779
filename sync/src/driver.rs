//! Confirmation-lagged sync.
//!
//! A head notification at height `h` makes `h - confirmation_depth` the
//! confirmed height. The persisted cursor walks up to it in ranges of at most
//! `batch_width` blocks; every range is fetched, applied and recorded in one
//! ledger transaction, so a failed range leaves the cursor where it was.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use quill_chain::ChainClient;
use quill_incentives::PoolPolicy;
use quill_store::{read_cursor, write_cursor, LedgerStore, LedgerTxn, CURRENT_BLOCK_HASH};
use quill_types::{ChainHead, Clock, GrantBatch, RawLogEntry};
use tokio::sync::mpsc;

use crate::{ApplyContext, Dispatcher, HandlerOutcome, SyncError};

pub const DEFAULT_CONFIRMATION_DEPTH: u64 = 6;
pub const DEFAULT_BATCH_WIDTH: u64 = 100_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    pub confirmation_depth: u64,
    /// Most blocks fetched and applied in one transaction.
    pub batch_width: u64,
    /// Cursor used when the ledger has never synced.
    pub start_block: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            confirmation_depth: DEFAULT_CONFIRMATION_DEPTH,
            batch_width: DEFAULT_BATCH_WIDTH,
            start_block: 0,
        }
    }
}

/// What one sync attempt did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Another attempt was in flight; nothing was done.
    pub skipped: bool,
    pub confirmed: Option<u64>,
    pub ranges: u64,
    pub events: u64,
    /// Cursor after the attempt.
    pub cursor: u64,
    pub grant_batches: usize,
}

impl SyncReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

/// Clears the in-flight flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SyncDriver<S> {
    store: Arc<S>,
    chain: Arc<dyn ChainClient>,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
    policy: PoolPolicy,
    grant_sink: Option<mpsc::UnboundedSender<GrantBatch>>,
    in_flight: AtomicBool,
}

impl<S: LedgerStore> SyncDriver<S> {
    pub fn new(
        store: Arc<S>,
        chain: Arc<dyn ChainClient>,
        dispatcher: Dispatcher,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            chain,
            dispatcher,
            clock,
            config,
            policy: PoolPolicy::default(),
            grant_sink: None,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_policy(mut self, policy: PoolPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Deliver the grant batches of every committed range to `sink`.
    pub fn with_grant_sink(mut self, sink: mpsc::UnboundedSender<GrantBatch>) -> Self {
        self.grant_sink = Some(sink);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The persisted cursor, `None` before the first committed range.
    pub fn cursor(&self) -> Result<Option<u64>, SyncError> {
        let txn = self.store.begin()?;
        Ok(read_cursor(&txn)?)
    }

    /// Record the notified head hash, then sync up to its confirmed height.
    pub async fn on_head(&self, head: &ChainHead) -> Result<SyncReport, SyncError> {
        self.record_head(head)?;
        self.sync_to(head.height).await
    }

    fn record_head(&self, head: &ChainHead) -> Result<(), SyncError> {
        let mut txn = self.store.begin()?;
        txn.put_state(CURRENT_BLOCK_HASH, &head.hash)?;
        txn.commit()?;
        Ok(())
    }

    /// Walk the cursor up to `notified - confirmation_depth`.
    ///
    /// Returns a skipped report when another attempt is already running.
    pub async fn sync_to(&self, notified: u64) -> Result<SyncReport, SyncError> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!(notified, "sync already in progress");
            return Ok(SyncReport::skipped());
        };

        let mut cursor = self.cursor()?.unwrap_or(self.config.start_block);
        let mut report = SyncReport {
            cursor,
            ..Default::default()
        };
        let Some(confirmed) = notified.checked_sub(self.config.confirmation_depth) else {
            return Ok(report);
        };
        report.confirmed = Some(confirmed);

        let addresses = self.dispatcher.addresses();
        let width = self.config.batch_width.max(1);
        while cursor < confirmed {
            let from = cursor + 1;
            let to = cursor.saturating_add(width).min(confirmed);

            let mut logs = self.chain.logs_in_range(&addresses, from, to).await?;
            logs.sort_by_key(|log| (log.block_number, log.log_index.unwrap_or(0)));

            let outcome = match self.apply_range(&logs, to) {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(from, to, error = %e, "range rolled back");
                    return Err(e);
                }
            };

            cursor = to;
            report.cursor = to;
            report.ranges += 1;
            report.events += logs.len() as u64;
            report.grant_batches += outcome.grants.len();
            self.deliver(outcome.grants);
            tracing::info!(from, events = logs.len(), "synchronized to block #{to}");
        }
        Ok(report)
    }

    /// Apply `logs` and advance the cursor to `end` in one transaction.
    fn apply_range(&self, logs: &[RawLogEntry], end: u64) -> Result<HandlerOutcome, SyncError> {
        let mut txn = self.store.begin()?;
        let mut outcome = HandlerOutcome::default();
        for log in logs {
            let ctx = ApplyContext {
                now: self.clock.now(),
                block_number: log.block_number,
                policy: self.policy,
            };
            outcome.merge(self.dispatcher.dispatch(&mut txn, log, &ctx)?);
        }
        write_cursor(&mut txn, end)?;
        txn.commit()?;
        Ok(outcome)
    }

    fn deliver(&self, grants: Vec<GrantBatch>) {
        for batch in grants {
            match &self.grant_sink {
                Some(sink) => {
                    if sink.send(batch).is_err() {
                        tracing::warn!("grant submitter gone, dropping batch");
                    }
                }
                None => tracing::info!(
                    users = batch.len(),
                    total = %batch.total(),
                    "grant batch assigned"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let first = InFlight::acquire(&flag);
        assert!(first.is_some());
        assert!(InFlight::acquire(&flag).is_none());
        drop(first);
        assert!(InFlight::acquire(&flag).is_some());
    }

    #[test]
    fn defaults_follow_deployment() {
        let config = SyncConfig::default();
        assert_eq!(config.confirmation_depth, 6);
        assert_eq!(config.batch_width, 100_000);
        assert_eq!(config.start_block, 0);
    }
}
