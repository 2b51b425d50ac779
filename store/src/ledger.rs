//! Transactional ledger storage.

use quill_types::{
    Address, Amount, Article, ArticleComment, ArticleLike, Dna, Group, GroupArticle,
    GroupMember, IncentiveRecord, IncentiveStatus, Timestamp, TokenLock, User,
};

use crate::StoreError;

/// A write transaction over the whole ledger.
///
/// Reads observe the transaction's own writes. Only one write transaction is
/// open at a time per store, which gives handlers the exclusive access they
/// need to adjust denormalised counters.
///
/// The trait is object-safe: handlers take `&mut dyn LedgerTxn`.
pub trait LedgerTxn {
    // ── Sync state ──────────────────────────────────────────────────────

    fn get_state(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn put_state(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    // ── Users ───────────────────────────────────────────────────────────

    fn get_user(&self, address: &Address) -> Result<Option<User>, StoreError>;

    fn put_user(&mut self, user: &User) -> Result<(), StoreError>;

    // ── Articles and groups ─────────────────────────────────────────────

    fn get_article(&self, dna: &Dna) -> Result<Option<Article>, StoreError>;

    fn put_article(&mut self, article: &Article) -> Result<(), StoreError>;

    fn get_group(&self, dna: &Dna) -> Result<Option<Group>, StoreError>;

    fn put_group(&mut self, group: &Group) -> Result<(), StoreError>;

    fn get_member(&self, group_dna: &Dna, member: &Address)
        -> Result<Option<GroupMember>, StoreError>;

    fn put_member(&mut self, member: &GroupMember) -> Result<(), StoreError>;

    /// Delete a membership row. Returns whether a row existed.
    fn delete_member(&mut self, group_dna: &Dna, member: &Address) -> Result<bool, StoreError>;

    fn get_group_article(
        &self,
        group_dna: &Dna,
        article_dna: &Dna,
        member: &Address,
    ) -> Result<Option<GroupArticle>, StoreError>;

    fn put_group_article(&mut self, share: &GroupArticle) -> Result<(), StoreError>;

    // ── Engagement ──────────────────────────────────────────────────────

    fn get_like(
        &self,
        article_dna: &Dna,
        group_dna: &Dna,
        member: &Address,
    ) -> Result<Option<ArticleLike>, StoreError>;

    fn put_like(&mut self, like: &ArticleLike) -> Result<(), StoreError>;

    fn get_comment(
        &self,
        article_dna: &Dna,
        group_dna: &Dna,
        member: &Address,
        content_hash: &str,
    ) -> Result<Option<ArticleComment>, StoreError>;

    fn put_comment(&mut self, comment: &ArticleComment) -> Result<(), StoreError>;

    // ── Token locks ─────────────────────────────────────────────────────

    /// Append a lock, assigning and returning its id.
    fn insert_token_lock(&mut self, lock: TokenLock) -> Result<u64, StoreError>;

    fn token_locks_for(&self, user: &Address) -> Result<Vec<TokenLock>, StoreError>;

    // ── Incentives ──────────────────────────────────────────────────────

    /// Append a record, assigning and returning its id.
    fn insert_incentive(&mut self, record: IncentiveRecord) -> Result<u64, StoreError>;

    /// Overwrite an existing record, keeping every index consistent.
    ///
    /// Fails with [`StoreError::NotFound`] if no record has `record.id`.
    fn update_incentive(&mut self, record: &IncentiveRecord) -> Result<(), StoreError>;

    fn get_incentive(&self, id: u64) -> Result<Option<IncentiveRecord>, StoreError>;

    /// All records in `status`, in id (insertion) order.
    fn incentives_with_status(
        &self,
        status: IncentiveStatus,
    ) -> Result<Vec<IncentiveRecord>, StoreError>;

    /// The pending Article-kind record accumulating an article's score, if any.
    fn pending_article_incentive(
        &self,
        article_dna: &Dna,
    ) -> Result<Option<IncentiveRecord>, StoreError>;

    /// Number of records for `user` created strictly after `since`.
    fn count_user_incentives_since(
        &self,
        user: &Address,
        since: Timestamp,
    ) -> Result<u64, StoreError>;

    // ── Provided ────────────────────────────────────────────────────────

    /// Move every record in `from` to `to`. Returns how many moved.
    fn transition_incentives(
        &mut self,
        from: IncentiveStatus,
        to: IncentiveStatus,
    ) -> Result<u64, StoreError> {
        let records = self.incentives_with_status(from)?;
        let moved = records.len() as u64;
        for mut record in records {
            record.status = to;
            self.update_incentive(&record)?;
        }
        Ok(moved)
    }

    /// Sum of `user`'s locks that are still active at `now`.
    fn locked_balance(&self, user: &Address, now: Timestamp) -> Result<Amount, StoreError> {
        Ok(self
            .token_locks_for(user)?
            .iter()
            .filter(|lock| now.is_before_expiry(lock.expire))
            .fold(Amount::zero(), |acc, lock| acc.saturating_add(lock.amount)))
    }

    /// Recorded balance minus active locks, floored at zero.
    fn spendable_balance(&self, user: &Address, now: Timestamp) -> Result<Amount, StoreError> {
        let balance = self.get_user(user)?.map(|u| u.balance).unwrap_or_default();
        Ok(balance.saturating_sub(self.locked_balance(user, now)?))
    }

    /// Make every write in this transaction durable.
    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

/// A ledger backend that hands out write transactions.
pub trait LedgerStore: Send + Sync {
    type Txn<'a>: LedgerTxn
    where
        Self: 'a;

    /// Open a write transaction. Blocks while another one is open.
    fn begin(&self) -> Result<Self::Txn<'_>, StoreError>;
}
