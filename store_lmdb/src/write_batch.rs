//! Write batching: one LMDB write transaction spanning every ledger database.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = env.write_batch()?;
//! batch.put_article(&article)?;
//! quill_store::write_cursor(&mut batch, 1_204)?;
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`LedgerTxn::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).

use heed::types::Bytes;
use heed::{Database, RwTxn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use quill_store::keys::{comment_key, group_article_key, like_key, member_key, KeyBuilder};
use quill_store::{LedgerTxn, StoreError};
use quill_types::{
    Address, Article, ArticleComment, ArticleLike, Dna, Group, GroupArticle, GroupMember,
    IncentiveKind, IncentiveRecord, IncentiveStatus, Timestamp, TokenLock, User,
};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

const NEXT_INCENTIVE_ID: &[u8] = b"next_incentive_id";
const NEXT_TOKEN_LOCK_ID: &[u8] = b"next_token_lock_id";

/// A write batch that groups every ledger mutation of one unit of work into
/// a single LMDB write transaction.
pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> WriteBatch<'a> {
    /// Begin a new write batch.
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, StoreError> {
        let txn = env.env().write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, env })
    }

    // ── Encoding helpers ────────────────────────────────────────────────

    fn get_row<T: DeserializeOwned>(
        &self,
        db: Database<Bytes, Bytes>,
        key: &[u8],
    ) -> Result<Option<T>, StoreError> {
        match db.get(&self.txn, key).map_err(LmdbError::from)? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn put_row<T: Serialize>(
        &mut self,
        db: Database<Bytes, Bytes>,
        key: &[u8],
        row: &T,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(row).map_err(LmdbError::from)?;
        db.put(&mut self.txn, key, &bytes).map_err(LmdbError::from)?;
        Ok(())
    }

    /// Allocate the next id from a counter in `meta_db` (ids start at 1).
    fn next_id(&mut self, counter: &[u8]) -> Result<u64, StoreError> {
        let current = self
            .env
            .meta_db
            .get(&self.txn, counter)
            .map_err(LmdbError::from)?
            .and_then(|b| <[u8; 8]>::try_from(b).ok().map(u64::from_be_bytes))
            .unwrap_or(0);
        let next = current + 1;
        self.env
            .meta_db
            .put(&mut self.txn, counter, &next.to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(next)
    }

    // ── Incentive indexes ───────────────────────────────────────────────

    fn status_key(status: IncentiveStatus, id: u64) -> Vec<u8> {
        KeyBuilder::new().byte(status.code()).u64(id).build()
    }

    fn user_time_key(record: &IncentiveRecord) -> Vec<u8> {
        let mut key = record.user_address.as_bytes().to_vec();
        key.extend_from_slice(&record.created_at.as_secs().to_be_bytes());
        key.extend_from_slice(&record.id.to_be_bytes());
        key
    }

    fn is_pending_article(record: &IncentiveRecord) -> bool {
        record.kind == IncentiveKind::Article && record.status == IncentiveStatus::Pending
    }

    fn index_incentive(&mut self, record: &IncentiveRecord) -> Result<(), StoreError> {
        let env = self.env;
        env.incentive_status_db
            .put(&mut self.txn, &Self::status_key(record.status, record.id), &[])
            .map_err(LmdbError::from)?;
        env.user_incentives_db
            .put(&mut self.txn, &Self::user_time_key(record), &[])
            .map_err(LmdbError::from)?;
        if Self::is_pending_article(record) {
            env.pending_article_db
                .put(
                    &mut self.txn,
                    record.article_dna.as_str().as_bytes(),
                    &record.id.to_be_bytes(),
                )
                .map_err(LmdbError::from)?;
        }
        Ok(())
    }

    fn unindex_incentive(&mut self, record: &IncentiveRecord) -> Result<(), StoreError> {
        let env = self.env;
        env.incentive_status_db
            .delete(&mut self.txn, &Self::status_key(record.status, record.id))
            .map_err(LmdbError::from)?;
        env.user_incentives_db
            .delete(&mut self.txn, &Self::user_time_key(record))
            .map_err(LmdbError::from)?;
        if Self::is_pending_article(record) {
            let dna_key = record.article_dna.as_str().as_bytes();
            let indexed = env
                .pending_article_db
                .get(&self.txn, dna_key)
                .map_err(LmdbError::from)?
                .map(|b| b == record.id.to_be_bytes().as_slice())
                .unwrap_or(false);
            if indexed {
                env.pending_article_db
                    .delete(&mut self.txn, dna_key)
                    .map_err(LmdbError::from)?;
            }
        }
        Ok(())
    }
}

impl<'a> LedgerTxn for WriteBatch<'a> {
    // ── Sync state ──────────────────────────────────────────────────────

    fn get_state(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .env
            .state_db
            .get(&self.txn, key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(value.map(|b| String::from_utf8_lossy(b).into_owned()))
    }

    fn put_state(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.env
            .state_db
            .put(&mut self.txn, key.as_bytes(), value.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Users ───────────────────────────────────────────────────────────

    fn get_user(&self, address: &Address) -> Result<Option<User>, StoreError> {
        self.get_row(self.env.users_db, address.as_bytes())
    }

    fn put_user(&mut self, user: &User) -> Result<(), StoreError> {
        self.put_row(self.env.users_db, user.address.as_bytes(), user)
    }

    // ── Articles and groups ─────────────────────────────────────────────

    fn get_article(&self, dna: &Dna) -> Result<Option<Article>, StoreError> {
        self.get_row(self.env.articles_db, dna.as_str().as_bytes())
    }

    fn put_article(&mut self, article: &Article) -> Result<(), StoreError> {
        self.put_row(self.env.articles_db, article.dna.as_str().as_bytes(), article)
    }

    fn get_group(&self, dna: &Dna) -> Result<Option<Group>, StoreError> {
        self.get_row(self.env.groups_db, dna.as_str().as_bytes())
    }

    fn put_group(&mut self, group: &Group) -> Result<(), StoreError> {
        self.put_row(self.env.groups_db, group.dna.as_str().as_bytes(), group)
    }

    fn get_member(
        &self,
        group_dna: &Dna,
        member: &Address,
    ) -> Result<Option<GroupMember>, StoreError> {
        self.get_row(self.env.members_db, &member_key(group_dna, member))
    }

    fn put_member(&mut self, member: &GroupMember) -> Result<(), StoreError> {
        let key = member_key(&member.group_dna, &member.member_address);
        self.put_row(self.env.members_db, &key, member)
    }

    fn delete_member(&mut self, group_dna: &Dna, member: &Address) -> Result<bool, StoreError> {
        let existed = self
            .env
            .members_db
            .delete(&mut self.txn, &member_key(group_dna, member))
            .map_err(LmdbError::from)?;
        Ok(existed)
    }

    fn get_group_article(
        &self,
        group_dna: &Dna,
        article_dna: &Dna,
        member: &Address,
    ) -> Result<Option<GroupArticle>, StoreError> {
        self.get_row(
            self.env.group_articles_db,
            &group_article_key(group_dna, article_dna, member),
        )
    }

    fn put_group_article(&mut self, share: &GroupArticle) -> Result<(), StoreError> {
        let key = group_article_key(&share.group_dna, &share.article_dna, &share.member_address);
        self.put_row(self.env.group_articles_db, &key, share)
    }

    // ── Engagement ──────────────────────────────────────────────────────

    fn get_like(
        &self,
        article_dna: &Dna,
        group_dna: &Dna,
        member: &Address,
    ) -> Result<Option<ArticleLike>, StoreError> {
        self.get_row(self.env.likes_db, &like_key(article_dna, group_dna, member))
    }

    fn put_like(&mut self, like: &ArticleLike) -> Result<(), StoreError> {
        let key = like_key(&like.article_dna, &like.group_dna, &like.member_address);
        self.put_row(self.env.likes_db, &key, like)
    }

    fn get_comment(
        &self,
        article_dna: &Dna,
        group_dna: &Dna,
        member: &Address,
        content_hash: &str,
    ) -> Result<Option<ArticleComment>, StoreError> {
        self.get_row(
            self.env.comments_db,
            &comment_key(article_dna, group_dna, member, content_hash),
        )
    }

    fn put_comment(&mut self, comment: &ArticleComment) -> Result<(), StoreError> {
        let key = comment_key(
            &comment.article_dna,
            &comment.group_dna,
            &comment.member_address,
            &comment.content_hash,
        );
        self.put_row(self.env.comments_db, &key, comment)
    }

    // ── Token locks ─────────────────────────────────────────────────────

    fn insert_token_lock(&mut self, mut lock: TokenLock) -> Result<u64, StoreError> {
        let id = self.next_id(NEXT_TOKEN_LOCK_ID)?;
        lock.id = id;
        let mut key = lock.user_address.as_bytes().to_vec();
        key.extend_from_slice(&id.to_be_bytes());
        self.put_row(self.env.token_locks_db, &key, &lock)?;
        Ok(id)
    }

    fn token_locks_for(&self, user: &Address) -> Result<Vec<TokenLock>, StoreError> {
        let iter = self
            .env
            .token_locks_db
            .prefix_iter(&self.txn, user.as_bytes())
            .map_err(LmdbError::from)?;
        let mut locks = Vec::new();
        for entry in iter {
            let (_, value) = entry.map_err(LmdbError::from)?;
            locks.push(bincode::deserialize(value).map_err(LmdbError::from)?);
        }
        Ok(locks)
    }

    // ── Incentives ──────────────────────────────────────────────────────

    fn insert_incentive(&mut self, mut record: IncentiveRecord) -> Result<u64, StoreError> {
        let id = self.next_id(NEXT_INCENTIVE_ID)?;
        record.id = id;
        self.put_row(self.env.incentives_db, &id.to_be_bytes(), &record)?;
        self.index_incentive(&record)?;
        Ok(id)
    }

    fn update_incentive(&mut self, record: &IncentiveRecord) -> Result<(), StoreError> {
        let old: IncentiveRecord = self
            .get_incentive(record.id)?
            .ok_or_else(|| StoreError::NotFound(format!("incentive {}", record.id)))?;
        self.unindex_incentive(&old)?;
        self.put_row(self.env.incentives_db, &record.id.to_be_bytes(), record)?;
        self.index_incentive(record)
    }

    fn get_incentive(&self, id: u64) -> Result<Option<IncentiveRecord>, StoreError> {
        self.get_row(self.env.incentives_db, &id.to_be_bytes())
    }

    fn incentives_with_status(
        &self,
        status: IncentiveStatus,
    ) -> Result<Vec<IncentiveRecord>, StoreError> {
        let prefix = [status.code()];
        let iter = self
            .env
            .incentive_status_db
            .prefix_iter(&self.txn, &prefix[..])
            .map_err(LmdbError::from)?;
        let mut ids = Vec::new();
        for entry in iter {
            let (key, _) = entry.map_err(LmdbError::from)?;
            let id_bytes: [u8; 8] = key
                .get(1..9)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| StoreError::Corruption("short incentive status key".into()))?;
            ids.push(u64::from_be_bytes(id_bytes));
        }

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self
                .get_incentive(id)?
                .ok_or_else(|| StoreError::Corruption(format!("status index points at missing incentive {id}")))?;
            records.push(record);
        }
        Ok(records)
    }

    fn pending_article_incentive(
        &self,
        article_dna: &Dna,
    ) -> Result<Option<IncentiveRecord>, StoreError> {
        let id = self
            .env
            .pending_article_db
            .get(&self.txn, article_dna.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .and_then(|b| <[u8; 8]>::try_from(b).ok().map(u64::from_be_bytes));
        match id {
            Some(id) => self.get_incentive(id),
            None => Ok(None),
        }
    }

    fn count_user_incentives_since(
        &self,
        user: &Address,
        since: Timestamp,
    ) -> Result<u64, StoreError> {
        let iter = self
            .env
            .user_incentives_db
            .prefix_iter(&self.txn, user.as_bytes())
            .map_err(LmdbError::from)?;
        let mut count = 0;
        for entry in iter {
            let (key, _) = entry.map_err(LmdbError::from)?;
            let created: [u8; 8] = key
                .get(20..28)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| StoreError::Corruption("short user incentive key".into()))?;
            if u64::from_be_bytes(created) > since.as_secs() {
                count += 1;
            }
        }
        Ok(count)
    }

    // ── Commit / rollback ───────────────────────────────────────────────

    /// Commit all batched operations in a single write transaction.
    fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
