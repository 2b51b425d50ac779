//! Nullable store: thread-safe in-memory ledger for testing.
//!
//! A transaction takes the store's lock and works on a private copy of every
//! table. Commit swaps the copy in; dropping the transaction discards it.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use quill_store::{LedgerStore, LedgerTxn, MetaStore, StoreError};
use quill_types::{
    Address, Article, ArticleComment, ArticleLike, Dna, Group, GroupArticle, GroupMember,
    IncentiveKind, IncentiveRecord, IncentiveStatus, Timestamp, TokenLock, User,
};

#[derive(Clone, Default)]
struct Tables {
    state: BTreeMap<String, String>,
    users: HashMap<Address, User>,
    articles: HashMap<Dna, Article>,
    groups: HashMap<Dna, Group>,
    members: HashMap<(Dna, Address), GroupMember>,
    group_articles: HashMap<(Dna, Dna, Address), GroupArticle>,
    likes: HashMap<(Dna, Dna, Address), ArticleLike>,
    comments: HashMap<(Dna, Dna, Address, String), ArticleComment>,
    token_locks: Vec<TokenLock>,
    incentives: BTreeMap<u64, IncentiveRecord>,
    next_incentive_id: u64,
    next_token_lock_id: u64,
}

/// An in-memory ledger for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct NullStore {
    tables: Mutex<Tables>,
    meta: Mutex<HashMap<String, Vec<u8>>>,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every incentive record, in id order (for assertions).
    pub fn incentives(&self) -> Vec<IncentiveRecord> {
        self.tables.lock().unwrap().incentives.values().cloned().collect()
    }

    pub fn article(&self, dna: &str) -> Option<Article> {
        self.tables.lock().unwrap().articles.get(&Dna::from(dna)).cloned()
    }

    pub fn group(&self, dna: &str) -> Option<Group> {
        self.tables.lock().unwrap().groups.get(&Dna::from(dna)).cloned()
    }

    pub fn user(&self, address: &Address) -> Option<User> {
        self.tables.lock().unwrap().users.get(address).cloned()
    }

    pub fn state(&self, key: &str) -> Option<String> {
        self.tables.lock().unwrap().state.get(key).cloned()
    }
}

impl LedgerStore for NullStore {
    type Txn<'a> = NullTxn<'a>;

    fn begin(&self) -> Result<Self::Txn<'_>, StoreError> {
        let guard = self
            .tables
            .lock()
            .map_err(|_| StoreError::Backend("null store lock poisoned".into()))?;
        let work = guard.clone();
        Ok(NullTxn { guard, work })
    }
}

impl MetaStore for NullStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.meta.lock().unwrap().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.meta.lock().unwrap().get(key).cloned())
    }
}

/// A write transaction over a [`NullStore`].
pub struct NullTxn<'a> {
    guard: MutexGuard<'a, Tables>,
    work: Tables,
}

impl<'a> LedgerTxn for NullTxn<'a> {
    fn get_state(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.work.state.get(key).cloned())
    }

    fn put_state(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.work.state.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_user(&self, address: &Address) -> Result<Option<User>, StoreError> {
        Ok(self.work.users.get(address).cloned())
    }

    fn put_user(&mut self, user: &User) -> Result<(), StoreError> {
        self.work.users.insert(user.address, user.clone());
        Ok(())
    }

    fn get_article(&self, dna: &Dna) -> Result<Option<Article>, StoreError> {
        Ok(self.work.articles.get(dna).cloned())
    }

    fn put_article(&mut self, article: &Article) -> Result<(), StoreError> {
        self.work.articles.insert(article.dna.clone(), article.clone());
        Ok(())
    }

    fn get_group(&self, dna: &Dna) -> Result<Option<Group>, StoreError> {
        Ok(self.work.groups.get(dna).cloned())
    }

    fn put_group(&mut self, group: &Group) -> Result<(), StoreError> {
        self.work.groups.insert(group.dna.clone(), group.clone());
        Ok(())
    }

    fn get_member(
        &self,
        group_dna: &Dna,
        member: &Address,
    ) -> Result<Option<GroupMember>, StoreError> {
        Ok(self.work.members.get(&(group_dna.clone(), *member)).cloned())
    }

    fn put_member(&mut self, member: &GroupMember) -> Result<(), StoreError> {
        self.work.members.insert(
            (member.group_dna.clone(), member.member_address),
            member.clone(),
        );
        Ok(())
    }

    fn delete_member(&mut self, group_dna: &Dna, member: &Address) -> Result<bool, StoreError> {
        Ok(self
            .work
            .members
            .remove(&(group_dna.clone(), *member))
            .is_some())
    }

    fn get_group_article(
        &self,
        group_dna: &Dna,
        article_dna: &Dna,
        member: &Address,
    ) -> Result<Option<GroupArticle>, StoreError> {
        let key = (group_dna.clone(), article_dna.clone(), *member);
        Ok(self.work.group_articles.get(&key).cloned())
    }

    fn put_group_article(&mut self, share: &GroupArticle) -> Result<(), StoreError> {
        let key = (
            share.group_dna.clone(),
            share.article_dna.clone(),
            share.member_address,
        );
        self.work.group_articles.insert(key, share.clone());
        Ok(())
    }

    fn get_like(
        &self,
        article_dna: &Dna,
        group_dna: &Dna,
        member: &Address,
    ) -> Result<Option<ArticleLike>, StoreError> {
        let key = (article_dna.clone(), group_dna.clone(), *member);
        Ok(self.work.likes.get(&key).cloned())
    }

    fn put_like(&mut self, like: &ArticleLike) -> Result<(), StoreError> {
        let key = (
            like.article_dna.clone(),
            like.group_dna.clone(),
            like.member_address,
        );
        self.work.likes.insert(key, like.clone());
        Ok(())
    }

    fn get_comment(
        &self,
        article_dna: &Dna,
        group_dna: &Dna,
        member: &Address,
        content_hash: &str,
    ) -> Result<Option<ArticleComment>, StoreError> {
        let key = (
            article_dna.clone(),
            group_dna.clone(),
            *member,
            content_hash.to_string(),
        );
        Ok(self.work.comments.get(&key).cloned())
    }

    fn put_comment(&mut self, comment: &ArticleComment) -> Result<(), StoreError> {
        let key = (
            comment.article_dna.clone(),
            comment.group_dna.clone(),
            comment.member_address,
            comment.content_hash.clone(),
        );
        self.work.comments.insert(key, comment.clone());
        Ok(())
    }

    fn insert_token_lock(&mut self, mut lock: TokenLock) -> Result<u64, StoreError> {
        self.work.next_token_lock_id += 1;
        lock.id = self.work.next_token_lock_id;
        let id = lock.id;
        self.work.token_locks.push(lock);
        Ok(id)
    }

    fn token_locks_for(&self, user: &Address) -> Result<Vec<TokenLock>, StoreError> {
        Ok(self
            .work
            .token_locks
            .iter()
            .filter(|lock| lock.user_address == *user)
            .cloned()
            .collect())
    }

    fn insert_incentive(&mut self, mut record: IncentiveRecord) -> Result<u64, StoreError> {
        self.work.next_incentive_id += 1;
        record.id = self.work.next_incentive_id;
        let id = record.id;
        self.work.incentives.insert(id, record);
        Ok(id)
    }

    fn update_incentive(&mut self, record: &IncentiveRecord) -> Result<(), StoreError> {
        match self.work.incentives.get_mut(&record.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("incentive {}", record.id))),
        }
    }

    fn get_incentive(&self, id: u64) -> Result<Option<IncentiveRecord>, StoreError> {
        Ok(self.work.incentives.get(&id).cloned())
    }

    fn incentives_with_status(
        &self,
        status: IncentiveStatus,
    ) -> Result<Vec<IncentiveRecord>, StoreError> {
        Ok(self
            .work
            .incentives
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect())
    }

    fn pending_article_incentive(
        &self,
        article_dna: &Dna,
    ) -> Result<Option<IncentiveRecord>, StoreError> {
        Ok(self
            .work
            .incentives
            .values()
            .find(|r| {
                r.kind == IncentiveKind::Article
                    && r.status == IncentiveStatus::Pending
                    && r.article_dna == *article_dna
            })
            .cloned())
    }

    fn count_user_incentives_since(
        &self,
        user: &Address,
        since: Timestamp,
    ) -> Result<u64, StoreError> {
        Ok(self
            .work
            .incentives
            .values()
            .filter(|r| r.user_address == *user && r.created_at > since)
            .count() as u64)
    }

    fn commit(self) -> Result<(), StoreError> {
        let NullTxn { mut guard, work } = self;
        *guard = work;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_store::{read_cursor, write_cursor};

    #[test]
    fn commit_publishes_and_drop_discards() {
        let store = NullStore::new();

        let mut txn = store.begin().unwrap();
        write_cursor(&mut txn, 10).unwrap();
        txn.commit().unwrap();

        {
            let mut txn = store.begin().unwrap();
            write_cursor(&mut txn, 20).unwrap();
            assert_eq!(read_cursor(&txn).unwrap(), Some(20));
        }

        let txn = store.begin().unwrap();
        assert_eq!(read_cursor(&txn).unwrap(), Some(10));
    }

    #[test]
    fn pending_article_lookup_ignores_other_states() {
        let store = NullStore::new();
        let mut txn = store.begin().unwrap();
        let mut record = IncentiveRecord::pending(
            IncentiveKind::Article,
            Address::repeat_byte(1),
            Timestamp::new(1),
        );
        record.article_dna = Dna::from("A");
        let id = txn.insert_incentive(record.clone()).unwrap();
        assert_eq!(txn.pending_article_incentive(&Dna::from("A")).unwrap().unwrap().id, id);

        record.id = id;
        record.status = IncentiveStatus::Paid;
        txn.update_incentive(&record).unwrap();
        assert!(txn.pending_article_incentive(&Dna::from("A")).unwrap().is_none());
    }

    #[test]
    fn meta_store_round_trip() {
        let store = NullStore::new();
        assert_eq!(store.get_schema_version().unwrap(), 0);
        store.set_schema_version(1).unwrap();
        assert_eq!(store.get_schema_version().unwrap(), 1);
    }
}
