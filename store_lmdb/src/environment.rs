//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use quill_store::{LedgerStore, StoreError};

use crate::write_batch::WriteBatch;
use crate::LmdbError;

/// Number of named databases opened below.
pub const LEDGER_DB_COUNT: u32 = 16;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Env,
    pub(crate) state_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
    pub(crate) users_db: Database<Bytes, Bytes>,
    pub(crate) articles_db: Database<Bytes, Bytes>,
    pub(crate) groups_db: Database<Bytes, Bytes>,
    pub(crate) members_db: Database<Bytes, Bytes>,
    pub(crate) group_articles_db: Database<Bytes, Bytes>,
    pub(crate) likes_db: Database<Bytes, Bytes>,
    pub(crate) comments_db: Database<Bytes, Bytes>,
    /// `(user, lock_id_be)` → lock
    pub(crate) token_locks_db: Database<Bytes, Bytes>,
    /// `id_be` → record
    pub(crate) incentives_db: Database<Bytes, Bytes>,
    /// `(status_code, id_be)` → ()
    pub(crate) incentive_status_db: Database<Bytes, Bytes>,
    /// `(user, created_at_be, id_be)` → ()
    pub(crate) user_incentives_db: Database<Bytes, Bytes>,
    /// `article_dna` → `id_be` of its pending Article-kind record
    pub(crate) pending_article_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the node opens each environment path exactly once per process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs.max(LEDGER_DB_COUNT))
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let state_db = env.create_database(&mut wtxn, Some("state"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        let users_db = env.create_database(&mut wtxn, Some("users"))?;
        let articles_db = env.create_database(&mut wtxn, Some("articles"))?;
        let groups_db = env.create_database(&mut wtxn, Some("groups"))?;
        let members_db = env.create_database(&mut wtxn, Some("group_members"))?;
        let group_articles_db = env.create_database(&mut wtxn, Some("group_articles"))?;
        let likes_db = env.create_database(&mut wtxn, Some("article_likes"))?;
        let comments_db = env.create_database(&mut wtxn, Some("article_comments"))?;
        let token_locks_db = env.create_database(&mut wtxn, Some("token_locks"))?;
        let incentives_db = env.create_database(&mut wtxn, Some("incentives"))?;
        let incentive_status_db = env.create_database(&mut wtxn, Some("incentive_status"))?;
        let user_incentives_db = env.create_database(&mut wtxn, Some("user_incentives"))?;
        let pending_article_db = env.create_database(&mut wtxn, Some("pending_article"))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env,
            state_db,
            meta_db,
            users_db,
            articles_db,
            groups_db,
            members_db,
            group_articles_db,
            likes_db,
            comments_db,
            token_locks_db,
            incentives_db,
            incentive_status_db,
            user_incentives_db,
            pending_article_db,
        })
    }

    /// Access the raw heed environment.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Begin a write batch spanning every ledger database.
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, StoreError> {
        WriteBatch::new(self)
    }
}

impl LedgerStore for LmdbEnvironment {
    type Txn<'a> = WriteBatch<'a>;

    fn begin(&self) -> Result<Self::Txn<'_>, StoreError> {
        self.write_batch()
    }
}
