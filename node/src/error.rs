use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("store error: {0}")]
    Store(#[from] quill_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] quill_store_lmdb::LmdbError),

    #[error("chain error: {0}")]
    Chain(#[from] quill_chain::ChainError),

    #[error("sync error: {0}")]
    Sync(#[from] quill_sync::SyncError),

    #[error("config error: {0}")]
    Config(String),

    #[error("node account error: {0}")]
    Account(String),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
