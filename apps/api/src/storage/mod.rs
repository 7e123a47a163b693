//! Persistence adapters: the file service (S3 / MinIO) and the KV service (Redis).
//!
//! Both sit behind traits so the analysis pipeline can run against in-memory
//! fakes in tests. `AppState` carries them as `Arc<dyn FileStore>` and
//! `Arc<dyn KvStore>`.

pub mod files;
pub mod kv;

use thiserror::Error;

pub use files::{FileStore, S3FileStore, StoredFile};
pub use kv::{KvStore, RedisKvStore};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object '{0}' not found")]
    NotFound(String),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}
