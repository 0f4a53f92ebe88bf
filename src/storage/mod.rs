mod codec;
mod memory;
mod repository;

pub use codec::*;
pub use memory::*;
pub use repository::*;

use anyhow::Result;

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Key under which the expense ledger is stored
pub const EXPENSES_KEY: &str = "expenses";

/// A key-value store holding opaque text blobs.
#[allow(async_fn_in_trait)]
pub trait BlobStore {
    /// Read the blob stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous blob.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: BlobStore + ?Sized> BlobStore for &S {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }
}
