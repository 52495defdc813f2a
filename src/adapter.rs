use async_trait::async_trait;

use crate::{DataApiError, Result};

/// Capability flags and migration locking for a dialect.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait DialectAdapter: Send + Sync {
    fn supports_create_if_not_exists(&self) -> bool {
        true
    }

    fn supports_transactional_ddl(&self) -> bool;

    fn supports_returning(&self) -> bool;

    async fn acquire_migration_lock(&self) -> Result<()>;

    async fn release_migration_lock(&self) -> Result<()>;
}

/// The Data API has no `RETURNING`, no transactional DDL and no advisory
/// lock primitive.
#[derive(Clone, Copy, Debug, Default)]
pub struct DataApiAdapter;

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl DialectAdapter for DataApiAdapter {
    fn supports_transactional_ddl(&self) -> bool {
        false
    }

    fn supports_returning(&self) -> bool {
        false
    }

    async fn acquire_migration_lock(&self) -> Result<()> {
        Err(DataApiError::LocksNotSupported)
    }

    async fn release_migration_lock(&self) -> Result<()> {
        Err(DataApiError::LocksNotSupported)
    }
}
