use async_trait::async_trait;

use crate::{
    ColumnMetadataStore, DataApiCodec, DataApiConfig, DataApiConnection, DataApiError,
    DatabaseConnection, ResultDeserializer, Result,
};

/// Connection lifecycle and transaction control for a dialect.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Driver: Send + Sync {
    async fn init(&self) -> Result<()>;

    async fn acquire_connection(&self) -> Result<Box<dyn DatabaseConnection>>;

    async fn begin_transaction(&self, connection: &dyn DatabaseConnection) -> Result<()>;

    async fn commit_transaction(&self, connection: &dyn DatabaseConnection) -> Result<()>;

    async fn rollback_transaction(&self, connection: &dyn DatabaseConnection) -> Result<()>;

    async fn release_connection(&self, connection: Box<dyn DatabaseConnection>) -> Result<()>;

    async fn destroy(&self) -> Result<()>;
}

/// Driver for the Data API.
///
/// There is no socket behind a connection, so acquiring and releasing one is
/// bookkeeping only. The Data API has no sessions, so every transaction
/// operation fails with [`DataApiError::TransactionsNotSupported`].
#[derive(Debug)]
pub struct DataApiDriver {
    config: DataApiConfig,
    codec: DataApiCodec,
    metadata: ColumnMetadataStore,
    deserializer: Option<ResultDeserializer>,
}

impl DataApiDriver {
    /// Creates a driver that records column metadata into `metadata`.
    pub fn new(config: &DataApiConfig, metadata: ColumnMetadataStore) -> Self {
        Self {
            config: config.clone(),
            codec: DataApiCodec::new(config),
            metadata,
            deserializer: config.deserialization.clone().map(ResultDeserializer::new),
        }
    }

    pub fn metadata_store(&self) -> &ColumnMetadataStore {
        &self.metadata
    }

    /// Typed variant of [`Driver::acquire_connection`].
    pub fn connection(&self) -> DataApiConnection {
        DataApiConnection::new(
            self.codec.clone(),
            self.metadata.clone(),
            self.deserializer.clone(),
        )
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Driver for DataApiDriver {
    /// Rejects settings that cannot form a request. Nothing is sent.
    async fn init(&self) -> Result<()> {
        self.config.validate()
    }

    async fn acquire_connection(&self) -> Result<Box<dyn DatabaseConnection>> {
        Ok(Box::new(self.connection()))
    }

    async fn begin_transaction(&self, _connection: &dyn DatabaseConnection) -> Result<()> {
        Err(DataApiError::TransactionsNotSupported)
    }

    async fn commit_transaction(&self, _connection: &dyn DatabaseConnection) -> Result<()> {
        Err(DataApiError::TransactionsNotSupported)
    }

    async fn rollback_transaction(&self, _connection: &dyn DatabaseConnection) -> Result<()> {
        Err(DataApiError::TransactionsNotSupported)
    }

    async fn release_connection(&self, _connection: Box<dyn DatabaseConnection>) -> Result<()> {
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        self.metadata.reset();
        Ok(())
    }
}
