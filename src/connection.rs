use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::{
    classify::{classify, Route},
    deserialize::rows_from_wire,
    ColumnMetadataStore, CompiledStatement, DataApiCodec, DataApiError, QueryResult,
    ResultDeserializer, Result,
};

/// A logical connection handed out by a [`Driver`](crate::Driver).
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait DatabaseConnection: Send + Sync {
    async fn execute_query(&self, statement: &CompiledStatement) -> Result<QueryResult>;

    fn stream_query<'a>(
        &'a self,
        statement: &'a CompiledStatement,
        chunk_size: usize,
    ) -> Result<BoxStream<'a, Result<QueryResult>>>;
}

/// Connection over the stateless Data API. Holds no session: every query is
/// one independent HTTP request.
#[derive(Clone, Debug)]
pub struct DataApiConnection {
    codec: DataApiCodec,
    metadata: ColumnMetadataStore,
    deserializer: Option<ResultDeserializer>,
}

impl DataApiConnection {
    pub fn new(
        codec: DataApiCodec,
        metadata: ColumnMetadataStore,
        deserializer: Option<ResultDeserializer>,
    ) -> Self {
        Self {
            codec,
            metadata,
            deserializer,
        }
    }

    async fn execute_result_set(&self, statement: &CompiledStatement) -> Result<QueryResult> {
        let result = self.codec.query_tuples(statement).await?;
        self.metadata.write(&statement.sql, &result.columns);

        let rows = match &self.deserializer {
            Some(deserializer) => deserializer.deserialize_tuples(&result.columns, result.rows)?,
            None => rows_from_wire(&result.columns, result.rows)?,
        };
        Ok(QueryResult::Rows(rows))
    }

    async fn execute_mutation(&self, statement: &CompiledStatement) -> Result<QueryResult> {
        let result = self.codec.exec(statement).await?;
        Ok(QueryResult::Mutation {
            insert_id: result.last_insert_id,
            num_updated_or_deleted_rows: result.rows_affected,
        })
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl DatabaseConnection for DataApiConnection {
    async fn execute_query(&self, statement: &CompiledStatement) -> Result<QueryResult> {
        match classify(statement) {
            Route::ResultSet => self.execute_result_set(statement).await,
            Route::Mutation => self.execute_mutation(statement).await,
        }
    }

    fn stream_query<'a>(
        &'a self,
        _statement: &'a CompiledStatement,
        _chunk_size: usize,
    ) -> Result<BoxStream<'a, Result<QueryResult>>> {
        Err(DataApiError::StreamingNotSupported)
    }
}
