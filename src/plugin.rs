use crate::{
    classify::{classify, Route},
    ColumnMetadataStore, CompiledStatement, DataApiError, DeserializationConfig, QueryResult,
    ResultDeserializer, Result,
};

/// Post-processes results after a connection returns them.
pub trait ResultPlugin: Send + Sync {
    fn transform_result(
        &self,
        statement: &CompiledStatement,
        result: QueryResult,
    ) -> Result<QueryResult>;
}

/// Applies [`DeserializationConfig`] coercions to rows that reached the
/// caller without column metadata, looking the metadata up in the
/// [`ColumnMetadataStore`] the connection recorded it into.
///
/// Rows whose metadata was never recorded are an error
/// ([`DataApiError::MissingColumnMetadata`]) rather than being returned
/// uncoerced.
#[derive(Debug)]
pub struct DeserializerPlugin {
    metadata: ColumnMetadataStore,
    deserializer: ResultDeserializer,
}

impl DeserializerPlugin {
    /// Creates a plugin reading from `metadata` and switches recording on.
    pub fn attach(metadata: &ColumnMetadataStore, config: DeserializationConfig) -> Self {
        metadata.enable();
        Self {
            metadata: metadata.clone(),
            deserializer: ResultDeserializer::new(config),
        }
    }
}

impl ResultPlugin for DeserializerPlugin {
    fn transform_result(
        &self,
        statement: &CompiledStatement,
        result: QueryResult,
    ) -> Result<QueryResult> {
        let rows = match result {
            QueryResult::Rows(rows) if !rows.is_empty() => rows,
            other => return Ok(other),
        };

        if classify(statement) != Route::ResultSet {
            return Ok(QueryResult::Rows(rows));
        }

        let columns = self
            .metadata
            .read(&statement.sql)
            .filter(|columns| !columns.is_empty())
            .ok_or_else(|| DataApiError::MissingColumnMetadata {
                sql: statement.sql.clone(),
            })?;

        Ok(QueryResult::Rows(
            self.deserializer.deserialize_rows(&columns, rows)?,
        ))
    }
}
