use serde::{Deserialize, Serialize};

use crate::{ColumnMetadata, Value};

/// Body shared by the `query/tuples` and `exec` endpoints.
#[derive(Debug, Serialize)]
pub struct RequestEnvelope<'a> {
    pub sql: &'a str,
    pub args: &'a [Value],
    pub database: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct QueryTuplesResponse {
    #[serde(default)]
    pub results: Vec<QueryTuplesResult>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct QueryTuplesResult {
    #[serde(default)]
    pub columns: Vec<ColumnMetadata>,
    /// Either arrays aligned with `columns` or objects keyed by column name.
    #[serde(default)]
    pub rows: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecResponse {
    pub last_insert_id: i64,
    pub rows_affected: u64,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: i64,
    pub message: String,
}

/// Error body of a non-success response; either `{error: {code, message}}`
/// or a bare `{code, message}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Wrapped { error: ApiError },
    Bare(ApiError),
}

impl ErrorBody {
    pub fn into_api_error(self) -> ApiError {
        match self {
            Self::Wrapped { error } => error,
            Self::Bare(error) => error,
        }
    }
}
