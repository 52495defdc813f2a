use std::{fmt, sync::Arc};

use base64::{engine::general_purpose::STANDARD as base64_engine, Engine};
use serde::de::DeserializeOwned;

use crate::{
    classify::{has_multiple_statements, Route},
    wire::{ErrorBody, ExecResponse, QueryTuplesResponse, QueryTuplesResult, RequestEnvelope},
    CompiledStatement, DataApiConfig, DataApiError, HttpRequest, HttpResponse, Result, Transport,
};

const API_VERSION: &str = "v2";

/// Builds `Authorization: Basic ...` from a username and password.
pub fn basic_authorization(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        base64_engine.encode(format!("{username}:{password}"))
    )
}

/// Encodes statements into Data API requests and decodes the responses.
#[derive(Clone)]
pub struct DataApiCodec {
    base_url: String,
    database: String,
    authorization: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for DataApiCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataApiCodec")
            .field("base_url", &self.base_url)
            .field("database", &self.database)
            .field("authorization", &"<redacted>")
            .field("transport", &self.transport)
            .finish()
    }
}

impl DataApiCodec {
    pub fn new(config: &DataApiConfig) -> Self {
        Self {
            base_url: config.base_url(),
            database: config.settings.database.clone(),
            authorization: basic_authorization(
                &config.settings.username,
                &config.settings.password,
            ),
            transport: config.transport(),
        }
    }

    /// `{base}/api/v2/{resource}`
    pub fn url(&self, route: Route) -> String {
        format!("{}/api/{API_VERSION}/{}", self.base_url, route.resource())
    }

    /// Builds the request for `statement` without sending it.
    ///
    /// The Data API runs at most one statement per call, so SQL holding a
    /// second statement is rejected here, before any network traffic.
    pub fn build_request(&self, route: Route, statement: &CompiledStatement) -> Result<HttpRequest> {
        if has_multiple_statements(&statement.sql) {
            return Err(DataApiError::MultipleStatementsNotSupported);
        }

        let envelope = RequestEnvelope {
            sql: &statement.sql,
            args: statement.params.as_slice(),
            database: &self.database,
        };
        let body = serde_json::to_string(&envelope)
            .map_err(|err| DataApiError::Decode(format!("invalid request body: {err}")))?;

        Ok(HttpRequest {
            url: self.url(route),
            headers: vec![
                ("Authorization".to_owned(), self.authorization.clone()),
                ("Content-Type".to_owned(), "application/json".to_owned()),
            ],
            body,
        })
    }

    /// Runs a result-set statement and returns its first result.
    pub(crate) async fn query_tuples(&self, statement: &CompiledStatement) -> Result<QueryTuplesResult> {
        let response: QueryTuplesResponse = self.send(Route::ResultSet, statement).await?;

        // query/tuples may answer 200 with an embedded error.
        if let Some(error) = response.error {
            #[cfg(feature = "tracing")]
            tracing::warn!(code = error.code, message = %error.message, "data api query failed");

            return Err(DataApiError::Database {
                status: None,
                code: error.code,
                message: error.message,
            });
        }

        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| DataApiError::Decode("query/tuples response has no results".to_owned()))
    }

    /// Runs a mutation.
    pub(crate) async fn exec(&self, statement: &CompiledStatement) -> Result<ExecResponse> {
        self.send(Route::Mutation, statement).await
    }

    async fn send<T: DeserializeOwned>(&self, route: Route, statement: &CompiledStatement) -> Result<T> {
        let request = self.build_request(route, statement)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(resource = route.resource(), sql = %statement.sql, "sending data api request");

        let response = self.transport.post(request).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(status = response.status, "data api response");

        if !response.is_success() {
            return Err(api_error(response));
        }

        serde_json::from_str::<T>(&response.body).map_err(|err| {
            DataApiError::Decode(format!(
                "invalid {} response JSON: {err}; body: {}",
                route.resource(),
                response.body
            ))
        })
    }
}

/// Maps a non-success response to [`DataApiError::Database`], falling back
/// to the HTTP status when the body carries no structured error.
fn api_error(response: HttpResponse) -> DataApiError {
    let (code, message) = match serde_json::from_str::<ErrorBody>(&response.body) {
        Ok(body) => {
            let error = body.into_api_error();
            (error.code, error.message)
        }
        Err(_) => (i64::from(response.status), response.status_text),
    };

    #[cfg(feature = "tracing")]
    tracing::warn!(status = response.status, code, message = %message, "data api request failed");

    DataApiError::Database {
        status: Some(response.status),
        code,
        message,
    }
}
