/// Boxed error raised by a [`Transport`](crate::Transport) before a response arrives.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum DataApiError {
    /// Failure reported by the Data API, either through a non-success HTTP
    /// status or through an `error` object embedded in a successful body.
    #[error("database error {code}: {message}")]
    Database {
        /// HTTP status of the response; `None` when the error was embedded
        /// in a `200 OK` body.
        status: Option<u16>,
        /// Engine or HTTP error code.
        code: i64,
        /// Error message text from upstream API.
        message: String,
    },
    #[error("SingleStore Data API does not support locks")]
    LocksNotSupported,
    #[error("SingleStore Data API does not support transactions")]
    TransactionsNotSupported,
    #[error("SingleStore Data API does not support streaming")]
    StreamingNotSupported,
    #[error("SingleStore Data API does not support multiple statements")]
    MultipleStatementsNotSupported,
    /// Rows reached the deserializer plugin but no column metadata was
    /// recorded for the statement that produced them.
    #[error("missing column metadata for query: {sql}")]
    MissingColumnMetadata { sql: String },
    /// Network or request execution error from the underlying transport.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),
    /// Response decoding, protocol-shape validation or value coercion error.
    #[error("decode error: {0}")]
    Decode(String),
    /// Missing or invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl DataApiError {
    /// Returns `true` for errors raised because the Data API lacks a
    /// capability, as opposed to a failed request.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::LocksNotSupported
                | Self::TransactionsNotSupported
                | Self::StreamingNotSupported
                | Self::MultipleStatementsNotSupported
        )
    }
}
