/// Configures the default HTTP transport.
///
/// Requests are never retried; retry and backoff policy belongs to the caller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}
