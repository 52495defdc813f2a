use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::header;

use crate::{ClientOptions, DataApiError, Result};

/// A `POST` request ready to hand to a [`Transport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A fully read response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends Data API requests.
///
/// Failures before a response arrives surface as
/// [`DataApiError::Transport`] carrying the implementation's own error.
/// Timeouts and cancellation belong to the implementation.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Transport: fmt::Debug + Send + Sync {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Default [`Transport`] backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(options: &ClientOptions) -> Self {
        Self::with_client(reqwest::Client::new(), options)
    }

    /// Uses a preconfigured `reqwest` client (proxies, TLS roots, pools).
    pub fn with_client(http: reqwest::Client, options: &ClientOptions) -> Self {
        Self {
            http,
            timeout: Duration::from_millis(options.timeout_ms),
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Transport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.http.post(&request.url).timeout(self.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder
            .header(header::ACCEPT, "application/json")
            .body(request.body)
            .send()
            .await
            .map_err(|err| DataApiError::Transport(Box::new(err)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| DataApiError::Transport(Box::new(err)))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            body,
        })
    }
}
