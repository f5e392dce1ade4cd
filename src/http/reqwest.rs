use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;

use crate::error::LlmError;

use super::{BodyStream, DynHttpTransport, HttpRequest, HttpStreamResponse, HttpTransport};

/// Idle connections kept per host so sequential chat turns reuse TLS sessions.
const MAX_IDLE_PER_HOST: usize = 10;
/// How long an idle pooled connection survives before being dropped.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);
/// Coarse per-request safety net; streaming answers can take a while.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Default [`HttpTransport`] backed by one pooled `reqwest::Client`.
///
/// Built once per process and shared across providers; the client's internal
/// pool synchronization is sufficient, no extra locking is layered on top.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Wraps a custom `reqwest::Client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates the default pooled configuration.
    pub fn default_client() -> Result<Self, LlmError> {
        Client::builder()
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .pool_idle_timeout(IDLE_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map(Self::new)
            .map_err(|err| LlmError::transport(format!("failed to create reqwest client: {err}")))
    }

    fn build_request(&self, mut request: HttpRequest) -> Result<reqwest::RequestBuilder, LlmError> {
        let mut builder = self.client.post(&request.url);

        for (name, value) in request.headers.drain() {
            let header_name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| LlmError::transport(format!("invalid header name: {err}")))?;
            let header_value = reqwest::header::HeaderValue::from_str(&value).map_err(|err| {
                LlmError::transport(format!("invalid header value for {header_name}: {err}"))
            })?;
            builder = builder.header(header_name, header_value);
        }

        Ok(builder.body(request.body))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, LlmError> {
        let response = self
            .build_request(request)?
            .send()
            .await
            .map_err(|err| LlmError::transport(err.to_string()))?;

        let status = response.status().as_u16();
        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|err| LlmError::transport(err.to_string()))
        });
        let body: BodyStream = Box::pin(stream);

        Ok(HttpStreamResponse { status, body })
    }
}

/// Convenience constructor for a thread-safe default transport.
pub fn default_dyn_transport() -> Result<DynHttpTransport, LlmError> {
    Ok(Arc::new(ReqwestTransport::default_client()?))
}
