use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_core::Stream;
use serde::Serialize;

use crate::error::LlmError;

/// Minimal HTTP request representation shared across providers.
///
/// Every request in this crate is a streaming JSON POST, so the shape stays
/// deliberately small: URL, headers, serialized body.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Builds a POST request with a JSON request body.
    ///
    /// Sets the `Content-Type` header to `application/json`; providers stamp
    /// their auth and protocol headers on top.
    ///
    /// # Examples
    ///
    /// ```
    /// use kaiwa_llm::http::HttpRequest;
    ///
    /// let request = HttpRequest::post_json("https://example.com", br"{}".to_vec());
    /// assert_eq!(request.headers.get("Content-Type"), Some(&"application/json".to_string()));
    /// ```
    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::from([("Content-Type".to_string(), "application/json".to_string())]),
            body,
        }
    }

    /// Replaces the request headers after construction.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }
}

/// HTTP response whose body is still a live stream.
pub struct HttpStreamResponse {
    pub status: u16,
    pub body: BodyStream,
}

/// Body byte stream handed from the transport to the SSE decoder.
///
/// Dropping the stream closes the underlying connection, releasing its pool
/// slot; this is the cancellation path for an in-flight response.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, LlmError>> + Send>>;

/// Transport abstraction decoupling providers from the concrete HTTP client.
///
/// # Examples
///
/// ```
/// # use async_trait::async_trait;
/// # use kaiwa_llm::http::{HttpTransport, HttpRequest, HttpStreamResponse};
/// # use kaiwa_llm::error::LlmError;
/// # use futures_util::stream;
/// struct EchoTransport;
///
/// #[async_trait]
/// impl HttpTransport for EchoTransport {
///     async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, LlmError> {
///         let body = stream::once(async move { Ok(request.body) });
///         Ok(HttpStreamResponse { status: 200, body: Box::pin(body) })
///     }
/// }
/// ```
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and resolves as soon as the response headers arrive,
    /// leaving the body as a live stream.
    ///
    /// # Errors
    ///
    /// Implementations map network failures to [`LlmError::Transport`]. A
    /// non-2xx status is not an error at this layer; callers inspect
    /// [`HttpStreamResponse::status`].
    async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, LlmError>;
}

/// Thread-safe handle to a transport implementation.
pub type DynHttpTransport = Arc<dyn HttpTransport>;

/// Serializes a body to JSON, attaches headers, and issues a streaming POST.
///
/// Centralizes JSON serialization so both providers share the same error
/// handling for unserializable payloads.
///
/// # Errors
///
/// Returns [`LlmError::Validation`] when serialization fails, otherwise
/// forwards the error raised by [`HttpTransport::send_stream`].
pub async fn post_json_stream<T: Serialize>(
    transport: &dyn HttpTransport,
    url: impl Into<String>,
    headers: HashMap<String, String>,
    body: &T,
) -> Result<HttpStreamResponse, LlmError> {
    let payload = serde_json::to_vec(body).map_err(|err| LlmError::Validation {
        message: format!("failed to serialize request: {err}"),
    })?;
    let request = HttpRequest::post_json(url, payload).with_headers(headers);
    transport.send_stream(request).await
}

pub mod reqwest;
