use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::http::{BodyStream, DynHttpTransport, post_json_stream};
use crate::provider::{ChatClient, TextSink};
use crate::sse::{LineStream, collect_body_text, looks_like_error_frame, split_frame};
use crate::wire::{Message, Response};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_VERSION: &str = "2023-06-01";
/// Fixed completion budget carried on every request.
const MAX_TOKENS: u32 = 2048;
const PROVIDER: &str = "anthropic";

/// Client for the Anthropic-style Messages API.
pub struct AnthropicClient {
    transport: DynHttpTransport,
    base_url: String,
    api_key: String,
    version: String,
    model: String,
}

impl AnthropicClient {
    /// Creates a client with the default base URL and API version.
    pub fn new(
        transport: DynHttpTransport,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            version: DEFAULT_VERSION.to_string(),
            model: model.into(),
        }
    }

    /// Overrides the base URL, for proxies or compatible gateways.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the `anthropic-version` header value.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/v1/messages")
    }

    fn build_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("x-api-key".to_string(), self.api_key.clone());
        headers.insert("anthropic-version".to_string(), self.version.clone());
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "text/event-stream".to_string());
        headers
    }
}

#[derive(Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
    stream: bool,
}

/// Discriminating probe decoded from every `data` payload before committing
/// to a fuller shape.
#[derive(Deserialize)]
struct SseData {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct ContentBlockDelta {
    delta: DeltaText,
}

#[derive(Deserialize)]
struct DeltaText {
    #[serde(default)]
    text: String,
}

/// Bare JSON error object the API emits outside the `field:payload` framing.
#[derive(Deserialize)]
struct ErrorFrame {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Maps a non-2xx response body onto [`LlmError::Api`].
fn parse_api_error(status: u16, body: &str) -> LlmError {
    if let Ok(frame) = serde_json::from_str::<ErrorFrame>(body) {
        return LlmError::api(PROVIDER, frame.error.kind, frame.error.message);
    }
    LlmError::api(
        PROVIDER,
        format!("http_{status}"),
        format!("status {status}: {body}"),
    )
}

#[async_trait]
impl ChatClient for AnthropicClient {
    async fn send_message(
        &self,
        transcript: &[Message],
        system_prompt: &str,
    ) -> Result<Response, LlmError> {
        if transcript.is_empty() {
            return Err(LlmError::Validation {
                message: "transcript must contain at least one message".to_string(),
            });
        }

        let body = MessagesBody {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: system_prompt,
            messages: transcript,
            stream: true,
        };

        tracing::debug!(model = %self.model, messages = transcript.len(), "sending messages request");
        let response =
            post_json_stream(&*self.transport, self.endpoint(), self.build_headers(), &body)
                .await?;

        if !(200..300).contains(&response.status) {
            let text = collect_body_text(response.body, PROVIDER).await?;
            return Err(parse_api_error(response.status, &text));
        }

        Ok(Response {
            status: response.status,
            body: response.body,
        })
    }

    async fn read_body(
        &self,
        body: BodyStream,
        sink: &mut (dyn TextSink + Send),
    ) -> Result<String, LlmError> {
        let mut lines = LineStream::new(body, PROVIDER);
        let mut text = String::new();

        while let Some(line) = lines.next().await {
            let line = line?;

            // Error frames arrive as bare JSON objects with no field prefix,
            // so they must be caught before the frame split.
            if looks_like_error_frame(&line) {
                let frame: ErrorFrame = serde_json::from_str(&line).map_err(|err| {
                    LlmError::decode(PROVIDER, format!("unparseable error frame: {err}"))
                })?;
                return Err(LlmError::api(PROVIDER, frame.error.kind, frame.error.message));
            }

            let Some((field, payload)) = split_frame(&line) else {
                continue;
            };
            if field != "data" {
                // `event` frames carry message start/stop structure we don't need.
                continue;
            }

            let probe: SseData = serde_json::from_str(payload).map_err(|err| {
                LlmError::decode(PROVIDER, format!("unparseable data frame: {err}"))
            })?;
            if probe.kind == "content_block_delta" {
                let delta: ContentBlockDelta = serde_json::from_str(payload).map_err(|err| {
                    LlmError::decode(PROVIDER, format!("unparseable content delta: {err}"))
                })?;
                sink.write_delta(&delta.delta.text);
                text.push_str(&delta.delta.text);
            }
        }

        sink.end_of_message();
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures_util::stream;

    use super::*;
    use crate::http::{HttpRequest, HttpStreamResponse, HttpTransport};
    use crate::provider::BufferSink;
    use crate::wire::Role;

    /// Transport that panics if any request is actually dispatched.
    struct PanicTransport;

    #[async_trait]
    impl HttpTransport for PanicTransport {
        async fn send_stream(&self, _request: HttpRequest) -> Result<HttpStreamResponse, LlmError> {
            panic!("send_stream should not be called");
        }
    }

    fn offline_client() -> AnthropicClient {
        AnthropicClient::new(Arc::new(PanicTransport), "test-key", "claude-3-haiku-20240307")
    }

    fn body_from(frames: &[&str]) -> BodyStream {
        let chunks: Vec<Result<Vec<u8>, LlmError>> =
            frames.iter().map(|f| Ok(f.as_bytes().to_vec())).collect();
        Box::pin(stream::iter(chunks))
    }

    #[test]
    fn endpoint_appends_v1_messages() {
        let client = offline_client().with_base_url("https://proxy.example/");
        assert_eq!(client.endpoint(), "https://proxy.example/v1/messages");
    }

    #[test]
    fn headers_carry_key_version_and_event_stream_accept() {
        let headers = offline_client().build_headers();
        assert_eq!(headers.get("x-api-key").map(String::as_str), Some("test-key"));
        assert_eq!(
            headers.get("anthropic-version").map(String::as_str),
            Some("2023-06-01")
        );
        assert_eq!(
            headers.get("Accept").map(String::as_str),
            Some("text/event-stream")
        );
    }

    #[test]
    fn request_body_pins_max_tokens_and_stream() {
        let transcript = vec![Message::text(Role::User, "Hello Claude")];
        let body = MessagesBody {
            model: "claude-3-haiku-20240307",
            max_tokens: MAX_TOKENS,
            system: "be terse",
            messages: &transcript,
            stream: true,
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["max_tokens"], serde_json::json!(2048));
        assert_eq!(value["system"], serde_json::json!("be terse"));
        assert_eq!(value["stream"], serde_json::json!(true));
        assert_eq!(value["messages"][0]["role"], serde_json::json!("user"));
    }

    #[tokio::test]
    async fn empty_transcript_is_rejected_before_any_network_call() {
        let err = offline_client()
            .send_message(&[], "")
            .await
            .expect_err("should fail");
        assert!(matches!(err, LlmError::Validation { .. }));
    }

    #[tokio::test]
    async fn decodes_content_deltas_and_ignores_structural_frames() {
        let body = body_from(&[
            "event: message_start\n",
            "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\"}}\n",
            "data:{\"type\":\"content_block_delta\",\"delta\":{\"text\":\"Hi\"}}\n",
            "data:{\"type\":\"message_stop\"}\n",
        ]);
        let mut sink = BufferSink::new();
        let text = offline_client()
            .read_body(body, &mut sink)
            .await
            .expect("decode");
        assert_eq!(text, "Hi");
        assert_eq!(sink.text(), "Hi");
        assert_eq!(sink.messages_ended(), 1);
    }

    #[tokio::test]
    async fn bare_error_frame_is_reported_without_frame_split() {
        let body = body_from(&[
            "{\"type\":\"error\",\"error\":{\"type\":\"invalid_request_error\",\"message\":\"x\"}}",
        ]);
        let mut sink = BufferSink::new();
        let err = offline_client()
            .read_body(body, &mut sink)
            .await
            .expect_err("should fail");
        match err {
            LlmError::Api { kind, message, .. } => {
                assert_eq!(kind, "invalid_request_error");
                assert_eq!(message, "x");
            }
            other => panic!("unexpected error type: {other:?}"),
        }
        assert_eq!(sink.text(), "");
    }

    #[tokio::test]
    async fn error_frame_stops_reading_further_lines() {
        let body = body_from(&[
            "{\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"busy\"}}\n",
            "data:{\"type\":\"content_block_delta\",\"delta\":{\"text\":\"late\"}}\n",
        ]);
        let mut sink = BufferSink::new();
        let err = offline_client()
            .read_body(body, &mut sink)
            .await
            .expect_err("should fail");
        assert!(matches!(err, LlmError::Api { .. }));
        assert_eq!(sink.text(), "", "no delta after the error frame may be echoed");
    }

    #[tokio::test]
    async fn malformed_data_payload_is_a_decode_error() {
        let body = body_from(&["data: {not json}\n"]);
        let mut sink = BufferSink::new();
        let err = offline_client()
            .read_body(body, &mut sink)
            .await
            .expect_err("should fail");
        assert!(matches!(err, LlmError::Decode { provider: "anthropic", .. }));
    }

    #[test]
    fn non_json_error_body_falls_back_to_status_text() {
        let err = parse_api_error(503, "upstream unavailable");
        match err {
            LlmError::Api { kind, message, .. } => {
                assert_eq!(kind, "http_503");
                assert!(message.contains("upstream unavailable"));
            }
            other => panic!("unexpected error type: {other:?}"),
        }
    }
}
