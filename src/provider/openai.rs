use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::http::{BodyStream, DynHttpTransport, post_json_stream};
use crate::provider::{ChatClient, TextSink};
use crate::sse::{LineStream, collect_body_text, is_done_payload, split_frame};
use crate::wire::{Message, Response, Role};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const PROVIDER: &str = "openai";

/// Client for the OpenAI-style Chat Completions API.
pub struct OpenAiClient {
    transport: DynHttpTransport,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Creates a client with the default base URL.
    pub fn new(
        transport: DynHttpTransport,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Overrides the base URL, for proxies or compatible gateways.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/v1/chat/completions")
    }

    fn build_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key),
        );
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }
}

#[derive(Serialize)]
struct ChatCompletionsBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    delta: Delta,
}

#[derive(Deserialize)]
struct Delta {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default, rename = "type")]
    kind: String,
    message: String,
}

/// Maps a non-2xx response body onto [`LlmError::Api`].
fn parse_api_error(status: u16, body: &str) -> LlmError {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return LlmError::api(PROVIDER, parsed.error.kind, parsed.error.message);
    }
    LlmError::api(
        PROVIDER,
        format!("http_{status}"),
        format!("status {status}: {body}"),
    )
}

#[async_trait]
impl ChatClient for OpenAiClient {
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

        // This API has no dedicated system field. The system prompt rides
        // along as one more message APPENDED after the transcript; legacy
        // ordering, kept as observed. See DESIGN.md before changing.
        let mut messages = transcript.to_vec();
        if !system_prompt.is_empty() {
            messages.push(Message::text(Role::System, system_prompt));
        }

        let body = ChatCompletionsBody {
            model: &self.model,
            messages: &messages,
            stream: true,
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "sending chat completions request");
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
            let Some((_field, payload)) = split_frame(&line) else {
                continue;
            };

            // The sentinel line is not JSON; it must short-circuit the scan
            // before any decode attempt.
            if is_done_payload(payload) {
                break;
            }

            let chunk: StreamChunk = serde_json::from_str(payload).map_err(|err| {
                LlmError::decode(PROVIDER, format!("unparseable stream chunk: {err}"))
            })?;
            for choice in &chunk.choices {
                sink.write_delta(&choice.delta.content);
                text.push_str(&choice.delta.content);
            }
        }

        sink.end_of_message();
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
