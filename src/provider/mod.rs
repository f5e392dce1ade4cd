use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::http::BodyStream;
use crate::wire::{Message, Response};

pub mod anthropic;
pub mod openai;

/// Capability contract implemented by each concrete provider client.
///
/// Callers select between implementations only through the factory in
/// [`crate::config`], never by inspecting the concrete type; adding a third
/// provider means implementing this trait plus one catalog entry.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Issues one streaming POST for the given transcript and returns as soon
    /// as the response headers arrive, leaving the body live.
    ///
    /// The transcript must be non-empty; the system prompt may be empty.
    ///
    /// # Errors
    ///
    /// [`LlmError::Transport`] when the request cannot be sent or no response
    /// is received. [`LlmError::Api`] when the provider answers with a
    /// non-2xx status; the error body is drained before reporting so the
    /// pooled connection is released.
    async fn send_message(
        &self,
        transcript: &[Message],
        system_prompt: &str,
    ) -> Result<Response, LlmError>;

    /// Consumes the body stream to its provider-specific terminator, echoing
    /// each decoded text delta to `sink` as it arrives, and returns the full
    /// concatenated answer.
    ///
    /// # Errors
    ///
    /// [`LlmError::Decode`] on malformed frames, [`LlmError::Api`] when the
    /// provider reports a structured failure mid-stream. Text already echoed
    /// before the failure is not rolled back.
    async fn read_body(
        &self,
        body: BodyStream,
        sink: &mut (dyn TextSink + Send),
    ) -> Result<String, LlmError>;

    /// Returns the provider-specific model identifier this client targets.
    fn model(&self) -> &str;
}

impl std::fmt::Debug for dyn ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("model", &self.model())
            .finish_non_exhaustive()
    }
}

/// Thread-safe handle to a provider client.
pub type DynChatClient = Arc<dyn ChatClient>;

/// Output sink receiving incremental answer text during decoding.
pub trait TextSink: Send {
    /// Called once per decoded text delta, in arrival order.
    fn write_delta(&mut self, delta: &str);

    /// Called when the answer is complete, for sinks that frame output.
    fn end_of_message(&mut self) {}
}

/// Echoes deltas to stdout immediately, the interactive default.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl TextSink for StdoutSink {
    fn write_delta(&mut self, delta: &str) {
        let mut stdout = std::io::stdout().lock();
        // Write failures to an interactive stdout are not recoverable here.
        let _ = stdout.write_all(delta.as_bytes());
        let _ = stdout.flush();
    }

    fn end_of_message(&mut self) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(b"\n");
        let _ = stdout.flush();
    }
}

/// Accumulates deltas in memory; used by tests and non-interactive callers.
#[derive(Debug, Default)]
pub struct BufferSink {
    text: String,
    messages_ended: usize,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of completed messages observed.
    pub fn messages_ended(&self) -> usize {
        self.messages_ended
    }
}

impl TextSink for BufferSink {
    fn write_delta(&mut self, delta: &str) {
        self.text.push_str(delta);
    }

    fn end_of_message(&mut self) {
        self.messages_ended += 1;
    }
}
