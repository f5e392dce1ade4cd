use async_trait::async_trait;

use crate::error::LlmError;
use crate::provider::{DynChatClient, TextSink};
use crate::wire::{Message, Role};

/// Interactive input contract: "read one line" and nothing more.
///
/// Implemented by the embedding application (stdin, a socket, a test script).
#[async_trait]
pub trait LineSource: Send {
    /// Returns the next input line, or `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// A read failure ends the chat session, same as end of input.
    async fn next_line(&mut self) -> Result<Option<String>, LlmError>;
}

/// Owns the growing transcript and drives the request/response loop.
///
/// Turns are strictly sequential: each request carries the full transcript
/// including the prior turn's answer, so no turn may overlap another. The
/// transcript grows for the life of the session and is never persisted.
pub struct ChatSession {
    client: DynChatClient,
    system_prompt: String,
    history: Vec<Message>,
}

impl ChatSession {
    /// Creates a session with an empty transcript. The system prompt is used
    /// identically on every turn.
    pub fn new(client: DynChatClient, system_prompt: impl Into<String>) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
            history: Vec::new(),
        }
    }

    /// The transcript accumulated so far, in append order.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Runs one turn: append the prompt as a user message, send the full
    /// transcript, decode the streamed answer, append it as an assistant
    /// message.
    ///
    /// # Errors
    ///
    /// Any send or decode failure aborts the turn. The user message stays in
    /// the transcript; the partial answer already echoed to `sink` is not
    /// rolled back.
    pub async fn turn(
        &mut self,
        prompt: impl Into<String>,
        sink: &mut (dyn TextSink + Send),
    ) -> Result<String, LlmError> {
        self.history.push(Message::text(Role::User, prompt));

        let response = self
            .client
            .send_message(&self.history, &self.system_prompt)
            .await?;
        let answer = self.client.read_body(response.body, sink).await?;

        self.history
            .push(Message::text(Role::Assistant, answer.clone()));
        Ok(answer)
    }

    /// Runs the interactive loop until the input source ends.
    ///
    /// Exhausting the input source is the sole clean exit; there is no quit
    /// command. An error on any turn ends the session rather than skipping to
    /// the next line.
    pub async fn run(
        &mut self,
        input: &mut dyn LineSource,
        sink: &mut (dyn TextSink + Send),
    ) -> Result<(), LlmError> {
        tracing::info!(model = %self.client.model(), "beginning chat session");
        loop {
            let Some(line) = input.next_line().await? else {
                return Ok(());
            };
            self.turn(line, sink).await?;
        }
    }
}

/// [`LineSource`] over a fixed script of lines; test and batch helper.
pub struct ScriptedLines {
    lines: std::vec::IntoIter<String>,
}

impl ScriptedLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines
                .into_iter()
                .map(Into::into)
                .collect::<Vec<_>>()
                .into_iter(),
        }
    }
}

#[async_trait]
impl LineSource for ScriptedLines {
    async fn next_line(&mut self) -> Result<Option<String>, LlmError> {
        Ok(self.lines.next())
    }
}
