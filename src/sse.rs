//! Line framing and frame predicates for the two providers' SSE dialects.
//!
//! Both APIs push newline-delimited `field:payload` frames, but the framing is
//! inconsistent even within one provider: Anthropic occasionally emits bare
//! JSON error objects with no `field:` prefix. Decoding therefore happens in
//! two stages: [`LineStream`] turns the raw byte stream into whole lines, and
//! the provider clients apply the predicates below to each line.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::StreamExt;

use crate::error::LlmError;
use crate::http::BodyStream;

/// Splits a body byte stream into complete lines.
///
/// CR/LF terminators are stripped. A trailing partial line is flushed when the
/// connection closes, which is how Anthropic's unterminated final frames and
/// bare error objects still surface.
pub struct LineStream {
    body: BodyStream,
    buffer: Vec<u8>,
    pending: VecDeque<String>,
    provider: &'static str,
    stream_closed: bool,
}

impl LineStream {
    /// Wraps a raw HTTP body stream for line-by-line reading.
    pub fn new(body: BodyStream, provider: &'static str) -> Self {
        Self {
            body,
            buffer: Vec::new(),
            pending: VecDeque::new(),
            provider,
            stream_closed: false,
        }
    }

    fn push_line(&mut self, line: Vec<u8>) -> Result<(), LlmError> {
        let text = String::from_utf8(line).map_err(|err| {
            LlmError::decode(self.provider, format!("invalid UTF-8 in stream chunk: {err}"))
        })?;
        self.pending.push_back(text);
        Ok(())
    }

    fn drain_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
        buffer.iter().position(|b| *b == b'\n').map(|pos| {
            let mut line: Vec<u8> = buffer.drain(..=pos).collect();
            if line.last() == Some(&b'\n') {
                line.pop();
            }
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            line
        })
    }
}

impl Stream for LineStream {
    type Item = Result<String, LlmError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(line) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(line)));
            }

            if this.stream_closed {
                if !this.buffer.is_empty() {
                    let tail = this.buffer.drain(..).collect::<Vec<u8>>();
                    if let Err(err) = this.push_line(tail) {
                        return Poll::Ready(Some(Err(err)));
                    }
                    continue;
                }
                return Poll::Ready(None);
            }

            match this.body.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.buffer.extend_from_slice(&bytes);
                    while let Some(line) = Self::drain_line(&mut this.buffer) {
                        if let Err(err) = this.push_line(line) {
                            return Poll::Ready(Some(Err(err)));
                        }
                    }
                }
                Poll::Ready(Some(Err(err))) => return Poll::Ready(Some(Err(err))),
                Poll::Ready(None) => this.stream_closed = true,
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Splits an SSE line on the first colon into `(field, payload)`.
///
/// Payload JSON may itself contain colons, so only the first one counts.
/// Returns `None` for lines with no colon at all (blank/keepalive lines).
///
/// # Examples
///
/// ```
/// use kaiwa_llm::sse::split_frame;
///
/// let (field, payload) = split_frame("data: {\"a\":1}").unwrap();
/// assert_eq!(field, "data");
/// assert_eq!(payload, "{\"a\":1}");
/// assert!(split_frame("").is_none());
/// ```
pub fn split_frame(line: &str) -> Option<(&str, &str)> {
    let (field, payload) = line.split_once(':')?;
    Some((field, payload.strip_prefix(' ').unwrap_or(payload)))
}

/// Returns `true` when a `data` payload carries the OpenAI `[DONE]` sentinel.
///
/// The sentinel line is never valid JSON, so the scan must terminate before
/// any decode attempt.
pub fn is_done_payload(payload: &str) -> bool {
    payload.contains("[DONE]")
}

/// Returns `true` when a raw line looks like one of Anthropic's out-of-band
/// error frames, which are bare JSON objects outside the `field:payload`
/// convention.
pub fn looks_like_error_frame(line: &str) -> bool {
    line.contains("error")
}

/// Drains an entire body stream into a `String`, used to capture non-2xx
/// error bodies before reporting them.
pub async fn collect_body_text(
    mut body: BodyStream,
    provider: &'static str,
) -> Result<String, LlmError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = body.next().await {
        bytes.extend_from_slice(&chunk?);
    }
    String::from_utf8(bytes)
        .map_err(|err| LlmError::decode(provider, format!("invalid UTF-8 in error body: {err}")))
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    fn build_body(chunks: Vec<Result<Vec<u8>, LlmError>>) -> BodyStream {
        Box::pin(stream::iter(chunks))
    }

    async fn collect_lines(body: BodyStream) -> Vec<String> {
        let mut lines = LineStream::new(body, "test");
        let mut out = Vec::new();
        while let Some(line) = lines.next().await {
            out.push(line.expect("line"));
        }
        out
    }

    #[tokio::test]
    async fn yields_lines_across_chunk_boundaries() {
        let body = build_body(vec![
            Ok(b"data: par".to_vec()),
            Ok(b"tial\ndata: whole\n".to_vec()),
        ]);
        let lines = collect_lines(body).await;
        assert_eq!(lines, vec!["data: partial", "data: whole"]);
    }

    #[tokio::test]
    async fn strips_crlf_and_keeps_blank_keepalives() {
        let body = build_body(vec![Ok(b"event: ping\r\n\r\ndata: x\n".to_vec())]);
        let lines = collect_lines(body).await;
        assert_eq!(lines, vec!["event: ping", "", "data: x"]);
    }

    #[tokio::test]
    async fn flushes_unterminated_tail_on_close() {
        let body = build_body(vec![Ok(b"{\"type\":\"error\"}".to_vec())]);
        let lines = collect_lines(body).await;
        assert_eq!(lines, vec!["{\"type\":\"error\"}"]);
    }

    #[tokio::test]
    async fn reports_invalid_utf8_as_decode_error() {
        let body = build_body(vec![Ok(b"data: \xff\n".to_vec())]);
        let mut lines = LineStream::new(body, "test");
        let err = lines.next().await.expect("item").unwrap_err();
        match err {
            LlmError::Decode { provider, .. } => assert_eq!(provider, "test"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn split_frame_only_splits_on_first_colon() {
        let (field, payload) = split_frame(r#"data:{"url":"https://a:1"}"#).expect("frame");
        assert_eq!(field, "data");
        assert_eq!(payload, r#"{"url":"https://a:1"}"#);
    }

    #[test]
    fn split_frame_skips_lines_without_colon() {
        assert!(split_frame("").is_none());
        assert!(split_frame("keepalive").is_none());
    }

    #[test]
    fn done_sentinel_detection() {
        assert!(is_done_payload("[DONE]"));
        assert!(is_done_payload(" [DONE] "));
        assert!(!is_done_payload(r#"{"choices":[]}"#));
    }

    #[tokio::test]
    async fn collect_body_text_concatenates_chunks() {
        let body = build_body(vec![Ok(b"sta".to_vec()), Ok(b"tus".to_vec())]);
        let text = collect_body_text(body, "test").await.expect("text");
        assert_eq!(text, "status");
    }
}
