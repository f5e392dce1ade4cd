use thiserror::Error;

/// Aggregates every failure mode exposed by the streaming chat client.
///
/// No layer in this crate retries; each error is returned to the immediate
/// caller, which terminates the current turn. The variants follow the
/// transport / decode / provider split so callers can tell "the network broke"
/// apart from "the provider said no" without string matching.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Connection, DNS, TLS, or timeout failures before or during a request.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// Malformed JSON or framing inside an SSE payload or response body.
    #[error("decode error from {provider}: {message}")]
    Decode {
        /// Provider identifier such as `anthropic`.
        provider: &'static str,
        message: String,
    },
    /// The provider reported a structured failure inside its own envelope,
    /// either as a non-2xx HTTP status or as an error-typed frame.
    #[error("api error from {provider} ({kind}): {message}")]
    Api {
        /// Provider identifier such as `openai`.
        provider: &'static str,
        /// Provider-assigned error type, e.g. `invalid_request_error`.
        kind: String,
        /// Human-readable message returned by the provider.
        message: String,
    },
    /// Raised when resolving configuration fails, before any network activity.
    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig {
        /// Name of the configuration field that failed resolution.
        field: String,
        /// Additional context explaining why the field is invalid.
        reason: String,
    },
    /// Signals validation failures in the request payload.
    #[error("invalid request: {message}")]
    Validation { message: String },
}

impl LlmError {
    /// Creates an [`LlmError::Transport`] from a textual description.
    ///
    /// # Examples
    ///
    /// ```
    /// use kaiwa_llm::error::LlmError;
    ///
    /// let err = LlmError::transport("dns lookup failed");
    /// assert!(matches!(err, LlmError::Transport { .. }));
    /// ```
    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an [`LlmError::Decode`] with the given provider name and message.
    pub fn decode<T: Into<String>>(provider: &'static str, message: T) -> Self {
        Self::Decode {
            provider,
            message: message.into(),
        }
    }

    /// Creates an [`LlmError::Api`] with the given provider name, error kind,
    /// and message.
    ///
    /// # Examples
    ///
    /// ```
    /// use kaiwa_llm::error::LlmError;
    ///
    /// let err = LlmError::api("openai", "rate_limit_error", "slow down");
    /// assert!(matches!(err, LlmError::Api { provider: "openai", .. }));
    /// ```
    pub fn api<K: Into<String>, T: Into<String>>(
        provider: &'static str,
        kind: K,
        message: T,
    ) -> Self {
        Self::Api {
            provider,
            kind: kind.into(),
            message: message.into(),
        }
    }
}
