//! Shared wire types for multimodal chat requests and streaming responses.
//!
//! Everything that crosses the HTTP boundary is modeled here so the provider
//! clients can stay thin: the transcript [`Message`] list, the polymorphic
//! [`Content`] parts, and the transport-level [`Response`] envelope.

use serde::{Deserialize, Serialize};

use crate::http::BodyStream;

/// Chat role attached to a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One entry of a chat transcript, immutable once appended.
///
/// A message bundles a [`Role`] with an ordered, non-empty sequence of
/// [`Content`] parts so callers can mix text and images in a single request.
///
/// # Examples
///
/// ```
/// use kaiwa_llm::wire::{Content, Message, Role};
///
/// let msg = Message {
///     role: Role::User,
///     content: vec![
///         Content::text("Describe this image"),
///         Content::linked_image("https://example.com/img.png"),
///     ],
/// };
/// assert_eq!(msg.content.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<Content>,
}

impl Message {
    /// Builds a single-part text message, the common case for chat turns.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![Content::text(text)],
        }
    }
}

/// Polymorphic content part, tagged by the `type` discriminant both providers
/// use on the wire.
///
/// Each variant serializes to the exact field layout its target provider
/// expects; sending the wrong image variant to a provider is a caller error
/// the wire model cannot prevent generically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    /// Plain UTF-8 text, accepted by both providers.
    Text { text: String },
    /// OpenAI-style image reference; the provider fetches the URL server-side.
    ImageUrl { image_url: ImageUrlSource },
    /// Anthropic-style inline image; the caller must already have fetched and
    /// base64-encoded the bytes.
    #[serde(rename = "image")]
    ImageInline { source: InlineImageSource },
}

/// URL wrapper matching the OpenAI `image_url` object layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrlSource {
    pub url: String,
}

/// Base64 source matching the Anthropic `source` object layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineImageSource {
    /// Always `base64` for inline payloads.
    #[serde(rename = "type")]
    pub kind: String,
    /// MIME type of the encoded bytes, e.g. `image/png`.
    pub media_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

impl Content {
    /// Builds a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Builds an OpenAI-style URL image part.
    pub fn linked_image(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrlSource { url: url.into() },
        }
    }

    /// Builds an Anthropic-style inline image part from already-encoded data.
    pub fn inline_image(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::ImageInline {
            source: InlineImageSource {
                kind: "base64".to_string(),
                media_type: media_type.into(),
                data: data.into(),
            },
        }
    }

    /// Returns the wire discriminant for this part, the same string the serde
    /// tag produces. Used for provider-correct serialization checks and for
    /// tagged-union dispatch when parsing heterogeneous payloads.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::ImageUrl { .. } => "image_url",
            Self::ImageInline { .. } => "image",
        }
    }
}

/// Transport-level response envelope returned by `send_message`.
///
/// Ownership of the body stream transfers to the caller, who must fully drain
/// or drop it; a live stream left dangling holds a pooled connection slot.
pub struct Response {
    /// HTTP status reported with the response headers.
    pub status: u16,
    /// Live, not-yet-consumed body byte stream.
    pub body: BodyStream,
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
