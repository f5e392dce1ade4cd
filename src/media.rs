//! Image plumbing around the wire model.
//!
//! Byte loading, resizing, and re-encoding live outside this crate; what
//! remains here is the loader contract and the two provider-shaped
//! constructors: inline base64 for Anthropic, bare URL for OpenAI.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::config::ProviderKind;
use crate::error::LlmError;
use crate::wire::Content;

/// Largest inline image payload the providers accept; loaders must downsize
/// anything bigger before returning.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Raw image bytes plus their detected MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// MIME type such as `image/png`.
    pub media_type: String,
    /// Raw (not yet base64-encoded) image bytes, at most [`MAX_IMAGE_BYTES`].
    pub bytes: Vec<u8>,
}

/// Collaborator contract for fetching image bytes from a file path or URL.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Loads the image behind `path_or_url`, downsizing payloads above
    /// [`MAX_IMAGE_BYTES`].
    async fn load(&self, path_or_url: &str) -> Result<ImageData, LlmError>;
}

/// Base64-encodes loaded bytes into the Anthropic inline-image layout.
pub fn inline_image_part(image: &ImageData) -> Content {
    Content::inline_image(image.media_type.clone(), STANDARD.encode(&image.bytes))
}

/// Builds the image content part a provider expects.
///
/// OpenAI resolves URLs server-side, so its variant never touches the loader;
/// Anthropic requires the caller to have fetched and encoded the bytes.
pub async fn image_content(
    provider: ProviderKind,
    path_or_url: &str,
    loader: &dyn ImageLoader,
) -> Result<Content, LlmError> {
    match provider {
        ProviderKind::OpenAi => Ok(Content::linked_image(path_or_url)),
        ProviderKind::Anthropic => {
            let image = loader.load(path_or_url).await?;
            Ok(inline_image_part(&image))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLoader;

    #[async_trait]
    impl ImageLoader for FixedLoader {
        async fn load(&self, _path_or_url: &str) -> Result<ImageData, LlmError> {
            Ok(ImageData {
                media_type: "image/png".to_string(),
                bytes: b"hello".to_vec(),
            })
        }
    }

    struct PanicLoader;

    #[async_trait]
    impl ImageLoader for PanicLoader {
        async fn load(&self, _path_or_url: &str) -> Result<ImageData, LlmError> {
            panic!("loader should not be called for URL-style providers");
        }
    }

    #[test]
    fn inline_part_base64_encodes_bytes() {
        let part = inline_image_part(&ImageData {
            media_type: "image/jpeg".to_string(),
            bytes: b"hello".to_vec(),
        });
        let value = serde_json::to_value(&part).expect("serialize");
        assert_eq!(value["source"]["data"], serde_json::json!("aGVsbG8="));
        assert_eq!(value["source"]["media_type"], serde_json::json!("image/jpeg"));
    }

    #[tokio::test]
    async fn openai_variant_is_a_bare_url_without_loading() {
        let part = image_content(ProviderKind::OpenAi, "https://example.com/cat.png", &PanicLoader)
            .await
            .expect("content");
        assert_eq!(part, Content::linked_image("https://example.com/cat.png"));
    }

    #[tokio::test]
    async fn anthropic_variant_loads_and_encodes() {
        let part = image_content(ProviderKind::Anthropic, "cat.png", &FixedLoader)
            .await
            .expect("content");
        assert_eq!(part.content_type(), "image");
        let value = serde_json::to_value(&part).expect("serialize");
        assert_eq!(value["source"]["type"], serde_json::json!("base64"));
    }
}
