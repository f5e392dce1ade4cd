//! Pre-turn document ingestion.
//!
//! Source documents are extracted concurrently, one worker per document, with
//! results landing in input-order slots so the concatenated context block is
//! deterministic regardless of completion order. All workers finish before
//! any network call; the first failure aborts the whole ingest.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::future::try_join_all;

use crate::error::LlmError;

/// Collaborator contract for pulling plain text out of a source document
/// (PDF extraction and friends live outside this crate).
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extracts the full plain text of the document at `path`.
    async fn extract(&self, path: &Path) -> Result<String, LlmError>;
}

/// Extracts every document concurrently, preserving input order.
///
/// # Errors
///
/// The first extraction failure is returned and the remaining in-flight
/// extractions are dropped; no partial output escapes.
pub async fn ingest_documents(
    extractor: &dyn DocumentExtractor,
    paths: &[PathBuf],
) -> Result<Vec<String>, LlmError> {
    let workers = paths.iter().map(|path| async move {
        tracing::debug!(path = %path.display(), "ingesting document");
        extractor.extract(path).await
    });
    // try_join_all keeps results in input order and drops the remaining
    // futures on first error, cancelling outstanding work.
    try_join_all(workers).await
}

/// Wraps `text` in an XML-ish tag pair, the delimiter convention the models
/// are prompted with.
pub fn wrap_in_tags(text: &str, tag: &str) -> String {
    format!("<{tag}>{text}</{tag}>")
}

/// Builds the `<documents>` context block from extracted document texts.
/// Returns an empty string when there is nothing to inject.
pub fn build_context_block(docs: &[String]) -> String {
    if docs.is_empty() {
        return String::new();
    }
    let inner = docs
        .iter()
        .map(|doc| wrap_in_tags(doc, "document"))
        .collect::<Vec<_>>()
        .join("\n");
    wrap_in_tags(&inner, "documents")
}

/// Injects the document context block ahead of the caller's system prompt.
pub fn compose_system_prompt(context_block: &str, system_prompt: &str) -> String {
    match (context_block.is_empty(), system_prompt.is_empty()) {
        (true, _) => system_prompt.to_string(),
        (false, true) => context_block.to_string(),
        (false, false) => format!("{context_block}\n\n{system_prompt}"),
    }
}
