//! Model catalog and client factory.
//!
//! The catalog is the single place that knows which provider backs which
//! logical model name. It is an explicit struct constructed once at startup
//! and passed to whoever needs provider selection; there is no process-wide
//! registry. Everything downstream operates on [`DynChatClient`] only.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::http::DynHttpTransport;
use crate::provider::DynChatClient;
use crate::provider::anthropic::AnthropicClient;
use crate::provider::openai::OpenAiClient;

/// Connection settings for one provider endpoint, immutable after client
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key stamped on every request.
    pub api_key: String,
    /// Endpoint override; `None` selects the provider's public default.
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Backend family a logical model name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
}

/// One catalog entry: which provider serves a logical name, and the
/// provider-specific model identifier sent on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub provider: ProviderKind,
    pub model_id: String,
}

/// Maps human-facing model names to provider clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCatalog {
    models: HashMap<String, ModelEntry>,
    pub anthropic: ProviderConfig,
    pub openai: ProviderConfig,
}

impl ClientCatalog {
    /// Creates a catalog with the stock model names (`haiku`, `sonnet`,
    /// `opus`, `gpt4`).
    pub fn new(anthropic: ProviderConfig, openai: ProviderConfig) -> Self {
        let models = HashMap::from([
            (
                "haiku".to_string(),
                ModelEntry {
                    provider: ProviderKind::Anthropic,
                    model_id: "claude-3-haiku-20240307".to_string(),
                },
            ),
            (
                "sonnet".to_string(),
                ModelEntry {
                    provider: ProviderKind::Anthropic,
                    model_id: "claude-3-sonnet-20240229".to_string(),
                },
            ),
            (
                "opus".to_string(),
                ModelEntry {
                    provider: ProviderKind::Anthropic,
                    model_id: "claude-3-opus-20240229".to_string(),
                },
            ),
            (
                "gpt4".to_string(),
                ModelEntry {
                    provider: ProviderKind::OpenAi,
                    model_id: "gpt-4-turbo".to_string(),
                },
            ),
        ]);
        Self {
            models,
            anthropic,
            openai,
        }
    }

    /// Registers or replaces a logical model name.
    pub fn with_model(mut self, name: impl Into<String>, entry: ModelEntry) -> Self {
        self.models.insert(name.into(), entry);
        self
    }

    /// Resolves a logical name to its catalog entry.
    pub fn resolve(&self, name: &str) -> Option<&ModelEntry> {
        self.models.get(name)
    }

    /// Returns the registered logical names.
    pub fn model_names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }
}

/// Builds the provider client backing a logical model name.
///
/// This is the only construction path for concrete clients; unknown names
/// fail fast with [`LlmError::InvalidConfig`] before any network activity.
pub fn build_client(
    catalog: &ClientCatalog,
    name: &str,
    transport: DynHttpTransport,
) -> Result<DynChatClient, LlmError> {
    let entry = catalog.resolve(name).ok_or_else(|| LlmError::InvalidConfig {
        field: "model".to_string(),
        reason: format!("unknown model name: {name}"),
    })?;

    let client: DynChatClient = match entry.provider {
        ProviderKind::Anthropic => {
            let mut client = AnthropicClient::new(
                transport,
                catalog.anthropic.api_key.clone(),
                entry.model_id.clone(),
            );
            if let Some(base_url) = &catalog.anthropic.base_url {
                client = client.with_base_url(base_url.clone());
            }
            Arc::new(client)
        }
        ProviderKind::OpenAi => {
            let mut client = OpenAiClient::new(
                transport,
                catalog.openai.api_key.clone(),
                entry.model_id.clone(),
            );
            if let Some(base_url) = &catalog.openai.base_url {
                client = client.with_base_url(base_url.clone());
            }
            Arc::new(client)
        }
    };

    Ok(client)
}
