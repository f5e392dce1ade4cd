//! Provider-agnostic streaming chat client for Anthropic- and OpenAI-style
//! SSE completion APIs.

pub mod chat;
pub mod config;
pub mod error;
pub mod http;
pub mod ingest;
pub mod media;
pub mod provider;
pub mod sse;
pub mod wire;

pub use chat::{ChatSession, LineSource};
pub use config::{ClientCatalog, ModelEntry, ProviderConfig, ProviderKind, build_client};
pub use error::LlmError;
pub use provider::{ChatClient, DynChatClient, TextSink};
pub use wire::{Content, Message, Response, Role};
