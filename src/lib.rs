//! ragdesk: knowledge-base question answering
//!
//! Retrieval-augmented answers over a small `##`-delimited text knowledge base.
//!
//! ## Architecture
//!
//! - **Context**: tokenization, term-frequency vectors, the immutable
//!   `KnowledgeIndex` and the default/custom `KnowledgeSlots`
//! - **LLM**: YandexGPT and GigaChat clients behind the `LlmBackend` trait
//! - **API**: axum router with the web UI, `/ask`, `/upload_kb`, `/reset_kb`
//!   and `/health`
//! - **Config**: TOML configuration with env overrides

pub mod api;
pub mod config;
pub mod context;
pub mod llm;

// Re-export configuration
pub use config::AppConfig;

// Re-export retrieval types
pub use context::{
    BuildError, Entry, KnowledgeError, KnowledgeIndex, KnowledgeSlots, ScoredEntry,
};

// Re-export LLM components
pub use llm::{LlmBackend, LlmError, LlmRegistry, Provider};
