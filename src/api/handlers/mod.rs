//! API route handlers
//!
//! - question answering (`/ask`)
//! - custom knowledge-base upload and reset
//! - health reporting

mod ask;
mod knowledge;
mod status;

pub use ask::*;
pub use knowledge::*;
pub use status::*;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::context::KnowledgeSlots;
use crate::llm::LlmRegistry;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Default and custom knowledge indexes
    pub slots: Arc<KnowledgeSlots>,
    /// Provider backends used to phrase the answer
    pub llm: Arc<LlmRegistry>,
    /// Effective configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(slots: Arc<KnowledgeSlots>, llm: LlmRegistry, config: AppConfig) -> Self {
        Self {
            slots,
            llm: Arc::new(llm),
            config: Arc::new(config),
        }
    }

    /// State with slots and LLM backends built from `config`.
    pub fn from_config(config: AppConfig) -> Result<Self, crate::llm::LlmError> {
        let slots = Arc::new(KnowledgeSlots::new(config.knowledge.default_path.clone()));
        let llm = LlmRegistry::from_config(&config.llm)?;
        Ok(Self::new(slots, llm, config))
    }
}
