//! System-wide default constants.
//!
//! Centralises the values used when no config file overrides them.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Server
// ============================================================================

/// HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8000";

/// Largest accepted request body, including knowledge-base uploads (bytes).
///
/// 5 MiB is far beyond any hand-written knowledge base.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

// ============================================================================
// Knowledge Base
// ============================================================================

/// Built-in knowledge-base document, relative to the working directory.
pub const KNOWLEDGE_BASE_PATH: &str = "knowledge_base.txt";

/// Number of entries forwarded to the LLM when the request does not say.
pub const TOP_K: usize = 3;

// ============================================================================
// LLM Providers
// ============================================================================

/// Timeout for a single provider round trip (seconds).
pub const LLM_TIMEOUT_SECS: u64 = 60;

/// Instruction sent ahead of every question.
pub const SYSTEM_PROMPT: &str = "Вы — профессиональный консультант по клиентским вопросам, \
знакомый с проектами нашей фирмы.\n\
Отвечайте точно, понятно и по существу. \
Не отвечайте на вопросы, не связанные с деятельностью компании.";

/// YandexGPT foundation-models completion endpoint.
pub const YANDEX_COMPLETION_URL: &str =
    "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";

/// Model path appended to `gpt://{folder_id}/`.
pub const YANDEX_MODEL: &str = "yandexgpt/latest";

pub const YANDEX_TEMPERATURE: f64 = 0.1;

pub const YANDEX_MAX_TOKENS: u32 = 800;

/// GigaChat OAuth token endpoint.
pub const GIGACHAT_AUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";

/// GigaChat chat-completions endpoint.
pub const GIGACHAT_API_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1/chat/completions";

pub const GIGACHAT_MODEL: &str = "GigaChat";

/// OAuth scope used when `GIGACHAT_SCOPE` is not set.
pub const GIGACHAT_SCOPE: &str = "GIGACHAT_API_PERS";
