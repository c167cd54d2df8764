//! Application configuration loaded from TOML
//!
//! Every section implements `Default` with the values from
//! [`super::defaults`], so a missing file or a partial file both work.
//! Provider credentials are never read from the file; they come from the
//! environment at request time (see `crate::llm`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::llm::Provider;

/// Environment variable pointing at a config file.
pub const CONFIG_ENV: &str = "RAGDESK_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "ragdesk.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `AppConfig::load()` which searches:
/// 1. `$RAGDESK_CONFIG` env var
/// 2. `./ragdesk.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Knowledge-base location and retrieval defaults
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {CONFIG_ENV}");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {CONFIG_ENV}, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV} points to non-existent file, falling back");
            }
        }

        // 2. Check ./ragdesk.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{LOCAL_CONFIG_FILE}");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No {LOCAL_CONFIG_FILE} found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        // Unknown keys only warn; typos should not stop the server.
        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `RAGDESK_SERVER_ADDR` and `RAGDESK_KB_PATH` on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("RAGDESK_SERVER_ADDR") {
            self.server.addr = addr;
        }
        if let Ok(path) = std::env::var("RAGDESK_KB_PATH") {
            self.knowledge.default_path = PathBuf::from(path);
        }
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check all values for consistency.
    ///
    /// Collects every problem instead of stopping at the first one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.server.addr.trim().is_empty() {
            errors.push("server.addr must not be empty".to_string());
        }
        if self.server.max_upload_bytes == 0 {
            errors.push("server.max_upload_bytes must be > 0".to_string());
        }
        if self.knowledge.default_path.as_os_str().is_empty() {
            errors.push("knowledge.default_path must not be empty".to_string());
        }
        if self.knowledge.default_top_k == 0 {
            errors.push("knowledge.default_top_k must be > 0".to_string());
        }
        if self.llm.timeout_secs == 0 {
            errors.push("llm.timeout_secs must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.llm.yandex.temperature) {
            errors.push(format!(
                "llm.yandex.temperature ({}) must be within 0.0..=1.0",
                self.llm.yandex.temperature
            ));
        }
        if self.llm.yandex.max_tokens == 0 {
            errors.push("llm.yandex.max_tokens must be > 0".to_string());
        }

        Self::check_url(&self.llm.yandex.endpoint, "llm.yandex.endpoint", &mut errors);
        Self::check_url(&self.llm.gigachat.auth_url, "llm.gigachat.auth_url", &mut errors);
        Self::check_url(&self.llm.gigachat.api_url, "llm.gigachat.api_url", &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_url(url: &str, name: &str, errors: &mut Vec<String>) {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("{name}: '{url}' is not an http(s) URL"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `RAGDESK_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,

    /// Request body limit in bytes (applies to uploads).
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

fn default_max_upload_bytes() -> usize {
    defaults::MAX_UPLOAD_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

// ============================================================================
// Knowledge Base
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Built-in document backing the default index.
    #[serde(default = "default_kb_path")]
    pub default_path: PathBuf,

    /// `top_k` used when a request omits it.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
}

fn default_kb_path() -> PathBuf {
    PathBuf::from(defaults::KNOWLEDGE_BASE_PATH)
}

fn default_top_k() -> usize {
    defaults::TOP_K
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            default_path: default_kb_path(),
            default_top_k: default_top_k(),
        }
    }
}

// ============================================================================
// LLM Providers
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider used when a request omits one.
    #[serde(default)]
    pub default_provider: Provider,

    /// Instruction prepended to every conversation.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub yandex: YandexConfig,

    #[serde(default)]
    pub gigachat: GigaChatConfig,
}

fn default_system_prompt() -> String {
    defaults::SYSTEM_PROMPT.to_string()
}

fn default_llm_timeout() -> u64 {
    defaults::LLM_TIMEOUT_SECS
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: Provider::default(),
            system_prompt: default_system_prompt(),
            timeout_secs: default_llm_timeout(),
            yandex: YandexConfig::default(),
            gigachat: GigaChatConfig::default(),
        }
    }
}

/// YandexGPT settings. Credentials: `YANDEX_API_KEY`, `YANDEX_FOLDER_ID`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexConfig {
    #[serde(default = "default_yandex_endpoint")]
    pub endpoint: String,

    /// Model path, combined into `gpt://{folder_id}/{model}`.
    #[serde(default = "default_yandex_model")]
    pub model: String,

    #[serde(default = "default_yandex_temperature")]
    pub temperature: f64,

    #[serde(default = "default_yandex_max_tokens")]
    pub max_tokens: u32,
}

fn default_yandex_endpoint() -> String {
    defaults::YANDEX_COMPLETION_URL.to_string()
}

fn default_yandex_model() -> String {
    defaults::YANDEX_MODEL.to_string()
}

fn default_yandex_temperature() -> f64 {
    defaults::YANDEX_TEMPERATURE
}

fn default_yandex_max_tokens() -> u32 {
    defaults::YANDEX_MAX_TOKENS
}

impl Default for YandexConfig {
    fn default() -> Self {
        Self {
            endpoint: default_yandex_endpoint(),
            model: default_yandex_model(),
            temperature: default_yandex_temperature(),
            max_tokens: default_yandex_max_tokens(),
        }
    }
}

/// GigaChat settings. Credentials: `GIGACHAT_AUTH_DATA`, optional `GIGACHAT_SCOPE`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GigaChatConfig {
    #[serde(default = "default_gigachat_auth_url")]
    pub auth_url: String,

    #[serde(default = "default_gigachat_api_url")]
    pub api_url: String,

    #[serde(default = "default_gigachat_model")]
    pub model: String,

    /// Scope used when `GIGACHAT_SCOPE` is unset.
    #[serde(default = "default_gigachat_scope")]
    pub scope: String,

    /// GigaChat serves a certificate chain most trust stores do not know.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

fn default_gigachat_auth_url() -> String {
    defaults::GIGACHAT_AUTH_URL.to_string()
}

fn default_gigachat_api_url() -> String {
    defaults::GIGACHAT_API_URL.to_string()
}

fn default_gigachat_model() -> String {
    defaults::GIGACHAT_MODEL.to_string()
}

fn default_gigachat_scope() -> String {
    defaults::GIGACHAT_SCOPE.to_string()
}

fn default_accept_invalid_certs() -> bool {
    true
}

impl Default for GigaChatConfig {
    fn default() -> Self {
        Self {
            auth_url: default_gigachat_auth_url(),
            api_url: default_gigachat_api_url(),
            model: default_gigachat_model(),
            scope: default_gigachat_scope(),
            accept_invalid_certs: default_accept_invalid_certs(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
