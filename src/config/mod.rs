//! Application Configuration Module
//!
//! ## Loading Order
//!
//! 1. `RAGDESK_CONFIG` environment variable (path to TOML file)
//! 2. `ragdesk.toml` in the current working directory
//! 3. Built-in defaults ([`defaults`])
//!
//! `RAGDESK_SERVER_ADDR` and `RAGDESK_KB_PATH` are applied on top, then the
//! CLI flags. The resulting `AppConfig` is handed to the API state; nothing
//! reads configuration through globals.
//!
//! ```ignore
//! let mut config = AppConfig::load();
//! config.apply_env_overrides();
//! ```

mod app_config;
pub mod defaults;
pub mod validation;

pub use app_config::*;
