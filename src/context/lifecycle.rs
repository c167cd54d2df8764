//! Knowledge-base slots
//!
//! Holds the two process-wide indexes:
//!
//! - **default**: built from the configured document, either at startup
//!   (`warm_up`) or lazily on first use. A failed load is logged and retried
//!   on every later use until it succeeds; once loaded it is never rebuilt.
//! - **custom**: absent until a user uploads a document, replaced atomically
//!   on each successful upload and cleared by `reset_custom`.
//!
//! Both slots are `ArcSwapOption`s. A new index is fully built before it is
//! published, so readers see either the old or the new snapshot and never
//! take a lock to query.

use arc_swap::ArcSwapOption;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::index::{BuildError, KnowledgeIndex, ScoredEntry};

/// Errors surfaced by the knowledge slots.
#[derive(Debug, Clone, Error)]
pub enum KnowledgeError {
    /// The built-in document is missing, unreadable or has no entries.
    #[error("default knowledge base unavailable ({path}): {reason}")]
    DefaultLoad { path: PathBuf, reason: String },

    /// A query parameter was rejected before touching any index.
    #[error("invalid query parameter: {0}")]
    InvalidQueryParameter(String),

    /// An uploaded document could not be indexed.
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Lifecycle state of the default slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultState {
    Uninitialized,
    Loaded,
    LoadFailed,
}

/// Point-in-time view of both slots, for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SlotStatus {
    pub default_state: DefaultState,
    pub default_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_entries: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_entries: Option<usize>,
}

/// Owner of the default and custom knowledge indexes.
pub struct KnowledgeSlots {
    default_path: PathBuf,
    default: ArcSwapOption<KnowledgeIndex>,
    default_error: ArcSwapOption<String>,
    custom: ArcSwapOption<KnowledgeIndex>,
    /// Serializes default-load attempts so concurrent first queries read the
    /// file once.
    load_lock: Mutex<()>,
}

impl KnowledgeSlots {
    /// Create slots whose default index is read from `default_path`.
    ///
    /// Nothing is read until `warm_up` or the first query.
    pub fn new(default_path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: default_path.into(),
            default: ArcSwapOption::empty(),
            default_error: ArcSwapOption::empty(),
            custom: ArcSwapOption::empty(),
            load_lock: Mutex::new(()),
        }
    }

    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    /// Try to load the default index at startup.
    ///
    /// Failure is logged and swallowed; queries retry the load lazily.
    pub fn warm_up(&self) -> bool {
        match self.ensure_default() {
            Ok(index) => {
                info!(
                    path = %self.default_path.display(),
                    entries = index.len(),
                    "Default knowledge base loaded"
                );
                true
            }
            Err(e) => {
                warn!(error = %e, "Default knowledge base not loaded at startup, will retry on first query");
                false
            }
        }
    }

    /// Return the default index, loading it if it is not loaded yet.
    pub fn ensure_default(&self) -> Result<Arc<KnowledgeIndex>, KnowledgeError> {
        if let Some(index) = self.default.load_full() {
            return Ok(index);
        }

        let _guard = self.load_lock.lock().unwrap_or_else(|e| {
            warn!("Default-load mutex poisoned, recovering");
            e.into_inner()
        });

        // Another caller may have finished the load while we waited.
        if let Some(index) = self.default.load_full() {
            return Ok(index);
        }

        match self.read_default() {
            Ok(index) => {
                let index = Arc::new(index);
                self.default.store(Some(Arc::clone(&index)));
                self.default_error.store(None);
                debug!(entries = index.len(), "Default knowledge base published");
                Ok(index)
            }
            Err(e) => {
                error!(error = %e, "Failed to load default knowledge base");
                self.default_error.store(Some(Arc::new(e.to_string())));
                Err(e)
            }
        }
    }

    fn read_default(&self) -> Result<KnowledgeIndex, KnowledgeError> {
        let load_error = |reason: String| KnowledgeError::DefaultLoad {
            path: self.default_path.clone(),
            reason,
        };

        if !self.default_path.exists() {
            return Err(load_error("file not found".to_string()));
        }
        let text = std::fs::read_to_string(&self.default_path).map_err(|e| load_error(e.to_string()))?;
        KnowledgeIndex::build(&text).map_err(|e| load_error(e.to_string()))
    }

    /// Pick the index a query should run against.
    ///
    /// The default index must be loadable even when the custom one is
    /// requested; the custom index wins only if it is present.
    pub fn select(&self, use_custom: bool) -> Result<Arc<KnowledgeIndex>, KnowledgeError> {
        let default = self.ensure_default()?;
        if use_custom {
            if let Some(custom) = self.custom.load_full() {
                return Ok(custom);
            }
        }
        Ok(default)
    }

    /// Retrieve the `top_k` entries most similar to `question`.
    pub fn ask(
        &self,
        question: &str,
        top_k: usize,
        use_custom: bool,
    ) -> Result<Vec<ScoredEntry>, KnowledgeError> {
        if top_k == 0 {
            return Err(KnowledgeError::InvalidQueryParameter(
                "top_k must be > 0".to_string(),
            ));
        }

        let index = self.select(use_custom)?;
        let results = index.query(question, top_k);
        debug!(
            use_custom,
            top_k,
            matches = results.len(),
            "Knowledge query complete"
        );
        Ok(results)
    }

    /// Build an index from `text` and make it the custom index.
    ///
    /// Returns the number of entries. On failure the previous custom index,
    /// if any, stays in place.
    pub fn load_custom(&self, text: &str) -> Result<usize, KnowledgeError> {
        let index = KnowledgeIndex::build(text)?;
        let count = index.len();
        self.custom.store(Some(Arc::new(index)));
        info!(entries = count, "Custom knowledge base loaded");
        Ok(count)
    }

    /// Drop the custom index; queries fall back to the default one.
    pub fn reset_custom(&self) {
        if self.custom.swap(None).is_some() {
            info!("Custom knowledge base cleared");
        }
    }

    pub fn has_custom(&self) -> bool {
        self.custom.load().is_some()
    }

    pub fn status(&self) -> SlotStatus {
        let default = self.default.load_full();
        let default_error = self.default_error.load_full().map(|e| (*e).clone());
        let default_state = match (&default, &default_error) {
            (Some(_), _) => DefaultState::Loaded,
            (None, Some(_)) => DefaultState::LoadFailed,
            (None, None) => DefaultState::Uninitialized,
        };

        SlotStatus {
            default_state,
            default_path: self.default_path.clone(),
            default_entries: default.map(|i| i.len()),
            default_error,
            custom_entries: self.custom.load_full().map(|i| i.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DEFAULT_DOC: &str = "\
## Opening hours
The office is open from 9 to 18 on weekdays.
#hours
## Contacts
Call us or write an email.
#contacts
";

    const CUSTOM_DOC: &str = "\
## Warranty
The warranty period is two years.
## Office
Our office is in the city centre.
";

    fn default_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DEFAULT_DOC.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_lazy_default_load() {
        let file = default_file();
        let slots = KnowledgeSlots::new(file.path());
        assert_eq!(slots.status().default_state, DefaultState::Uninitialized);

        let results = slots.ask("when is the office open", 3, false).unwrap();
        assert_eq!(results[0].entry.title, "Opening hours");
        assert_eq!(slots.status().default_state, DefaultState::Loaded);
        assert_eq!(slots.status().default_entries, Some(2));
    }

    #[test]
    fn test_warm_up_missing_file_does_not_panic() {
        let slots = KnowledgeSlots::new("/definitely/not/here/knowledge_base.txt");
        assert!(!slots.warm_up());
        assert_eq!(slots.status().default_state, DefaultState::LoadFailed);

        let err = slots.ask("office", 3, false).unwrap_err();
        assert!(matches!(err, KnowledgeError::DefaultLoad { .. }));
    }

    #[test]
    fn test_default_load_retries_until_file_appears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.txt");
        let slots = KnowledgeSlots::new(&path);

        assert!(slots.select(false).is_err());
        assert_eq!(slots.status().default_state, DefaultState::LoadFailed);

        std::fs::write(&path, DEFAULT_DOC).unwrap();
        let index = slots.select(false).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(slots.status().default_state, DefaultState::Loaded);
        assert!(slots.status().default_error.is_none());
    }

    #[test]
    fn test_loaded_default_is_not_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.txt");
        std::fs::write(&path, DEFAULT_DOC).unwrap();
        let slots = KnowledgeSlots::new(&path);

        let first = slots.select(false).unwrap();
        std::fs::remove_file(&path).unwrap();
        let second = slots.select(false).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_empty_default_document_is_a_load_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"##\n##").unwrap();
        let slots = KnowledgeSlots::new(file.path());
        assert!(matches!(
            slots.select(false),
            Err(KnowledgeError::DefaultLoad { .. })
        ));
    }

    #[test]
    fn test_zero_top_k_rejected_before_index_access() {
        let slots = KnowledgeSlots::new("/missing/kb.txt");
        let err = slots.ask("anything", 0, false).unwrap_err();
        assert!(matches!(err, KnowledgeError::InvalidQueryParameter(_)));
        // The default slot was never touched.
        assert_eq!(slots.status().default_state, DefaultState::Uninitialized);
    }

    #[test]
    fn test_custom_requested_but_absent_uses_default() {
        let file = default_file();
        let slots = KnowledgeSlots::new(file.path());
        let with_flag = slots.ask("office open", 3, true).unwrap();
        let without = slots.ask("office open", 3, false).unwrap();
        assert_eq!(with_flag, without);
    }

    #[test]
    fn test_custom_load_and_select() {
        let file = default_file();
        let slots = KnowledgeSlots::new(file.path());

        assert_eq!(slots.load_custom(CUSTOM_DOC).unwrap(), 2);
        assert!(slots.has_custom());

        let custom = slots.ask("warranty period", 3, true).unwrap();
        assert_eq!(custom[0].entry.title, "Warranty");

        // Flag off still goes to the default index.
        let default = slots.ask("warranty period", 3, false).unwrap();
        assert!(default.is_empty());
    }

    #[test]
    fn test_failed_reload_keeps_previous_custom() {
        let file = default_file();
        let slots = KnowledgeSlots::new(file.path());

        slots.load_custom(CUSTOM_DOC).unwrap();
        let err = slots.load_custom("  ##  ##  ").unwrap_err();
        assert!(matches!(err, KnowledgeError::Build(BuildError::Empty)));

        let results = slots.ask("warranty", 3, true).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.title, "Warranty");
        assert_eq!(slots.status().custom_entries, Some(2));
    }

    #[test]
    fn test_reset_falls_back_to_default() {
        let file = default_file();
        let slots = KnowledgeSlots::new(file.path());

        slots.load_custom(CUSTOM_DOC).unwrap();
        slots.reset_custom();
        assert!(!slots.has_custom());

        let with_flag = slots.ask("office", 3, true).unwrap();
        let without = slots.ask("office", 3, false).unwrap();
        assert_eq!(with_flag, without);
        assert_eq!(with_flag[0].entry.title, "Opening hours");
    }

    #[test]
    fn test_custom_requires_loadable_default() {
        let slots = KnowledgeSlots::new("/missing/kb.txt");
        slots.load_custom(CUSTOM_DOC).unwrap();
        assert!(matches!(
            slots.ask("warranty", 3, true),
            Err(KnowledgeError::DefaultLoad { .. })
        ));
    }

    #[test]
    fn test_concurrent_readers_during_swaps() {
        let file = default_file();
        let slots = Arc::new(KnowledgeSlots::new(file.path()));
        slots.warm_up();

        let mut handles = Vec::new();
        for i in 0..4 {
            let slots = Arc::clone(&slots);
            handles.push(std::thread::spawn(move || {
                for _ in 0..200 {
                    if i % 2 == 0 {
                        slots.load_custom(CUSTOM_DOC).unwrap();
                        slots.reset_custom();
                    } else {
                        let index = slots.select(true).unwrap();
                        // Whichever snapshot we got, it is complete.
                        assert_eq!(index.len(), 2);
                        assert_eq!(index.entries().len(), index.norms().len());
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
    }
}
