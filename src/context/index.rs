//! Knowledge Index
//!
//! Parses a flat knowledge-base document into entries and keeps one
//! term-frequency vector per entry for similarity search.
//!
//! ## Document format
//!
//! ```text
//! ## Delivery
//! We ship across the country within 3 days.
//! #delivery #shipping
//! ## Returns
//! Items can be returned within 14 days.
//! ```
//!
//! Blocks are separated by the literal `##`. Inside a block the first
//! non-blank line is the title, the remaining non-blank lines form the body,
//! and any `#tag` token (no embedded `#` or whitespace) becomes a tag.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

use super::vectorizer::{cosine, norm, vectorize, TermVector};

/// Block delimiter inside a knowledge-base document.
pub const BLOCK_DELIMITER: &str = "##";

/// Errors produced while building an index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// No block of the document produced an entry.
    #[error("no entries found in knowledge base (blocks are separated by '{BLOCK_DELIMITER}')")]
    Empty,
}

/// One knowledge-base item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: usize,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An entry paired with its similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub entry: Entry,
    pub score: f64,
}

fn tag_regex() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| Regex::new(r"#([^#\s]+)").expect("tag pattern is valid"))
}

/// Extract `#tag` values in order of appearance, duplicates included.
pub fn extract_tags(text: &str) -> Vec<String> {
    tag_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Immutable, fully built index over a knowledge-base document.
///
/// `entries`, `vectors` and `norms` are parallel: position `i` in each
/// describes the same block. A snapshot always holds at least one entry.
#[derive(Debug, Clone)]
pub struct KnowledgeIndex {
    entries: Vec<Entry>,
    vectors: Vec<TermVector>,
    norms: Vec<f64>,
}

impl KnowledgeIndex {
    /// Parse `text` and build the index.
    ///
    /// Ids come from a counter over every non-empty chunk between
    /// delimiters. A chunk that holds only whitespace consumes its id but
    /// produces no entry, so ids can have gaps.
    pub fn build(text: &str) -> Result<Self, BuildError> {
        let mut entries = Vec::new();
        let mut vectors = Vec::new();
        let mut norms = Vec::new();

        let chunks = text
            .split(BLOCK_DELIMITER)
            .filter(|chunk| !chunk.is_empty());

        for (id, chunk) in (1..).zip(chunks) {
            let block = chunk.trim();
            if block.is_empty() {
                continue;
            }

            let mut lines = block
                .split(['\n', '\r'])
                .map(str::trim)
                .filter(|line| !line.is_empty());

            let Some(title) = lines.next() else {
                continue;
            };
            let body = lines.collect::<Vec<_>>().join("\n");
            let tags = extract_tags(chunk);

            let vector = vectorize(block);
            norms.push(norm(&vector));
            vectors.push(vector);
            entries.push(Entry {
                id,
                title: title.to_string(),
                body,
                tags,
            });
        }

        if entries.is_empty() {
            return Err(BuildError::Empty);
        }

        Ok(Self {
            entries,
            vectors,
            norms,
        })
    }

    /// Rank entries against `question` and return at most `top_k` of them.
    ///
    /// Only entries with a strictly positive score are returned. Equal
    /// scores keep document order.
    pub fn query(&self, question: &str, top_k: usize) -> Vec<ScoredEntry> {
        let q_vec = vectorize(question);
        let q_norm = norm(&q_vec);

        let mut scored: Vec<ScoredEntry> = self
            .entries
            .iter()
            .zip(&self.vectors)
            .zip(&self.norms)
            .filter_map(|((entry, d_vec), &d_norm)| {
                let score = cosine(&q_vec, q_norm, d_vec, d_norm);
                (score > 0.0).then(|| ScoredEntry {
                    entry: entry.clone(),
                    score,
                })
            })
            .collect();

        // `sort_by` is stable, so ties stay in document order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        scored
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn vectors(&self) -> &[TermVector] {
        &self.vectors
    }

    pub fn norms(&self) -> &[f64] {
        &self.norms
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false` for a built index; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
