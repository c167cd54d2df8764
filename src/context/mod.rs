//! Context module - knowledge base retrieval
//!
//! Everything the answer pipeline needs to pick relevant passages:
//!
//! - [`vectorizer`]: tokenization, term-frequency vectors, cosine scoring
//! - [`index`]: `##`-delimited document parsing into an immutable index
//! - [`lifecycle`]: the default and custom index slots shared by handlers

pub mod index;
pub mod lifecycle;
pub mod vectorizer;

pub use index::{BuildError, Entry, KnowledgeIndex, ScoredEntry};
pub use lifecycle::{DefaultState, KnowledgeError, KnowledgeSlots, SlotStatus};
pub use vectorizer::{cosine, norm, tokenize, vectorize, TermVector};
