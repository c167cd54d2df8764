//! Term-frequency vectorizer
//!
//! Turns raw text into a sparse bag-of-words vector and scores vectors
//! against each other with cosine similarity.
//!
//! Tokens are maximal runs of Cyrillic letters (`а-я`, `А-Я`), Latin
//! letters, ASCII digits and underscore, taken after lowercasing. Everything
//! else (punctuation, whitespace, `#`) separates tokens.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Sparse term-frequency vector: lowercase token -> occurrence count.
pub type TermVector = HashMap<String, f64>;

fn word_regex() -> &'static Regex {
    static WORD_RE: OnceLock<Regex> = OnceLock::new();
    WORD_RE.get_or_init(|| Regex::new(r"[а-яА-Яa-zA-Z0-9_]+").expect("word pattern is valid"))
}

/// Split text into lowercase tokens, left to right.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    word_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Count token occurrences in `text`.
pub fn vectorize(text: &str) -> TermVector {
    let mut freq = TermVector::new();
    for token in tokenize(text) {
        *freq.entry(token).or_insert(0.0) += 1.0;
    }
    freq
}

/// Euclidean length of a vector.
///
/// An all-zero (or empty) vector has norm `1.0` so that callers can divide
/// by the result unconditionally.
pub fn norm(vector: &TermVector) -> f64 {
    let raw = vector.values().map(|v| v * v).sum::<f64>().sqrt();
    if raw == 0.0 {
        1.0
    } else {
        raw
    }
}

/// Cosine similarity between a query vector and a document vector.
///
/// The dot product only walks the query's terms: the query is the short
/// side, and terms present only in the document contribute nothing anyway.
/// Returns `0.0` whenever the dot product is exactly zero.
pub fn cosine(query: &TermVector, query_norm: f64, doc: &TermVector, doc_norm: f64) -> f64 {
    let dot: f64 = query
        .iter()
        .map(|(term, q)| q * doc.get(term).copied().unwrap_or(0.0))
        .sum();

    if dot == 0.0 {
        0.0
    } else {
        dot / (query_norm * doc_norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_mixed_scripts() {
        assert_eq!(tokenize("Hello, мир_42!"), vec!["hello", "мир_42"]);
    }

    #[test]
    fn test_tokenize_drops_separators() {
        let tokens = tokenize("  #tag, foo-bar; (baz)\n\tqux.  ");
        assert_eq!(tokens, vec!["tag", "foo", "bar", "baz", "qux"]);
        for t in &tokens {
            assert!(t.chars().all(|c| c.is_alphanumeric() || c == '_'));
        }
    }

    #[test]
    fn test_tokenize_lowercases_cyrillic() {
        assert_eq!(tokenize("ДОСТАВКА Москва"), vec!["доставка", "москва"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("?! ... ###").is_empty());
    }

    #[test]
    fn test_vectorize_counts() {
        let v = vectorize("a b a, A; c");
        assert_eq!(v.len(), 3);
        assert_eq!(v["a"], 3.0);
        assert_eq!(v["b"], 1.0);
        assert_eq!(v["c"], 1.0);
    }

    #[test]
    fn test_norm() {
        let v = vectorize("a a b b");
        assert!((norm(&v) - 8.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_norm_floor_for_empty_vector() {
        let empty = vectorize("");
        assert_eq!(norm(&empty), 1.0);
    }

    #[test]
    fn test_cosine_empty_query_is_zero() {
        let q = vectorize("");
        let d = vectorize("anything at all");
        assert_eq!(cosine(&q, norm(&q), &d, norm(&d)), 0.0);
    }

    #[test]
    fn test_cosine_identical_vectors() {
        let v = vectorize("delivery time and price");
        let n = norm(&v);
        assert!((cosine(&v, n, &v, n) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_ignores_document_only_terms_in_dot() {
        let q = vectorize("alpha");
        let d = vectorize("alpha beta gamma");
        let score = cosine(&q, norm(&q), &d, norm(&d));
        // dot = 1, |q| = 1, |d| = sqrt(3)
        assert!((score - 1.0 / 3.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_no_overlap() {
        let q = vectorize("alpha");
        let d = vectorize("beta");
        assert_eq!(cosine(&q, norm(&q), &d, norm(&d)), 0.0);
    }
}
