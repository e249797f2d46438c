//! Lexical normalization shared by the rule chain and the calibrator.
//!
//! Everything here is a pure function of its input. Empty or
//! punctuation-only text produces empty word sets rather than errors.

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_MIN_TOKEN_LEN: usize = 3;

// ---------------------------------------------------------------------------
// Compiled patterns
// ---------------------------------------------------------------------------

static LABEL_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-dA-D]\)\s*").unwrap());

static ALPHA_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+").unwrap());

static TERM_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").unwrap());

// ---------------------------------------------------------------------------
// Stopwords
// ---------------------------------------------------------------------------

/// Function words plus the generic vocabulary of the question bank itself
/// ("system", "process", "following"), which carries no signal about which
/// option is right.
pub static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "is", "are", "of", "in", "to", "for", "and", "or", "which", "what",
        "following", "not", "does", "that", "this", "it", "by", "on", "from", "with", "be", "how",
        "do", "was", "has", "have", "can", "will", "one", "its", "used", "called", "type",
        "system", "operating", "os", "process", "when", "between", "if", "all", "none", "true",
        "false", "above", "mentioned", "these", "both",
    ]
    .into_iter()
    .collect()
});

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Remove a leading `a)`..`d)` option label and surrounding whitespace.
pub fn strip_label(text: &str) -> String {
    let trimmed = text.trim();
    LABEL_PREFIX_RE.replace(trimmed, "").trim().to_string()
}

/// Case-folded alphabetic words of any length, unfiltered.
pub fn words(text: &str) -> BTreeSet<String> {
    ALPHA_WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Comparable token set: alphabetic, case-folded, at least `min_len`
/// characters, stopwords removed.
pub fn tokens(text: &str, min_len: usize) -> BTreeSet<String> {
    ALPHA_WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.chars().count() >= min_len && !is_stopword(w))
        .collect()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Ordered case-folded alphanumeric words, the unit whole-word term
/// matching works on.
pub fn term_words(text: &str) -> Vec<String> {
    TERM_WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Whole-word match of a (possibly multi-word) term inside a word sequence.
pub fn contains_term(haystack: &[String], term: &[String]) -> bool {
    if term.is_empty() || term.len() > haystack.len() {
        return false;
    }
    haystack.windows(term.len()).any(|window| window == term)
}

/// Convenience form of [`contains_term`] over raw text.
pub fn text_contains_term(text: &str, term: &str) -> bool {
    contains_term(&term_words(text), &term_words(term))
}

fn is_trigger_word(word: &str, min_len: usize) -> bool {
    word.chars().count() >= min_len && !is_stopword(word)
}

/// Single-word trigger candidates for calibration. Split exactly as
/// [`term_words`] splits, so a mined trigger always matches at evaluation.
pub fn trigger_words(text: &str, min_len: usize) -> BTreeSet<String> {
    term_words(text)
        .into_iter()
        .filter(|w| is_trigger_word(w, min_len))
        .collect()
}

/// Adjacent pairs of [`trigger_words`]. These are the phrase candidates the
/// calibrator scores alongside single words.
pub fn phrases(text: &str, min_len: usize) -> BTreeSet<String> {
    term_words(text)
        .windows(2)
        .filter(|pair| is_trigger_word(&pair[0], min_len) && is_trigger_word(&pair[1], min_len))
        .map(|pair| format!("{} {}", pair[0], pair[1]))
        .collect()
}
