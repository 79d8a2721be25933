//! Text pipeline: tokenizer, trimmer, stop-word filter and stemmer.
//!
//! Indexing runs every stage; queries skip the stop-word filter so that a
//! query made only of stop words matches nothing instead of everything.
//!
//! Query terms are trimmed before stemming. lunr's own search pipeline only
//! stems them, so there `space.` would not find `space`; here it does.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::stemmer::stem;

/// Span of a token in the original field text, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub start: usize,
    pub len: usize,
}

/// A single token with its source span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub position: Position,
}

static LEADING_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\W+").unwrap());
static TRAILING_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+$").unwrap());

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "able", "about", "across", "after", "all", "almost", "also", "am", "among", "an",
        "and", "any", "are", "as", "at", "be", "because", "been", "but", "by", "can", "cannot",
        "could", "dear", "did", "do", "does", "either", "else", "ever", "every", "for", "from",
        "get", "got", "had", "has", "have", "he", "her", "hers", "him", "his", "how", "however",
        "i", "if", "in", "into", "is", "it", "its", "just", "least", "let", "like", "likely",
        "may", "me", "might", "most", "must", "my", "neither", "no", "nor", "not", "of", "off",
        "often", "on", "only", "or", "other", "our", "own", "rather", "said", "say", "says",
        "she", "should", "since", "so", "some", "than", "that", "the", "their", "them", "then",
        "there", "these", "they", "this", "tis", "to", "too", "twas", "us", "wants", "was", "we",
        "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
        "would", "yet", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Split text on whitespace and hyphens, lowercasing each piece
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() || ch == '-' {
            if let Some(begin) = start.take() {
                tokens.push(make_token(text, begin, idx));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(begin) = start {
        tokens.push(make_token(text, begin, text.len()));
    }

    tokens
}

fn make_token(text: &str, start: usize, end: usize) -> Token {
    Token {
        text: text[start..end].to_lowercase(),
        position: Position {
            start,
            len: end - start,
        },
    }
}

/// Strip leading and trailing non-word characters
pub fn trim(term: &str) -> String {
    let leading = LEADING_NON_WORD.replace(term, "");
    TRAILING_NON_WORD.replace(&leading, "").into_owned()
}

pub fn is_stop_word(term: &str) -> bool {
    STOP_WORDS.contains(term)
}

/// Index-time pipeline: tokenize, trim, drop stop words, stem
pub fn index_terms(text: &str) -> Vec<Token> {
    tokenize(text)
        .into_iter()
        .filter_map(|token| {
            let trimmed = trim(&token.text);
            if trimmed.is_empty() || is_stop_word(&trimmed) {
                return None;
            }
            Some(Token {
                text: stem(&trimmed),
                position: token.position,
            })
        })
        .collect()
}

/// Query-time pipeline for a single (already lowercased) term
pub fn query_term(term: &str) -> Option<String> {
    let trimmed = trim(term);
    if trimmed.is_empty() {
        None
    } else {
        Some(stem(&trimmed))
    }
}
