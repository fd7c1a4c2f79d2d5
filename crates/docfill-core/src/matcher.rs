//! Placeholder token matching over run-joined paragraph text.
//!
//! Two surface forms are recognized by one alternated pattern: bracketed
//! labels (`[Company Name]`) and runs of three or more underscores. A
//! bracketed match whose inner text snake-cases to a non-empty key is
//! *labeled*; everything else is *blank* and needs context-based keying.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref PLACEHOLDER_RE: Regex = Regex::new(r"\[([^\]]+)\]|(_{3,})").unwrap();
    static ref NON_WORD_RE: Regex = Regex::new(r"[^\w\s]").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Labeled { key: String, label: String },
    Blank,
}

/// One placeholder occurrence in a paragraph's joined text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    /// Byte offset of the match start in the joined text.
    pub start: usize,
    /// Byte offset one past the match end.
    pub end: usize,
    /// The literal token as it appears in the source.
    pub token: String,
    pub kind: TokenKind,
}

/// Find all placeholder tokens in order of appearance.
pub fn find_tokens(text: &str) -> Vec<TokenMatch> {
    PLACEHOLDER_RE
        .captures_iter(text)
        .map(|caps| {
            let full = caps.get(0).expect("match always has group 0");
            let kind = match caps.get(1) {
                Some(inner) => {
                    let label = collapse_whitespace(inner.as_str());
                    let key = to_snake_case(&label);
                    if key.is_empty() {
                        TokenKind::Blank
                    } else {
                        TokenKind::Labeled { key, label }
                    }
                }
                None => TokenKind::Blank,
            };
            TokenMatch {
                start: full.start(),
                end: full.end(),
                token: full.as_str().to_string(),
                kind,
            }
        })
        .collect()
}

/// Lowercased, underscore-joined form of a label. Punctuation is dropped,
/// word-internal underscores survive (`\w` covers them).
pub fn to_snake_case(value: &str) -> String {
    let cleaned = NON_WORD_RE.replace_all(value.trim(), " ");
    cleaned
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `company_name` -> `Company Name`.
pub fn title_case_key(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
