//! Context-based keying for blank placeholders.
//!
//! Underscore runs and empty-label brackets have no text of their own, so a
//! stable key is inferred from the surrounding words: the text before the
//! blank usually introduces it ("Name: ____"), while the text after it
//! sometimes describes it ("____ shares of stock"). The keyer is stateful
//! only for the per-document blank counter, so extraction and HTML rendering
//! resolve identical keys when they walk the same document order.

use lazy_static::lazy_static;
use regex::Regex;

use crate::matcher::{title_case_key, to_snake_case};

/// Chars of context inspected on each side of a blank.
const CONTEXT_WINDOW: usize = 120;

/// Words that carry no semantic weight for keying.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "nor", "if", "then", "than", "so", "of", "in", "on",
    "at", "by", "for", "to", "with", "from", "as", "into", "onto", "upon", "under", "over",
    "between", "through", "per", "via", "is", "are", "was", "were", "be", "been", "being", "am",
    "do", "does", "did", "has", "have", "had", "shall", "will", "may", "might", "can", "could",
    "would", "should", "must", "this", "that", "these", "those", "it", "its", "their", "his",
    "her", "our", "your", "any", "all", "each", "such", "other", "same", "no", "not", "section",
    "see", "herein", "hereof", "hereby", "thereof", "pursuant",
];

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"[A-Za-z0-9]+").unwrap();
}

/// Punctuation that marks a blank as a trailing hole in a sentence, meaning
/// the words before it name the concept.
const TRAILING_PUNCT: &[char] = &['.', ',', ';', ':', ')', ']'];

pub struct ContextKeyer {
    blanks_seen: usize,
}

impl Default for ContextKeyer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextKeyer {
    pub fn new() -> Self {
        Self { blanks_seen: 0 }
    }

    /// Derive a (key, label) pair for a blank at `start..end` of `text`.
    pub fn key_for_blank(&mut self, text: &str, start: usize, end: usize) -> (String, String) {
        self.blanks_seen += 1;

        let before = tail_chars(&text[..start], CONTEXT_WINDOW);
        let after = head_chars(&text[end..], CONTEXT_WINDOW);

        let before_sig = significant_words(before);
        let after_sig = significant_words(after);

        let mut chosen: Vec<String> = Vec::new();
        if !before_sig.is_empty() || !after_sig.is_empty() {
            let colon_before = before.trim_end().ends_with(':');
            let punct_after = after
                .trim_start()
                .chars()
                .next()
                .is_some_and(|c| TRAILING_PUNCT.contains(&c));

            let (before_part, after_part) = if colon_before || punct_after {
                // The blank closes off a phrase; its introduction comes first.
                let cap = if colon_before { 1 } else { 2 };
                let before_part = last_n(&before_sig, cap);
                let after_part = first_n(&after_sig, 2usize.saturating_sub(before_part.len()));
                (before_part, after_part)
            } else {
                let after_part = first_n(&after_sig, 2);
                let before_part = last_n(&before_sig, 2usize.saturating_sub(after_part.len()));
                (before_part, after_part)
            };
            chosen = before_part;
            chosen.extend(after_part);
        }

        if chosen.is_empty() {
            // No significant words anywhere nearby; fall back to raw context,
            // then to a positional synthetic key.
            let raw_before = raw_words(before);
            if !raw_before.is_empty() {
                chosen = last_n(&raw_before, 3);
            } else if let Some(first) = raw_words(after).into_iter().next() {
                chosen = vec![first];
            }
        }

        let key = if chosen.is_empty() {
            format!("blank_{}", self.blanks_seen)
        } else {
            to_snake_case(&chosen.join(" "))
        };
        let label = title_case_key(&key);
        (key, label)
    }
}

fn significant_words(window: &str) -> Vec<String> {
    WORD_RE
        .find_iter(window)
        .map(|m| m.as_str().to_string())
        .filter(|word| {
            word.chars().any(|c| c.is_alphabetic())
                && !STOPWORDS.contains(&word.to_lowercase().as_str())
        })
        .collect()
}

fn raw_words(window: &str) -> Vec<String> {
    WORD_RE
        .find_iter(window)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn first_n(words: &[String], n: usize) -> Vec<String> {
    words.iter().take(n).cloned().collect()
}

fn last_n(words: &[String], n: usize) -> Vec<String> {
    words[words.len().saturating_sub(n)..].to_vec()
}

/// Last `n` chars of `s`, char-boundary safe.
pub(crate) fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

/// First `n` chars of `s`, char-boundary safe.
pub(crate) fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
