//! Placeholder extraction over the whole document.
//!
//! Walks every paragraph (including table cells at any depth), matches
//! placeholder tokens against the run-joined text, and aggregates them into
//! an order-preserving registry keyed by resolved key. Re-running extraction
//! on the same bytes yields an identical ordered list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::docx::DocumentTree;
use crate::matcher::{collapse_whitespace, find_tokens, TokenKind};
use crate::slug::{head_chars, tail_chars, ContextKeyer};

/// Chars of context captured on each side of an occurrence.
const SNIPPET_WINDOW: usize = 80;
/// Hard cap on an exposed context snippet.
const SNIPPET_MAX_CHARS: usize = 400;
/// Snippets kept per placeholder; only the first is exposed.
const SNIPPETS_KEPT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderRecord {
    pub key: String,
    pub label: String,
    pub occurrences: u32,
    /// Literal token variants seen in the source, insertion-ordered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_context: Option<String>,
}

struct Entry {
    label: String,
    occurrences: u32,
    tokens: Vec<String>,
    contexts: Vec<String>,
}

/// Extract the ordered placeholder registry from a parsed document.
pub fn extract_placeholders(tree: &DocumentTree) -> Vec<PlaceholderRecord> {
    let mut keyer = ContextKeyer::new();
    let mut order: Vec<String> = Vec::new();
    let mut entries: HashMap<String, Entry> = HashMap::new();

    for paragraph in tree.paragraphs() {
        if paragraph.runs.is_empty() {
            continue;
        }
        let text = paragraph.text();
        if text.is_empty() {
            continue;
        }

        for token in find_tokens(&text) {
            let (key, label) = match &token.kind {
                TokenKind::Labeled { key, label } => (key.clone(), label.clone()),
                TokenKind::Blank => keyer.key_for_blank(&text, token.start, token.end),
            };

            let entry = entries.entry(key.clone()).or_insert_with(|| {
                order.push(key.clone());
                Entry {
                    label,
                    occurrences: 0,
                    tokens: Vec::new(),
                    contexts: Vec::new(),
                }
            });
            entry.occurrences += 1;
            if !entry.tokens.contains(&token.token) {
                entry.tokens.push(token.token.clone());
            }
            if entry.contexts.len() < SNIPPETS_KEPT {
                entry
                    .contexts
                    .push(context_snippet(&text, token.start, token.end));
            }
        }
    }

    order
        .into_iter()
        .map(|key| {
            let entry = entries.remove(&key).expect("entry recorded for ordered key");
            PlaceholderRecord {
                key,
                label: entry.label,
                occurrences: entry.occurrences,
                tokens: entry.tokens,
                example_context: entry.contexts.into_iter().next(),
            }
        })
        .collect()
}

fn context_snippet(text: &str, start: usize, end: usize) -> String {
    let before = tail_chars(&text[..start], SNIPPET_WINDOW);
    let after = head_chars(&text[end..], SNIPPET_WINDOW);
    let snippet = collapse_whitespace(&format!("{}{}{}", before, &text[start..end], after));
    head_chars(snippet.trim(), SNIPPET_MAX_CHARS).to_string()
}
