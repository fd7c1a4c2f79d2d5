//! Request/response models for the doc-service API

use std::collections::BTreeMap;

use docfill_core::{PlaceholderRecord, PlaceholderSummary};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response from the parse endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub document_id: String,
    pub placeholders: Vec<PlaceholderRecord>,
}

/// Response from the HTML preview endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HtmlResult {
    pub html: String,
}

/// Request body for schema generation. Deliberately lenient: items may use
/// `key` instead of `name`, malformed fields fall back to defaults, and
/// non-object entries are skipped rather than failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaRequest {
    #[serde(default)]
    pub placeholders: Vec<Value>,
}

impl SchemaRequest {
    pub fn into_summaries(self) -> Vec<PlaceholderSummary> {
        self.placeholders
            .iter()
            .filter_map(summary_from_value)
            .collect()
    }
}

fn summary_from_value(value: &Value) -> Option<PlaceholderSummary> {
    let item = value.as_object()?;

    let name = item
        .get("name")
        .or_else(|| item.get("key"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or("UNKNOWN")
        .to_string();

    let occurrences = item
        .get("occurrences")
        .and_then(Value::as_u64)
        .map_or(1, |n| n.clamp(1, u64::from(u32::MAX)) as u32);

    let tokens = item
        .get("tokens")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(PlaceholderSummary {
        name,
        occurrences,
        label: item.get("label").and_then(Value::as_str).map(str::to_string),
        example_context: item
            .get("example_context")
            .and_then(Value::as_str)
            .map(str::to_string),
        tokens,
    })
}

/// Request to fill a document with answer values.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderRequest {
    pub doc_bytes_b64: String,
    #[serde(default)]
    pub mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Response carrying the filled document.
#[derive(Debug, Clone, Serialize)]
pub struct RenderResult {
    pub filled_bytes_b64: String,
    pub filled_filename: String,
    pub replaced_count: usize,
}
