//! Schema synthesis orchestration.
//!
//! Builds the generation prompt from the placeholder registry, validates the
//! model output, and repairs its substitution targets. Unusable output drops
//! to the deterministic fallback schema rather than failing the request.

use docfill_core::schema::{fallback_schema, repair_targets, strip_code_fence};
use docfill_core::{PlaceholderSummary, SchemaResponse};
use tracing::{info, warn};

use crate::client::LlmClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSource {
    Generated,
    Fallback,
}

impl SchemaSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchemaOutcome {
    pub schema: SchemaResponse,
    pub source: SchemaSource,
}

/// Generate a form schema for the given placeholders, falling back to the
/// deterministic schema when the model output is unusable.
pub async fn synthesize_schema(
    client: &dyn LlmClient,
    placeholders: &[PlaceholderSummary],
) -> SchemaOutcome {
    if placeholders.is_empty() {
        return SchemaOutcome {
            schema: SchemaResponse::default(),
            source: SchemaSource::Fallback,
        };
    }

    let prompt = build_prompt(placeholders);
    info!(
        placeholders = placeholders.len(),
        "requesting form schema from AI Studio"
    );

    let raw = match client.generate(&prompt).await {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error = %err, "schema generation failed, using fallback schema");
            return fallback_outcome(placeholders);
        }
    };

    match parse_schema(&raw, placeholders) {
        Some(schema) => {
            info!(groups = schema.groups.len(), "received generated schema");
            SchemaOutcome {
                schema,
                source: SchemaSource::Generated,
            }
        }
        None => fallback_outcome(placeholders),
    }
}

fn fallback_outcome(placeholders: &[PlaceholderSummary]) -> SchemaOutcome {
    SchemaOutcome {
        schema: fallback_schema(placeholders),
        source: SchemaSource::Fallback,
    }
}

/// Validate raw model output into a usable schema, or None when it is not
/// valid JSON, does not match the schema shape, or carries no fields.
fn parse_schema(raw: &str, placeholders: &[PlaceholderSummary]) -> Option<SchemaResponse> {
    let stripped = strip_code_fence(raw);
    if stripped.is_empty() {
        warn!("model returned an empty schema body");
        return None;
    }

    let mut schema: SchemaResponse = match serde_json::from_str(&stripped) {
        Ok(schema) => schema,
        Err(err) => {
            let snippet: String = stripped.chars().take(500).collect();
            warn!(error = %err, snippet, "model returned non-schema content");
            return None;
        }
    };

    schema.groups.retain(|group| !group.fields.is_empty());
    if schema.groups.is_empty() {
        warn!("model schema contained no fields");
        return None;
    }

    repair_targets(&mut schema, placeholders);
    Some(schema)
}

fn build_prompt(placeholders: &[PlaceholderSummary]) -> String {
    let payload = serde_json::to_string_pretty(placeholders).unwrap_or_else(|_| "[]".to_string());
    format!(
        "You are generating a structured form schema to fill a legal document.\n\
         Inputs: placeholder tokens with names, occurrence counts, literal tokens, and optional context.\n\
         Requirements:\n\
         - Output ONLY valid JSON of this shape:\n\
         \x20 {{ \"groups\": [ {{ \"id\": str, \"title\": str, \"description\"?: str, \
         \"fields\": [ {{ \"key\": str, \"label\": str, \"type\": \
         \"text\"|\"email\"|\"phone\"|\"date\"|\"number\"|\"multiline\"|\"select\", \"required\": bool, \
         \"repeat_group\"?: str, \"help\"?: str, \"targets\": [str] }} ] }} ] }}\n\
         - Group logically (Company, Investor, Economics/Terms).\n\
         - If multiple placeholders refer to the same semantic field, emit ONE field and set repeat_group to a stable id \
         (e.g., \"company_name\") so the app can fan it out to all occurrences.\n\
         - targets must list the literal tokens the field replaces, copied from the placeholder's tokens.\n\
         - Use types: email for emails, date for dates, number for numerics, otherwise text. Long free-form -> multiline.\n\
         - Labels should be human friendly (e.g., \"Company Name\").\n\
         - Keep it minimal but complete.\n\
         \n\
         Placeholders:\n\
         {payload}\n"
    )
}
