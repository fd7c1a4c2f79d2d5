//! Form schema model shared by the LLM orchestrator and the HTTP surface.
//!
//! `SchemaResponse` is constructed fresh per request, either from validated
//! LLM JSON or from the deterministic fallback builder; it is never
//! persisted.

use serde::{Deserialize, Serialize};

use crate::matcher::title_case_key;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Phone,
    Date,
    Number,
    Multiline,
    Select,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub key: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Literal tokens this field is responsible for replacing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaGroup {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaResponse {
    #[serde(default)]
    pub groups: Vec<SchemaGroup>,
}

fn default_true() -> bool {
    true
}

/// Placeholder summary accepted by the schema endpoint. Lenient on input:
/// callers may send `key` or `name`, and may omit everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderSummary {
    pub name: String,
    pub occurrences: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_context: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
}

impl PlaceholderSummary {
    /// Best literal token for this placeholder, synthesized from the label
    /// when the source recorded none.
    pub fn fallback_target(&self) -> String {
        self.tokens
            .first()
            .cloned()
            .unwrap_or_else(|| format!("[{}]", self.display_label()))
    }

    pub fn display_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| title_case_key(&self.name))
    }
}

/// Deterministic one-field-per-placeholder schema used when LLM generation
/// fails. An empty placeholder list yields an empty group list.
pub fn fallback_schema(placeholders: &[PlaceholderSummary]) -> SchemaResponse {
    if placeholders.is_empty() {
        return SchemaResponse::default();
    }

    let mut seen = std::collections::HashSet::new();
    let fields: Vec<SchemaField> = placeholders
        .iter()
        .filter(|p| !p.name.is_empty() && seen.insert(p.name.clone()))
        .map(|p| SchemaField {
            key: p.name.clone(),
            label: p.display_label(),
            field_type: FieldType::Text,
            required: true,
            repeat_group: None,
            help: None,
            targets: if p.tokens.is_empty() {
                vec![p.fallback_target()]
            } else {
                p.tokens.clone()
            },
        })
        .collect();

    if fields.is_empty() {
        return SchemaResponse::default();
    }

    SchemaResponse {
        groups: vec![SchemaGroup {
            id: "document_fields".to_string(),
            title: "Document Fields".to_string(),
            description: None,
            fields,
        }],
    }
}

/// Strip an optional markdown code fence (with or without a `json` info
/// string) from model output.
pub fn strip_code_fence(value: &str) -> String {
    let value = value.trim();
    let Some(rest) = value.strip_prefix("```") else {
        return value.to_string();
    };
    let body = rest.split("```").next().unwrap_or("");
    let body = body.strip_prefix("json").unwrap_or(body);
    body.trim().to_string()
}

/// Drop field targets that never appeared in the source document and refill
/// empty target lists, so every field stays actionable for substitution.
pub fn repair_targets(schema: &mut SchemaResponse, placeholders: &[PlaceholderSummary]) {
    let known: std::collections::HashSet<&str> = placeholders
        .iter()
        .flat_map(|p| p.tokens.iter().map(String::as_str))
        .collect();

    for group in &mut schema.groups {
        for field in &mut group.fields {
            field
                .targets
                .retain(|target| known.contains(target.as_str()));
            if field.targets.is_empty() {
                if let Some(source) = placeholders
                    .iter()
                    .find(|p| p.name == field.key && !p.tokens.is_empty())
                {
                    field.targets = source.tokens.clone();
                } else {
                    field.targets = vec![format!("[{}]", field.label)];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn summary(name: &str, tokens: &[&str]) -> PlaceholderSummary {
        PlaceholderSummary {
            name: name.to_string(),
            occurrences: 1,
            label: None,
            example_context: None,
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_field_type_round_trips_lowercase() {
        assert_eq!(serde_json::to_string(&FieldType::Multiline).unwrap(), "\"multiline\"");
        let parsed: FieldType = serde_json::from_str("\"email\"").unwrap();
        assert_eq!(parsed, FieldType::Email);
    }

    #[test]
    fn test_field_defaults_apply() {
        let field: SchemaField =
            serde_json::from_str(r#"{"key":"k","label":"L"}"#).unwrap();
        assert_eq!(field.field_type, FieldType::Text);
        assert!(field.required);
        assert!(field.targets.is_empty());
    }

    #[test]
    fn test_fallback_schema_single_group() {
        let placeholders = vec![
            summary("company_name", &["[Company Name]"]),
            summary("amount", &["____"]),
        ];
        let schema = fallback_schema(&placeholders);
        assert_eq!(schema.groups.len(), 1);
        let group = &schema.groups[0];
        assert_eq!(group.id, "document_fields");
        assert_eq!(group.title, "Document Fields");
        assert_eq!(group.fields.len(), 2);
        assert_eq!(group.fields[0].key, "company_name");
        assert_eq!(group.fields[0].targets, vec!["[Company Name]"]);
        assert_eq!(group.fields[1].targets, vec!["____"]);
    }

    #[test]
    fn test_fallback_schema_synthesizes_target_when_tokens_missing() {
        let schema = fallback_schema(&[summary("company_name", &[])]);
        assert_eq!(schema.groups[0].fields[0].targets, vec!["[Company Name]"]);
    }

    #[test]
    fn test_fallback_schema_dedupes_names() {
        let schema = fallback_schema(&[
            summary("date", &["[Date]"]),
            summary("date", &["[Date]"]),
        ]);
        assert_eq!(schema.groups[0].fields.len(), 1);
    }

    #[test]
    fn test_fallback_schema_empty_input_empty_groups() {
        assert!(fallback_schema(&[]).groups.is_empty());
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("{\"groups\":[]}"), "{\"groups\":[]}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  ```json\n{}\n```  "), "{}");
    }

    #[test]
    fn test_repair_targets_drops_unknown_and_refills() {
        let placeholders = vec![summary("company_name", &["[Company Name]"])];
        let mut schema = SchemaResponse {
            groups: vec![SchemaGroup {
                id: "g".into(),
                title: "G".into(),
                description: None,
                fields: vec![SchemaField {
                    key: "company_name".into(),
                    label: "Company Name".into(),
                    field_type: FieldType::Text,
                    required: true,
                    repeat_group: None,
                    help: None,
                    targets: vec!["[Never Seen]".into()],
                }],
            }],
        };
        repair_targets(&mut schema, &placeholders);
        assert_eq!(schema.groups[0].fields[0].targets, vec!["[Company Name]"]);
    }

    #[test]
    fn test_repair_targets_synthesizes_for_unknown_field() {
        let mut schema = SchemaResponse {
            groups: vec![SchemaGroup {
                id: "g".into(),
                title: "G".into(),
                description: None,
                fields: vec![SchemaField {
                    key: "invented".into(),
                    label: "Invented".into(),
                    field_type: FieldType::Text,
                    required: true,
                    repeat_group: None,
                    help: None,
                    targets: Vec::new(),
                }],
            }],
        };
        repair_targets(&mut schema, &[]);
        assert_eq!(schema.groups[0].fields[0].targets, vec!["[Invented]"]);
    }
}
