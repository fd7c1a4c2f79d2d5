//! HTTP handlers for the doc-service API

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};

use docfill_core::{
    extract_placeholders, fill_document, filled_filename, parse_document, render_html,
    PlaceholderSummary, SchemaResponse,
};
use docfill_llm::synthesize_schema;

use crate::error::ApiError;
use crate::models::{HtmlResult, ParseResult, RenderRequest, RenderResult, SchemaRequest};
use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> Json<Value> {
    Json(json!({"ok": true, "service": "doc-service"}))
}

/// Pull the uploaded document out of a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("document").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Unable to read upload: {e}")))?;
            return Ok((filename, bytes.to_vec()));
        }
    }
    Err(ApiError::Validation("Missing file field".to_string()))
}

/// Extract the placeholder registry from an uploaded document
pub async fn parse(multipart: Multipart) -> Result<Json<ParseResult>, ApiError> {
    let (document_id, bytes) = read_upload(multipart).await?;

    let tree = parse_document(&bytes).map_err(|e| {
        tracing::error!("Unable to open DOCX for {}: {}", document_id, e);
        ApiError::InvalidDocument
    })?;

    let placeholders = extract_placeholders(&tree);
    tracing::info!(
        "Parsed {} placeholder types ({} total occurrences) from {}",
        placeholders.len(),
        placeholders.iter().map(|p| p.occurrences).sum::<u32>(),
        document_id
    );

    Ok(Json(ParseResult {
        document_id,
        placeholders,
    }))
}

/// Render an uploaded document as a highlighted HTML preview
pub async fn to_html(multipart: Multipart) -> Result<Json<HtmlResult>, ApiError> {
    let (document_id, bytes) = read_upload(multipart).await?;

    let tree = parse_document(&bytes).map_err(|e| {
        tracing::error!("Unable to render HTML for {}: {}", document_id, e);
        ApiError::InvalidDocument
    })?;

    let preview = render_html(&tree);
    tracing::info!(
        "Rendered HTML preview for {} with {} paragraphs and {} placeholders",
        document_id,
        preview.paragraphs,
        preview.placeholders
    );

    Ok(Json(HtmlResult { html: preview.html }))
}

/// Generate a form schema for the supplied placeholders
pub async fn schema(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SchemaRequest>,
) -> Result<Json<SchemaResponse>, ApiError> {
    let client = state.llm.as_ref().ok_or_else(|| {
        tracing::error!("AI_STUDIO_API_KEY not configured; cannot generate schema");
        ApiError::MissingApiKey
    })?;

    let placeholders: Vec<PlaceholderSummary> = request.into_summaries();

    let outcome = synthesize_schema(client.as_ref(), &placeholders).await;
    tracing::info!(
        source = outcome.source.as_str(),
        groups = outcome.schema.groups.len(),
        "schema response ready"
    );

    Ok(Json(outcome.schema))
}

/// Fill a document with answer values and return the result
pub async fn render(Json(request): Json<RenderRequest>) -> Result<Json<RenderResult>, ApiError> {
    let bytes = BASE64
        .decode(request.doc_bytes_b64.as_bytes())
        .map_err(|e| ApiError::Validation(format!("Invalid document base64: {e}")))?;

    let (filled, replaced_count) =
        fill_document(&bytes, &request.mapping).map_err(ApiError::from_render)?;
    let filled_filename = filled_filename(request.filename.as_deref());

    tracing::info!(replaced_count, filename = %filled_filename, "filled document");

    Ok(Json(RenderResult {
        filled_bytes_b64: BASE64.encode(&filled),
        filled_filename,
        replaced_count,
    }))
}

/// Smoke-test the AI Studio connection; gated behind ENABLE_DEV_ROUTES
pub async fn ai_studio_ping(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    if !state.config.enable_dev_routes {
        return Err(ApiError::NotFound);
    }
    let client = state.llm.as_ref().ok_or(ApiError::MissingApiKey)?;

    let raw = client
        .generate("Return JSON: {\"ok\": true}")
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;
    let raw: String = raw.chars().take(2000).collect();

    Ok(Json(json!({ "raw": raw })))
}
