//! Form schema synthesis backed by Google AI Studio
//!
//! `client` speaks the `generateContent` REST endpoint behind a small trait
//! so the orchestration in `synthesize` can be exercised without a network.
//! Schema synthesis never fails outright: when the model is unreachable or
//! returns something unusable, a deterministic one-field-per-placeholder
//! schema is produced instead.

pub mod client;
pub mod synthesize;

pub use client::{AiStudioClient, LlmClient, LlmError, DEFAULT_MODEL};
pub use synthesize::{synthesize_schema, SchemaOutcome, SchemaSource};
