//! DOCX placeholder extraction, preview, and substitution
//!
//! This crate owns everything document-shaped: parsing DOCX containers into
//! a block tree, finding placeholder tokens (bracketed labels and underscore
//! blanks), rendering highlighted HTML previews, modelling form schemas, and
//! writing filled copies of the original container.
//!
//! All operations are pure functions over bytes; nothing here touches the
//! network or the filesystem.

pub mod docx;
pub mod error;
pub mod extract;
pub mod html;
pub mod matcher;
pub mod schema;
pub mod slug;
pub mod substitute;

#[cfg(test)]
pub(crate) mod fixtures;

pub use docx::{parse_document, Block, DocumentTree, Paragraph, Table, TableCell, TableRow};
pub use error::DocError;
pub use extract::{extract_placeholders, PlaceholderRecord};
pub use html::{render_html, HtmlPreview};
pub use schema::{
    fallback_schema, repair_targets, strip_code_fence, FieldType, PlaceholderSummary,
    SchemaField, SchemaGroup, SchemaResponse,
};
pub use substitute::{fill_document, filled_filename, MAX_DOCX_BYTES};
