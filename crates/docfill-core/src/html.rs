//! HTML preview rendering with highlighted placeholders.
//!
//! Re-walks the block tree in the same order as extraction so blank
//! placeholders resolve to the same `data-key` values. Tables render as
//! nested `<table>` markup via the shared block-rendering routine.

use crate::docx::{Block, DocumentTree, Paragraph, Table};
use crate::matcher::{find_tokens, TokenKind};
use crate::slug::ContextKeyer;

const HTML_STYLES: &str = "<style>\n\
body { background: #1a1b1f; color: #f4f4f5; font-family: 'Inter', sans-serif; margin: 0; padding: 1.5rem; }\n\
.doc-body { max-width: 60rem; margin: 0 auto; }\n\
.placeholder { color: #9d76dd; background: rgba(157,118,221,0.1); border-radius: 4px; padding: 0 3px; }\n\
p { margin-bottom: 0.75rem; line-height: 1.6; }\n\
table { width: 100%; border-collapse: collapse; margin-bottom: 1.25rem; }\n\
td, th { border: 1px solid rgba(255,255,255,0.12); padding: 0.5rem; vertical-align: top; }\n\
.empty-line { min-height: 1rem; }\n\
</style>";

/// A rendered preview plus the counts the service logs.
#[derive(Debug, Clone)]
pub struct HtmlPreview {
    pub html: String,
    pub paragraphs: usize,
    pub placeholders: usize,
}

/// Render the full document as a self-contained HTML page.
pub fn render_html(tree: &DocumentTree) -> HtmlPreview {
    let mut keyer = ContextKeyer::new();
    let mut parts: Vec<String> = Vec::new();
    let (placeholders, paragraphs) = render_blocks(&tree.blocks, &mut parts, &mut keyer);

    let content = if parts.is_empty() {
        "<p>&nbsp;</p>".to_string()
    } else {
        parts.concat()
    };
    let html = format!(
        "<!DOCTYPE html><html><head>{HTML_STYLES}</head><body><div class=\"doc-body\">{content}</div></body></html>"
    );

    HtmlPreview {
        html,
        paragraphs,
        placeholders,
    }
}

fn render_blocks(
    blocks: &[Block],
    container: &mut Vec<String>,
    keyer: &mut ContextKeyer,
) -> (usize, usize) {
    let mut placeholder_total = 0;
    let mut paragraph_total = 0;

    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => {
                let (html, count) = render_paragraph(paragraph, keyer);
                container.push(html);
                paragraph_total += 1;
                placeholder_total += count;
            }
            Block::Table(table) => {
                let (html, placeholders, paragraphs) = render_table(table, keyer);
                container.push(html);
                placeholder_total += placeholders;
                paragraph_total += paragraphs;
            }
        }
    }

    (placeholder_total, paragraph_total)
}

fn render_paragraph(paragraph: &Paragraph, keyer: &mut ContextKeyer) -> (String, usize) {
    let text = paragraph.text();
    let (rendered, count) = highlight_placeholders(&text, keyer);
    let rendered = rendered.replace('\n', "<br />");
    if rendered.trim().is_empty() {
        ("<p class=\"empty-line\">&nbsp;</p>".to_string(), count)
    } else {
        (format!("<p>{rendered}</p>"), count)
    }
}

fn render_table(table: &Table, keyer: &mut ContextKeyer) -> (String, usize, usize) {
    let mut placeholder_total = 0;
    let mut paragraph_total = 0;
    let mut rows_html = String::new();

    for row in &table.rows {
        rows_html.push_str("<tr>");
        for cell in &row.cells {
            let mut cell_parts: Vec<String> = Vec::new();
            let (placeholders, paragraphs) = render_blocks(&cell.blocks, &mut cell_parts, keyer);
            placeholder_total += placeholders;
            paragraph_total += paragraphs;
            let joined = cell_parts.concat();
            let content = joined.trim();
            rows_html.push_str("<td>");
            rows_html.push_str(if content.is_empty() { "&nbsp;" } else { content });
            rows_html.push_str("</td>");
        }
        rows_html.push_str("</tr>");
    }

    (
        format!("<table class=\"doc-table\">{rows_html}</table>"),
        placeholder_total,
        paragraph_total,
    )
}

/// Escape text and wrap each placeholder occurrence in a keyed span.
fn highlight_placeholders(text: &str, keyer: &mut ContextKeyer) -> (String, usize) {
    if text.is_empty() {
        return (String::new(), 0);
    }

    let mut out = String::new();
    let mut last = 0;
    let mut count = 0;

    for token in find_tokens(text) {
        out.push_str(&escape_html(&text[last..token.start]));
        let key = match &token.kind {
            TokenKind::Labeled { key, .. } => key.clone(),
            TokenKind::Blank => keyer.key_for_blank(text, token.start, token.end).0,
        };
        count += 1;
        out.push_str(&format!(
            "<span class=\"placeholder\" data-key=\"{}\">{}</span>",
            escape_html(&key),
            escape_html(&token.token)
        ));
        last = token.end;
    }
    out.push_str(&escape_html(&text[last..]));

    (out, count)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
