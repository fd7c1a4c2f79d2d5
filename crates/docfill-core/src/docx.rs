//! DOCX container parsing
//!
//! DOCX files are ZIP archives; `word/document.xml` carries the body as a
//! flat sequence of paragraphs (`w:p`) and tables (`w:tbl`), where tables
//! nest further blocks through their cells. The maintained docx crates are
//! writer-only, so the container is walked manually with zip + quick-xml.
//!
//! Parsing is read-only and produces an explicit block tree; substitution
//! runs as a separate pass over the raw part XML (see `substitute`).

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::DocError;

/// A paragraph's formatting runs, in source order. A single logical word may
/// be split across several runs; callers match against the concatenation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<String>,
}

impl Paragraph {
    /// Visible text of the paragraph (all runs joined).
    pub fn text(&self) -> String {
        self.runs.concat()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

/// A block-level element in physical top-to-bottom order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// The parsed body of a document (or, recursively, of a table cell).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTree {
    pub blocks: Vec<Block>,
}

impl DocumentTree {
    /// All paragraphs in document order, including those nested inside
    /// tables at any depth.
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        fn walk<'a>(blocks: &'a [Block], out: &mut Vec<&'a Paragraph>) {
            for block in blocks {
                match block {
                    Block::Paragraph(p) => out.push(p),
                    Block::Table(table) => {
                        for row in &table.rows {
                            for cell in &row.cells {
                                walk(&cell.blocks, out);
                            }
                        }
                    }
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.blocks, &mut out);
        out
    }
}

/// Parse DOCX bytes into a block tree.
pub fn parse_document(bytes: &[u8]) -> Result<DocumentTree, DocError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|_| DocError::InvalidDocument)?;
    let xml = read_part(&mut archive, "word/document.xml")?;
    parse_body_xml(&xml)
}

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<String, DocError> {
    let mut file = archive.by_name(name).map_err(|_| DocError::InvalidDocument)?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|_| DocError::InvalidDocument)?;
    Ok(xml)
}

/// Stream `word/document.xml` into blocks. Block lists nest through table
/// cells, so each open cell (and the body itself) gets its own stack frame.
fn parse_body_xml(xml: &str) -> Result<DocumentTree, DocError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut block_stack: Vec<Vec<Block>> = vec![Vec::new()];
    let mut table_stack: Vec<Vec<TableRow>> = Vec::new();
    let mut row_stack: Vec<Vec<TableCell>> = Vec::new();
    let mut paragraph: Option<Paragraph> = None;
    let mut run: Option<String> = None;
    let mut in_text = false;
    // Anchored drawings and legacy pict shapes carry their own text bodies;
    // they are not part of the block flow.
    let mut skip_depth: usize = 0;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let name = name.as_ref();
                if skip_depth > 0 || matches!(name, b"w:drawing" | b"w:pict") {
                    skip_depth += 1;
                } else {
                    match name {
                        b"w:p" => paragraph = Some(Paragraph::default()),
                        b"w:r" => run = Some(String::new()),
                        b"w:t" => in_text = run.is_some(),
                        b"w:tbl" => table_stack.push(Vec::new()),
                        b"w:tr" => row_stack.push(Vec::new()),
                        b"w:tc" => block_stack.push(Vec::new()),
                        _ => {}
                    }
                }
            }
            Ok(Event::Empty(e)) if skip_depth == 0 => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(frame) = block_stack.last_mut() {
                        frame.push(Block::Paragraph(Paragraph::default()));
                    }
                }
                b"w:br" | b"w:cr" => {
                    if let Some(r) = run.as_mut() {
                        r.push('\n');
                    }
                }
                b"w:tab" => {
                    if let Some(r) = run.as_mut() {
                        r.push('\t');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text && skip_depth == 0 {
                    let text = e.unescape().map_err(|_| DocError::InvalidDocument)?;
                    if let Some(r) = run.as_mut() {
                        r.push_str(&text);
                    }
                }
            }
            Ok(Event::End(e)) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                    continue;
                }
                match e.name().as_ref() {
                    b"w:t" => in_text = false,
                    b"w:r" => {
                        if let (Some(p), Some(r)) = (paragraph.as_mut(), run.take()) {
                            p.runs.push(r);
                        }
                    }
                    b"w:p" => {
                        if let (Some(frame), Some(p)) =
                            (block_stack.last_mut(), paragraph.take())
                        {
                            frame.push(Block::Paragraph(p));
                        }
                    }
                    b"w:tc" => {
                        let blocks = block_stack.pop().unwrap_or_default();
                        if let Some(row) = row_stack.last_mut() {
                            row.push(TableCell { blocks });
                        }
                    }
                    b"w:tr" => {
                        let cells = row_stack.pop().unwrap_or_default();
                        if let Some(table) = table_stack.last_mut() {
                            table.push(TableRow { cells });
                        }
                    }
                    b"w:tbl" => {
                        let rows = table_stack.pop().unwrap_or_default();
                        if let Some(frame) = block_stack.last_mut() {
                            frame.push(Block::Table(Table { rows }));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => return Err(DocError::InvalidDocument),
            _ => {}
        }
        buf.clear();
    }

    Ok(DocumentTree {
        blocks: block_stack.pop().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{docx_bytes, paragraph};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_rejects_non_zip_bytes() {
        let result = parse_document(b"definitely not a zip archive");
        assert!(matches!(result, Err(DocError::InvalidDocument)));
    }

    #[test]
    fn test_parse_rejects_zip_without_document_part() {
        let bytes = {
            use std::io::Write;
            use zip::write::{SimpleFileOptions, ZipWriter};
            let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
            zip.start_file("hello.txt", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"hi").unwrap();
            zip.finish().unwrap().into_inner()
        };
        let result = parse_document(&bytes);
        assert!(matches!(result, Err(DocError::InvalidDocument)));
    }

    #[test]
    fn test_paragraphs_in_document_order() {
        let body = format!("{}{}", paragraph("First"), paragraph("Second"));
        let tree = parse_document(&docx_bytes(&body)).unwrap();
        let texts: Vec<String> = tree.paragraphs().iter().map(|p| p.text()).collect();
        assert_eq!(texts, vec!["First".to_string(), "Second".to_string()]);
    }

    #[test]
    fn test_split_runs_join_into_one_paragraph() {
        let body = "<w:p><w:r><w:t>[Com</w:t></w:r><w:r><w:t>pany Name]</w:t></w:r></w:p>";
        let tree = parse_document(&docx_bytes(body)).unwrap();
        let paragraphs = tree.paragraphs();
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].runs.len(), 2);
        assert_eq!(paragraphs[0].text(), "[Company Name]");
    }

    #[test]
    fn test_nested_table_paragraphs_are_flattened() {
        let inner_table = format!(
            "<w:tbl><w:tr><w:tc>{}</w:tc></w:tr></w:tbl>",
            paragraph("Inner")
        );
        let outer_table = format!(
            "<w:tbl><w:tr><w:tc>{}{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>",
            paragraph("CellA"),
            inner_table,
            paragraph("CellB")
        );
        let body = format!("{}{}", paragraph("Intro"), outer_table);
        let tree = parse_document(&docx_bytes(&body)).unwrap();

        let texts: Vec<String> = tree.paragraphs().iter().map(|p| p.text()).collect();
        assert_eq!(texts, vec!["Intro", "CellA", "Inner", "CellB"]);

        assert_eq!(tree.blocks.len(), 2);
        match &tree.blocks[1] {
            Block::Table(table) => {
                assert_eq!(table.rows.len(), 1);
                assert_eq!(table.rows[0].cells.len(), 2);
                // First cell holds a paragraph followed by the nested table.
                assert_eq!(table.rows[0].cells[0].blocks.len(), 2);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_breaks_and_tabs_become_whitespace() {
        let body = "<w:p><w:r><w:t>line one</w:t><w:br/><w:t>line two</w:t></w:r></w:p>";
        let tree = parse_document(&docx_bytes(body)).unwrap();
        assert_eq!(tree.paragraphs()[0].text(), "line one\nline two");
    }

    #[test]
    fn test_self_closed_paragraph_is_empty() {
        let body = format!("<w:p/>{}", paragraph("After"));
        let tree = parse_document(&docx_bytes(&body)).unwrap();
        let paragraphs = tree.paragraphs();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].runs.is_empty());
        assert_eq!(paragraphs[1].text(), "After");
    }

    #[test]
    fn test_reparse_is_deterministic() {
        let body = format!(
            "{}<w:tbl><w:tr><w:tc>{}</w:tc></w:tr></w:tbl>",
            paragraph("Agreement with [Company Name]"),
            paragraph("Cell ____ value")
        );
        let bytes = docx_bytes(&body);
        let first = parse_document(&bytes).unwrap();
        let second = parse_document(&bytes).unwrap();
        assert_eq!(first, second);
    }
}
