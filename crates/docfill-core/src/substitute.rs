//! Document-safe literal substitution.
//!
//! Placeholder keys expand into literal match variants which are applied to
//! the run-joined text of each paragraph. The rewrite happens at the XML
//! level: every `w:p` element's events are buffered, its `w:t` texts joined
//! and matched, and on a hit the whole substituted text is emitted into the
//! first `w:t` while the rest are emptied. Per-run character formatting on
//! matched paragraphs is therefore best-effort only; unmatched paragraphs
//! and all other ZIP entries pass through byte-for-byte.

use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Read, Write};

use lazy_static::lazy_static;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::{NoExpand, Regex, RegexBuilder};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::ZipArchive;

use crate::error::DocError;

/// Documents above this decoded size are rejected before any parsing.
pub const MAX_DOCX_BYTES: usize = 5 * 1024 * 1024;

lazy_static! {
    static ref UNDERSCORE_RUN_RE: Regex = Regex::new(r"^_{3,}$").unwrap();
}

/// A compiled case-insensitive literal matcher and its replacement.
struct ReplacementPattern {
    matcher: Regex,
    replacement: String,
}

/// Literal tokens to replace for a given placeholder key.
///
/// Bracketed keys match as exact bracketed text (plus the bare run when the
/// inner text is itself an underscore run); pure underscore runs match
/// themselves; multi-word keys are bracket-wrapped in display form. Bare
/// single words are excluded: they would substring-match ordinary prose.
pub fn expand_placeholder_variants(raw_key: &str) -> Vec<String> {
    let key = raw_key.trim();
    if key.is_empty() {
        return Vec::new();
    }

    if key.len() >= 2 && key.starts_with('[') && key.ends_with(']') {
        let mut variants = vec![key.to_string()];
        let inner = key[1..key.len() - 1].trim();
        if !inner.is_empty() && UNDERSCORE_RUN_RE.is_match(inner) {
            variants.push(inner.to_string());
        }
        return variants;
    }

    if UNDERSCORE_RUN_RE.is_match(key) {
        return vec![key.to_string()];
    }

    if key.contains(' ') || key.contains('_') {
        let display = key.replace('_', " ").trim().to_string();
        if display.is_empty() {
            return Vec::new();
        }
        return vec![format!("[{display}]")];
    }

    Vec::new()
}

/// Expand, dedupe, and priority-sort the full pattern set: bracketed tokens
/// before bare ones, longer before shorter, so `[Company Name]` can never be
/// shadowed by a shorter match.
fn prepare_patterns(mapping: &BTreeMap<String, String>) -> Result<Vec<ReplacementPattern>, DocError> {
    let mut tokens: Vec<(String, String)> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (key, value) in mapping {
        for token in expand_placeholder_variants(key) {
            let token = token.trim().to_string();
            if token.is_empty() || !seen.insert(token.clone()) {
                continue;
            }
            tokens.push((token, value.clone()));
        }
    }

    tokens.sort_by_key(|(token, _)| {
        let bracketed = token.starts_with('[') && token.ends_with(']');
        (
            if bracketed { 0 } else { 1 },
            std::cmp::Reverse(token.chars().count()),
        )
    });

    tokens
        .into_iter()
        .map(|(token, replacement)| {
            let matcher = RegexBuilder::new(&regex::escape(&token))
                .case_insensitive(true)
                .build()
                .map_err(|e| DocError::PatternError(e.to_string()))?;
            Ok(ReplacementPattern {
                matcher,
                replacement,
            })
        })
        .collect()
}

fn replace_in_text(text: &str, patterns: &[ReplacementPattern]) -> (String, usize) {
    let mut updated = text.to_string();
    let mut total = 0;
    for pattern in patterns {
        let count = pattern.matcher.find_iter(&updated).count();
        if count == 0 {
            continue;
        }
        total += count;
        updated = pattern
            .matcher
            .replace_all(&updated, NoExpand(&pattern.replacement))
            .into_owned();
    }
    (updated, total)
}

/// Replace placeholders in DOCX bytes. Returns the rewritten container and
/// the total number of replacements made across body, tables, headers, and
/// footers.
pub fn fill_document(
    bytes: &[u8],
    mapping: &BTreeMap<String, String>,
) -> Result<(Vec<u8>, usize), DocError> {
    if bytes.len() > MAX_DOCX_BYTES {
        return Err(DocError::FileTooLarge);
    }

    let patterns = prepare_patterns(mapping)?;

    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|_| DocError::InvalidDocument)?;
    if archive.by_name("word/document.xml").is_err() {
        return Err(DocError::InvalidDocument);
    }

    let mut out = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let mut total = 0;

    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|_| DocError::InvalidDocument)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|_| DocError::InvalidDocument)?;

        out.start_file(&*name, options)
            .map_err(|e| DocError::WriteError(e.to_string()))?;

        if is_rewritable_part(&name) && !patterns.is_empty() {
            let xml =
                String::from_utf8(data).map_err(|_| DocError::InvalidDocument)?;
            let (rewritten, count) = rewrite_part(&xml, &patterns)?;
            total += count;
            out.write_all(rewritten.as_bytes())
                .map_err(|e| DocError::WriteError(e.to_string()))?;
        } else {
            out.write_all(&data)
                .map_err(|e| DocError::WriteError(e.to_string()))?;
        }
    }

    let cursor = out
        .finish()
        .map_err(|e| DocError::WriteError(e.to_string()))?;
    Ok((cursor.into_inner(), total))
}

/// Derive the download filename for a filled document.
pub fn filled_filename(suggested: Option<&str>) -> String {
    let name = match suggested {
        Some(n) if !n.trim().is_empty() => n,
        _ => "document.docx",
    };
    let base = name.rsplit_once('.').map_or(name, |(base, _)| base);
    format!("{base}_filled.docx")
}

/// Body plus every section header/footer part.
fn is_rewritable_part(name: &str) -> bool {
    name == "word/document.xml"
        || (name.starts_with("word/header") && name.ends_with(".xml"))
        || (name.starts_with("word/footer") && name.ends_with(".xml"))
}

/// Stream one XML part, buffering each paragraph so its run-joined text can
/// be matched as a whole. Everything outside matched paragraphs is copied
/// through untouched.
fn rewrite_part(
    xml: &str,
    patterns: &[ReplacementPattern],
) -> Result<(String, usize), DocError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut paragraph: Option<Vec<Event<'static>>> = None;
    // Text boxes can nest paragraphs inside a paragraph's run content.
    let mut nested_depth = 0usize;
    let mut total = 0;

    let mut buf = Vec::new();
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|_| DocError::InvalidDocument)?;
        match event {
            Event::Eof => break,
            Event::Start(ref e) if e.name().as_ref() == b"w:p" => {
                let owned = event.clone().into_owned();
                if let Some(events) = paragraph.as_mut() {
                    nested_depth += 1;
                    events.push(owned);
                } else {
                    paragraph = Some(vec![owned]);
                }
            }
            Event::End(ref e) if e.name().as_ref() == b"w:p" => {
                if paragraph.is_none() {
                    writer
                        .write_event(event.clone())
                        .map_err(|e| DocError::WriteError(e.to_string()))?;
                } else if nested_depth > 0 {
                    nested_depth -= 1;
                    if let Some(events) = paragraph.as_mut() {
                        events.push(event.clone().into_owned());
                    }
                } else {
                    let mut events = paragraph.take().unwrap_or_default();
                    events.push(event.clone().into_owned());
                    total += flush_paragraph(&mut writer, events, patterns)?;
                }
            }
            other => {
                if let Some(events) = paragraph.as_mut() {
                    events.push(other.into_owned());
                } else {
                    writer
                        .write_event(other)
                        .map_err(|e| DocError::WriteError(e.to_string()))?;
                }
            }
        }
        buf.clear();
    }

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes)
        .map(|xml| (xml, total))
        .map_err(|e| DocError::WriteError(e.to_string()))
}

/// Write a buffered paragraph, substituting its text when any pattern hits.
fn flush_paragraph(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    events: Vec<Event<'static>>,
    patterns: &[ReplacementPattern],
) -> Result<usize, DocError> {
    let mut joined = String::new();
    {
        let mut in_text = false;
        for event in &events {
            match event {
                Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
                Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
                Event::Text(t) if in_text => {
                    joined.push_str(&t.unescape().map_err(|_| DocError::InvalidDocument)?);
                }
                _ => {}
            }
        }
    }

    let (replaced, count) = if joined.is_empty() {
        (String::new(), 0)
    } else {
        replace_in_text(&joined, patterns)
    };

    if count == 0 || replaced == joined {
        for event in events {
            writer
                .write_event(event)
                .map_err(|e| DocError::WriteError(e.to_string()))?;
        }
        return Ok(0);
    }

    // Collapse runs: the first w:t carries the substituted text (with
    // xml:space preserved), every later w:t is emptied.
    let mut emitted_text = false;
    let mut in_text = false;
    for event in events {
        match event {
            Event::Start(ref e) if e.name().as_ref() == b"w:t" => {
                in_text = true;
                if emitted_text {
                    writer.write_event(Event::Start(BytesStart::new("w:t")))
                } else {
                    emitted_text = true;
                    let mut start = BytesStart::new("w:t");
                    start.push_attribute(("xml:space", "preserve"));
                    writer
                        .write_event(Event::Start(start))
                        .and_then(|()| {
                            writer.write_event(Event::Text(BytesText::new(&replaced)))
                        })
                }
            }
            Event::End(ref e) if e.name().as_ref() == b"w:t" => {
                in_text = false;
                writer.write_event(Event::End(BytesEnd::new("w:t")))
            }
            Event::Text(_) if in_text => Ok(()),
            Event::Empty(ref e) if e.name().as_ref() == b"w:t" && !emitted_text => {
                emitted_text = true;
                let mut start = BytesStart::new("w:t");
                start.push_attribute(("xml:space", "preserve"));
                writer
                    .write_event(Event::Start(start))
                    .and_then(|()| writer.write_event(Event::Text(BytesText::new(&replaced))))
                    .and_then(|()| writer.write_event(Event::End(BytesEnd::new("w:t"))))
            }
            other => writer.write_event(other),
        }
        .map_err(|e| DocError::WriteError(e.to_string()))?;
    }

    Ok(count)
}
