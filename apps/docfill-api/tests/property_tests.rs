//! Property-based tests for docfill-api
//!
//! Tests the extraction/substitution invariants the API relies on using
//! proptest.

use std::collections::BTreeMap;
use std::io::Write;

use docfill_core::slug::ContextKeyer;
use docfill_core::substitute::expand_placeholder_variants;
use docfill_core::{extract_placeholders, fill_document, filled_filename, parse_document};
use proptest::prelude::*;
use zip::write::{SimpleFileOptions, ZipWriter};

// ============================================================
// Strategies
// ============================================================

/// Placeholder labels: 1-3 capitalized alphabetic words.
fn label() -> impl Strategy<Value = String> {
    proptest::collection::vec("[A-Z][a-z]{2,8}", 1..=3).prop_map(|words| words.join(" "))
}

/// Words that are never stopwords (no stopword starts with q, x, or z).
fn content_word() -> impl Strategy<Value = String> {
    "[qxz][a-z]{3,8}"
}

fn docx_bytes(paragraphs: &[String]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|text| format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>"))
        .collect();
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}</w:body></w:document>"
    );
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ============================================================
    // Extraction Invariants
    // ============================================================

    #[test]
    fn labeled_keys_are_snake_cased_labels(label in label()) {
        let bytes = docx_bytes(&[format!("Agreement with [{label}] today")]);
        let records = extract_placeholders(&parse_document(&bytes).unwrap());
        let expected = label.to_lowercase().replace(' ', "_");
        prop_assert_eq!(&records[0].key, &expected);
        prop_assert_eq!(&records[0].tokens[0], &format!("[{label}]"));
    }

    #[test]
    fn extraction_is_deterministic(labels in proptest::collection::vec(label(), 1..5)) {
        let paragraphs: Vec<String> = labels
            .iter()
            .map(|l| format!("Field [{l}] appears here"))
            .collect();
        let bytes = docx_bytes(&paragraphs);
        let first = extract_placeholders(&parse_document(&bytes).unwrap());
        let second = extract_placeholders(&parse_document(&bytes).unwrap());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn trailing_blank_keys_come_from_preceding_words(
        a in content_word(),
        b in content_word()
    ) {
        let text = format!("The {a} {b} is ____.");
        let start = text.find("____").unwrap();
        let mut keyer = ContextKeyer::new();
        let (key, _) = keyer.key_for_blank(&text, start, start + 4);
        prop_assert_eq!(key, format!("{a}_{b}"));
    }

    // ============================================================
    // Substitution Invariants
    // ============================================================

    #[test]
    fn bare_single_words_never_become_patterns(word in "[a-z]{2,12}") {
        prop_assert!(expand_placeholder_variants(&word).is_empty());
    }

    #[test]
    fn bare_words_in_mapping_never_touch_prose(word in content_word()) {
        let bytes = docx_bytes(&[format!("the {word} shall be delivered")]);
        let mapping: BTreeMap<String, String> =
            [(word.clone(), "REPLACED".to_string())].into();
        let (filled, count) = fill_document(&bytes, &mapping).unwrap();
        prop_assert_eq!(count, 0);
        let text = parse_document(&filled).unwrap().paragraphs()[0].text();
        prop_assert!(!text.contains("REPLACED"));
    }

    #[test]
    fn filling_a_labeled_placeholder_removes_its_key(label in label()) {
        let bytes = docx_bytes(&[format!("Value: [{label}] here")]);
        let key = label.to_lowercase().replace(' ', "_");
        // Bracketed keys always expand to a literal pattern, even for
        // single-word labels whose bare form is excluded.
        let mapping: BTreeMap<String, String> =
            [(format!("[{label}]"), "Acme".to_string())].into();
        let (filled, count) = fill_document(&bytes, &mapping).unwrap();
        prop_assert_eq!(count, 1);
        let records = extract_placeholders(&parse_document(&filled).unwrap());
        prop_assert!(records.iter().all(|r| r.key != key));
    }

    // ============================================================
    // Filename Derivation
    // ============================================================

    #[test]
    fn filled_filenames_carry_the_suffix(name in "[A-Za-z0-9_-]{1,20}(\\.[a-z]{1,5})?") {
        let filled = filled_filename(Some(&name));
        prop_assert!(filled.ends_with("_filled.docx"));
    }
}
