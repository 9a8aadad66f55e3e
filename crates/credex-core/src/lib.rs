//! Field extraction for consumer credit-report summary pages.
//!
//! A report arrives as a structured text dump (pages of blocks, lines and
//! colored spans, produced by an external PDF parser). Extraction flattens
//! the dump into a line sequence, runs a set of independent field locators
//! over it, and accumulates named fields into an insertion-ordered record.
//! A separate canonicalization pass reduces raw records to a stable,
//! comparable shape.

pub mod canonical;
pub mod color;
pub mod error;
pub mod extraction;
pub mod locators;
pub mod normalize;

use crate::error::CredexError;
use crate::extraction::{collect_lines, DocumentSource, JsonDumpSource};
use serde_json::json;
use std::path::Path;

/// Extracted fields in insertion order.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Extraction tuning knobs.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Pages scanned for the credit-factor list. Factor lists live on the
    /// summary pages, so later pages are never searched for them.
    pub page_limit: usize,
    /// Attach `*_bbox`, `*_page` and `*_spans` provenance next to located
    /// fields, and color metadata derived from spans.
    pub include_spans: bool,
    /// Attach a `candidate_scores` ranking of extracted credit factors.
    pub include_candidate_scores: bool,
}

impl Default for ExtractOptions {
    fn default() -> ExtractOptions {
        ExtractOptions {
            page_limit: 2,
            include_spans: false,
            include_candidate_scores: false,
        }
    }
}

/// Run all field locators against a document source.
///
/// A source that fails to produce pages degrades to an empty record rather
/// than an error; only entry points that touch the filesystem can fail.
pub fn extract_fields(source: &dyn DocumentSource, opts: &ExtractOptions) -> Record {
    let lines = collect_lines(source);
    log::debug!(
        "extracting from {} ({} line(s))",
        source.source_name(),
        lines.len()
    );
    let mut rec = Record::new();
    locators::run_all(&lines, opts, &mut rec);
    rec
}

/// Extract fields from a JSON dump file, recording the source file name.
pub fn extract_file(path: &Path, opts: &ExtractOptions) -> Result<Record, CredexError> {
    let source = JsonDumpSource::open(path)?;
    let mut rec = Record::new();
    let filename = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    rec.insert("filename".into(), json!(filename));
    rec.insert("source".into(), json!(path.display().to_string()));
    let lines = collect_lines(&source);
    locators::run_all(&lines, opts, &mut rec);
    Ok(rec)
}

/// Extract a file and reduce it to the canonical text-only record.
pub fn extract_to_canonical(path: &Path) -> Result<Record, CredexError> {
    let opts = ExtractOptions::default();
    let rec = extract_file(path, &opts)?;
    Ok(canonical::canonicalize(&rec, false))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::extraction::{Line, Span};

    /// One single-span uncolored line per input text, stacked vertically.
    pub fn plain_lines(texts: &[&str]) -> Vec<Line> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Line {
                page: 0,
                bbox: [10, (i as i64) * 20, 200, (i as i64) * 20 + 12],
                spans: vec![Span {
                    text: (*t).to_string(),
                    rgb: None,
                    hex: None,
                }],
            })
            .collect()
    }

    /// A single-span line carrying a packed 0xRRGGBB color.
    pub fn colored_line(text: &str, packed: u32) -> Line {
        let rgb = crate::color::Rgb::from_packed(packed);
        Line {
            page: 0,
            bbox: [10, 500, 200, 512],
            spans: vec![Span {
                text: text.to_string(),
                rgb: Some([rgb.r, rgb.g, rgb.b]),
                hex: Some(rgb.to_hex()),
            }],
        }
    }
}
