pub mod json_dump;

pub use json_dump::JsonDumpSource;

use crate::color::Rgb;
use crate::error::CredexError;
use serde::{Deserialize, Serialize};

/// Raw structured dump of one page: blocks -> lines -> spans.
///
/// This mirrors the per-page text/position dump a PDF parser emits; the
/// parser itself stays behind the `DocumentSource` trait.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub blocks: Vec<RawBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBlock {
    #[serde(default)]
    pub bbox: Option<[f64; 4]>,
    #[serde(default)]
    pub lines: Vec<RawLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLine {
    #[serde(default)]
    pub bbox: Option<[f64; 4]>,
    #[serde(default)]
    pub spans: Vec<RawSpan>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSpan {
    #[serde(default)]
    pub text: String,
    /// Packed 0xRRGGBB color, when the source carries style metadata.
    #[serde(default)]
    pub color: Option<u32>,
}

/// Trait for structured-dump document backends.
pub trait DocumentSource {
    /// Produce the per-page raw dumps, in page order.
    fn pages(&self) -> Result<Vec<RawPage>, CredexError>;

    /// Name of this backend (for diagnostics).
    fn source_name(&self) -> &str;
}

/// A styled text run within a line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb: Option<[u8; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
}

impl Span {
    pub fn has_color(&self) -> bool {
        self.rgb.is_some() || self.hex.is_some()
    }

    /// Resolve this span's color, from rgb first, then hex.
    pub fn color(&self) -> Option<Rgb> {
        self.rgb
            .map(|[r, g, b]| Rgb::new(r, g, b))
            .or_else(|| self.hex.as_deref().and_then(Rgb::from_hex))
    }
}

/// One visually contiguous text row. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub page: usize,
    pub bbox: [i64; 4],
    pub spans: Vec<Span>,
}

impl Line {
    /// Joined span text (visual order), trimmed.
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

/// Build the shared line sequence all field locators scan.
///
/// Lines with zero spans are dropped. Bounding boxes come from the line,
/// falling back to the containing block, then to a zero box, with
/// components truncated to integers. If the source cannot be iterated the
/// result is an empty sequence, never an error: downstream locators then
/// report every field as absent.
pub fn collect_lines(source: &dyn DocumentSource) -> Vec<Line> {
    let pages = match source.pages() {
        Ok(pages) => pages,
        Err(e) => {
            log::warn!(
                "document source '{}' not iterable, treating as empty: {e}",
                source.source_name()
            );
            return Vec::new();
        }
    };

    let mut lines = Vec::new();
    for (page_index, page) in pages.iter().enumerate() {
        for block in &page.blocks {
            for raw in &block.lines {
                let spans: Vec<Span> = raw
                    .spans
                    .iter()
                    .map(|s| {
                        let rgb = s.color.map(Rgb::from_packed);
                        Span {
                            text: s.text.clone(),
                            rgb: rgb.map(|c| [c.r, c.g, c.b]),
                            hex: rgb.map(Rgb::to_hex),
                        }
                    })
                    .collect();
                if spans.is_empty() {
                    continue;
                }
                let bbox = raw.bbox.or(block.bbox).unwrap_or([0.0; 4]);
                lines.push(Line {
                    page: page_index,
                    bbox: bbox.map(|v| v as i64),
                    spans,
                });
            }
        }
    }
    lines
}
