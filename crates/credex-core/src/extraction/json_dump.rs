use crate::error::CredexError;
use crate::extraction::{DocumentSource, RawPage};
use serde::Deserialize;
use std::path::Path;

/// Document backend reading a JSON page dump.
///
/// The dump is the structured text output of an external PDF parser:
/// `{"pages": [{"blocks": [{"bbox": [..], "lines": [{"bbox": [..],
/// "spans": [{"text": "..", "color": 13117470}]}]}]}]}`.
pub struct JsonDumpSource {
    pages: Vec<RawPage>,
    name: String,
}

#[derive(Deserialize)]
struct Dump {
    #[serde(default)]
    pages: Vec<RawPage>,
}

impl JsonDumpSource {
    /// Open a dump file. Unreadable or non-JSON input is a caller error,
    /// unlike per-page degradation inside extraction.
    pub fn open(path: &Path) -> Result<JsonDumpSource, CredexError> {
        let text = std::fs::read_to_string(path)?;
        let dump: Dump = serde_json::from_str(&text)?;
        Ok(JsonDumpSource {
            pages: dump.pages,
            name: path.display().to_string(),
        })
    }

    pub fn from_str(text: &str) -> Result<JsonDumpSource, CredexError> {
        let dump: Dump = serde_json::from_str(text)?;
        Ok(JsonDumpSource {
            pages: dump.pages,
            name: "<inline>".to_string(),
        })
    }

    pub fn from_pages(pages: Vec<RawPage>) -> JsonDumpSource {
        JsonDumpSource {
            pages,
            name: "<pages>".to_string(),
        }
    }
}

impl DocumentSource for JsonDumpSource {
    fn pages(&self) -> Result<Vec<RawPage>, CredexError> {
        Ok(self.pages.clone())
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
