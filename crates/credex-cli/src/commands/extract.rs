use credex_core::canonical::canonicalize;
use credex_core::error::CredexError;
use credex_core::{extract_file, ExtractOptions};
use std::path::PathBuf;

pub fn run(
    input_file: PathBuf,
    canonical: bool,
    spans: bool,
    scores: bool,
    page_limit: usize,
    out: Option<PathBuf>,
) -> Result<(), CredexError> {
    let opts = ExtractOptions {
        page_limit,
        include_spans: spans,
        include_candidate_scores: scores,
    };
    let mut rec = extract_file(&input_file, &opts)?;
    if canonical {
        rec = canonicalize(&rec, spans);
    }

    let json = serde_json::to_string_pretty(&rec)?;
    match out {
        Some(path) => {
            std::fs::write(&path, json)?;
            eprintln!(
                "Extracted {} field(s), written to {}",
                rec.len(),
                path.display()
            );
        }
        None => {
            println!("{json}");
        }
    }

    Ok(())
}
