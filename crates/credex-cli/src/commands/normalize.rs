use credex_core::canonical::canonicalize;
use credex_core::error::CredexError;
use credex_core::Record;
use std::path::Path;

/// Rewrite a stored record into canonical form, in place or to stdout.
pub fn run(file: &Path, in_place: bool) -> Result<(), CredexError> {
    let text = std::fs::read_to_string(file)?;
    let rec: Record = serde_json::from_str(&text)?;
    let canon = canonicalize(&rec, false);
    let json = serde_json::to_string_pretty(&canon)?;

    if in_place {
        std::fs::write(file, json)?;
        eprintln!("Normalized {} field(s) in {}", canon.len(), file.display());
    } else {
        println!("{json}");
    }

    Ok(())
}
