use credex_core::canonical::canonicalize;
use credex_core::error::CredexError;
use credex_core::Record;
use std::path::Path;

/// Compare two stored records after canonicalizing both sides, so legacy
/// fixture shapes (nested objects, alias keys) diff cleanly against fresh
/// extractions.
pub fn run(left_path: &Path, right_path: &Path) -> Result<(), CredexError> {
    let left = load_canonical(left_path)?;
    let right = load_canonical(right_path)?;

    let mut keys: Vec<&String> = left.keys().collect();
    for k in right.keys() {
        if !left.contains_key(k) {
            keys.push(k);
        }
    }

    let mut differences = 0;
    for k in keys {
        match (left.get(k), right.get(k)) {
            (Some(l), Some(r)) if l == r => {}
            (Some(l), Some(r)) => {
                println!("~ {k}: {l} != {r}");
                differences += 1;
            }
            (Some(l), None) => {
                println!("- {k}: {l}");
                differences += 1;
            }
            (None, Some(r)) => {
                println!("+ {k}: {r}");
                differences += 1;
            }
            (None, None) => {}
        }
    }

    if differences == 0 {
        println!("Records match ({} field(s))", left.len());
    } else {
        println!("{differences} difference(s)");
    }

    Ok(())
}

fn load_canonical(path: &Path) -> Result<Record, CredexError> {
    let text = std::fs::read_to_string(path)?;
    let rec: Record = serde_json::from_str(&text)?;
    Ok(canonicalize(&rec, false))
}
