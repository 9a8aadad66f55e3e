mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "credex",
    version,
    about = "Field extraction for credit-report summary pages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fields from a structured page dump (JSON)
    Extract {
        /// Path to the JSON page dump
        input_file: PathBuf,

        /// Reduce the result to the canonical text-only record
        #[arg(long)]
        canonical: bool,

        /// Attach span/bbox/page provenance to located fields
        #[arg(long)]
        spans: bool,

        /// Attach a candidate-score ranking of extracted credit factors
        #[arg(long)]
        scores: bool,

        /// Pages scanned for the credit-factor list
        #[arg(long, default_value_t = 2, value_name = "N")]
        page_limit: usize,

        /// Write the record to a JSON file instead of stdout
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Compare two stored records field by field (both canonicalized first)
    Diff {
        /// Path to the left record JSON
        left: PathBuf,

        /// Path to the right record JSON
        right: PathBuf,
    },
    /// Rewrite a stored record into canonical form
    Normalize {
        /// Path to the record JSON
        file: PathBuf,

        /// Rewrite the file in place instead of printing to stdout
        #[arg(long)]
        in_place: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input_file,
            canonical,
            spans,
            scores,
            page_limit,
            out,
        } => commands::extract::run(input_file, canonical, spans, scores, page_limit, out),
        Commands::Diff { left, right } => commands::diff::run(&left, &right),
        Commands::Normalize { file, in_place } => commands::normalize::run(&file, in_place),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
