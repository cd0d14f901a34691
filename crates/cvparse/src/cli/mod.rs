pub mod batch;
pub mod inspect;
pub mod mock;
pub mod parse;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cvparse",
    about = "Extract structured education history from résumé text",
    version
)]
pub struct Cli {
    /// Config file (JSON); defaults to <config dir>/cvparse/config.json
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Date that ongoing studies end on (YYYY-MM-DD, default today)
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse one résumé and print its JSON
    Parse {
        /// Text or markdown file
        path: PathBuf,
        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Directory for raw-<name>.txt dumps of the normalized text
        #[arg(long = "dump-text")]
        dump_text: Option<PathBuf>,
        /// Fail if the applicant is under 18
        #[arg(long)]
        strict: bool,
    },
    /// Parse every supported file in a directory
    Batch {
        /// Directory of résumés
        dir: PathBuf,
        /// Directory for <name>.json results
        #[arg(short, long)]
        output: PathBuf,
        /// Directory for raw-<name>.txt dumps of the normalized text
        #[arg(long = "dump-text")]
        dump_text: Option<PathBuf>,
    },
    /// Show the education section and its resolved spans
    Inspect {
        path: PathBuf,
        /// Print spans as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the placeholder document
    Mock {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Writes `json` to `output`, or stdout when no path is given.
pub fn emit(output: Option<&Path>, json: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
