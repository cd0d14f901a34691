use std::path::{Path, PathBuf};

use anyhow::Result;
use console::style;

use cvparse_core::{CvParser, ParserConfig};

pub async fn run(
    mut config: ParserConfig,
    path: &Path,
    output: Option<&Path>,
    dump_text: Option<PathBuf>,
    strict: bool,
) -> Result<()> {
    if dump_text.is_some() {
        config.raw_text_dir = dump_text;
    }

    let parser = CvParser::from_config(&config);
    let parsed = parser.parse_file(path).await?;

    if strict {
        parsed.cv.validate(parser.reference_date())?;
    }

    super::emit(output, &serde_json::to_string_pretty(&parsed.cv)?)?;

    if parsed.stats.sections_found == 0 {
        eprintln!(
            "{} {}: no education section",
            style("!").yellow(),
            parsed.name
        );
    } else {
        eprintln!(
            "{} {}: {} education records",
            style("✓").green(),
            parsed.name,
            parsed.stats.records
        );
    }
    if let Some(raw) = &parsed.raw_text_path {
        eprintln!("  Raw text: {}", raw.display());
    }
    if let Some(out) = output {
        eprintln!("  Written: {}", out.display());
    }

    Ok(())
}
