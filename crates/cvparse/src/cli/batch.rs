use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use console::style;

use cvparse_core::{CvParser, ParseOutput, ParserConfig};

pub async fn run(
    mut config: ParserConfig,
    dir: &Path,
    output: &Path,
    dump_text: Option<PathBuf>,
) -> Result<()> {
    if dump_text.is_some() {
        config.raw_text_dir = dump_text;
    }

    let parser = Arc::new(CvParser::from_config(&config));
    let result = parser
        .parse_directory(dir)
        .await
        .with_context(|| format!("Failed to read {}", dir.display()))?;

    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    for parsed in &result.successful {
        let target = output.join(json_name(parsed));
        let json = serde_json::to_string_pretty(&parsed.cv)?;
        std::fs::write(&target, format!("{json}\n"))
            .with_context(|| format!("Failed to write {}", target.display()))?;
        eprintln!(
            "{} {} ({} records)",
            style("✓").green(),
            parsed.name,
            parsed.stats.records
        );
    }

    for (name, error) in &result.failed {
        eprintln!("{} {}: {}", style("✗").red(), name, error);
    }

    let stats = &result.total_stats;
    eprintln!();
    eprintln!(
        "Parsed {} of {} documents",
        result.success_count(),
        result.success_count() + result.failure_count()
    );
    eprintln!("  Education sections: {}", stats.sections_found);
    eprintln!("  Records: {}", stats.records);

    if result.failure_count() > 0 {
        bail!("{} documents failed", result.failure_count());
    }

    Ok(())
}

fn json_name(parsed: &ParseOutput) -> String {
    let stem = Path::new(&parsed.name)
        .file_stem()
        .map_or_else(|| "document".to_string(), |s| s.to_string_lossy().to_string());
    format!("{stem}.json")
}
