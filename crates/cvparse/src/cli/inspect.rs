use std::path::Path;

use anyhow::Result;
use console::style;

use cvparse_core::ingest::{CompositeSource, TextSource};
use cvparse_core::{EducationExtractor, ParserConfig};

pub async fn run(config: &ParserConfig, path: &Path, json: bool) -> Result<()> {
    let document = CompositeSource::default().load_file(path).await?;
    let extractor = EducationExtractor::new(config.build_recognizer());

    let Some((section, spans)) = extractor.inspect(&document.text) else {
        eprintln!("{} No education section found", style("○").dim());
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&spans)?);
        return Ok(());
    }

    eprintln!(
        "{} Section: {} (bytes {}..{})",
        style("●").green(),
        style(section.title.as_deref().unwrap_or("?")).bold(),
        section.start_offset,
        section.end_offset
    );
    eprintln!("  Recognizer: {}", extractor.recognizer().backend_id());
    for span in &spans {
        println!(
            "{:>5}..{:<5} {:<15} {}",
            span.start,
            span.end,
            span.kind.as_str(),
            span.text
        );
    }

    Ok(())
}
