mod cli;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use cvparse_core::ParserConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ParserConfig::load(cli.config.as_deref())?;
    if let Some(today) = cli.today {
        config = config.with_reference_date(today);
    }
    tracing::debug!(?config, "configuration loaded");

    dispatch(cli.command, config).await
}

async fn dispatch(command: Commands, config: ParserConfig) -> Result<()> {
    match command {
        Commands::Parse {
            path,
            output,
            dump_text,
            strict,
        } => cli::parse::run(config, &path, output.as_deref(), dump_text, strict).await,
        Commands::Batch {
            dir,
            output,
            dump_text,
        } => cli::batch::run(config, &dir, &output, dump_text).await,
        Commands::Inspect { path, json } => cli::inspect::run(&config, &path, json).await,
        Commands::Mock { output } => cli::mock::run(output.as_deref()),
    }
}
