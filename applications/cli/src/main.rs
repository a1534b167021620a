/// normalize - bring a music collection to a common loudness
use anyhow::Context;
use normalize_cli::{Cli, FileScanner, ProgressLine, Settings};
use normalize_engine::{BatchSummary, Dispatcher};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// At least one file failed; the rest of the batch still ran
const EXIT_PARTIAL_FAILURE: u8 = 1;

/// Bad arguments or configuration; nothing ran
const EXIT_USAGE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "normalize=info,normalize_cli=info,normalize_engine=info"
    } else {
        "normalize=warn,normalize_cli=warn,normalize_engine=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(summary) if summary.has_failures() => ExitCode::from(EXIT_PARTIAL_FAILURE),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_USAGE)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<BatchSummary> {
    // Load configuration
    let mut settings =
        Settings::load(cli.config.as_deref()).context("failed to load configuration")?;
    settings.apply_cli(&cli);
    settings.validate()?;
    let config = settings.engine_config()?;

    let files = FileScanner::new(&settings.extensions).collect(&cli.paths)?;

    if cli.dry_run {
        if files.is_empty() {
            println!("Dry run: no files would be normalized.");
        } else {
            println!("Dry run: would normalize {} file(s):", files.len());
            for path in &files {
                println!("  {}", path.display());
            }
        }
        return Ok(BatchSummary::default());
    }

    if files.is_empty() {
        println!("No matching files found.");
        return Ok(BatchSummary::default());
    }

    let transcoder = settings.transcoder();
    if !transcoder.is_available().await {
        anyhow::bail!(
            "ffmpeg not found at {} (use --ffmpeg or NORMALIZE_FFMPEG_PATH)",
            transcoder.ffmpeg_path().display()
        );
    }

    tracing::info!(
        "Target amplitude {}, {} workers, {} files",
        config.target_amplitude(),
        config.workers(),
        files.len()
    );

    let progress = ProgressLine::new(files.len());
    let dispatcher = Dispatcher::new(config, Arc::new(transcoder));
    let summary = dispatcher.run(files, |report| progress.report(report)).await;
    progress.finish();

    tracing::info!(
        "{} normalized, {} skipped, {} failed",
        summary.normalized,
        summary.skipped,
        summary.failed.len()
    );

    Ok(summary)
}
