#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pageshot::{
    ChromeSession, OutputFormat, PageshotError, RunConfig, ShotArgs, TokioClock, run_batch, urls,
};

// Exit codes
const EXIT_SUCCESS: i32 = 0;

#[derive(Parser)]
#[command(name = "pageshot", version)]
#[command(
    about = "Bulk screenshots of one or many URLs, scrolling each page so lazy-loaded content renders",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    args: ShotArgs,
}

#[tokio::main]
async fn main() {
    // Handle exit codes based on error type
    match run().await {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            let pageshot_err: PageshotError = err.into();

            // Output JSON error to stdout for programmatic consumption
            let error_json = json!({
                "error": true,
                "message": pageshot_err.to_string(),
                "exit_code": pageshot_err.exit_code()
            });
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );

            // Also log to stderr for human reading
            eprintln!("Error: {}", pageshot_err);
            std::process::exit(pageshot_err.exit_code());
        }
    }
}

async fn run() -> Result<()> {
    // Initialize tracing to stderr (so the report on stdout remains clean)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pageshot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    // Everything that can be checked without a browser is checked first
    let config = RunConfig::from_args(&cli.args)?;
    let urls = urls::load_urls(cli.args.urls.as_deref(), &cli.args.urls_file)?;
    info!("Capturing {} URLs into {}", urls.len(), config.output_dir.display());

    let session = ChromeSession::launch(&config).await?;
    let result = run_batch(&session, &urls, &config, &TokioClock).await;

    if let Err(e) = session.close().await {
        warn!("{:#}", e);
    }

    let report = result?;
    if !report.failures.is_empty() {
        warn!(
            "{} of {} URLs could not be captured",
            report.failures.len(),
            report.total
        );
    }

    match config.report_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Simple => println!("{}", report.to_simple()),
    }

    Ok(())
}
