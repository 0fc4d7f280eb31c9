use reddit_client::RedditClient;
use sentiment_core::{AppConfig, CoreError, ErrorReporter};
use sentiment_engine::VaderScorer;
use sentiment_pipeline::PipelineContext;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "wsb_sentiment=info,sentiment_pipeline=info,reddit_client=info";

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    tracing::info!("Starting WSB sentiment collection");

    let result = run().await;
    if let Err(e) = &result {
        ErrorReporter::new().report_error(e);
    }
    result
}

async fn run() -> Result<(), CoreError> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let mut config = AppConfig::load(config_path.as_deref())?;
    config.apply_env_overrides();
    config.validate()?;
    tracing::debug!("Configuration: {:?}", config);

    // The lexicon has to be usable before any Reddit traffic happens.
    let scorer = VaderScorer::load()?;

    let client = RedditClient::new(config.credentials()?.into())?;
    client.authenticate().await?;

    let context = PipelineContext::from_config(&config, client, scorer)?;
    let summary = sentiment_pipeline::run(&context, Path::new(&config.output.path)).await?;

    for (ticker, rows) in &summary.rows_per_ticker {
        tracing::info!("{}: {} rows", ticker, rows);
    }
    tracing::info!(
        "Exported {} rows to {}",
        summary.rows_exported,
        summary.output.display()
    );
    Ok(())
}
