pub mod collector;
pub mod dataset;
pub mod exporter;
pub mod fetcher;
pub mod report;

pub use collector::{PostCollector, PostOutcome, Rejection, SearchScope};
pub use dataset::{Dataset, DatasetBuilder, DatasetRow};
pub use exporter::{CsvExporter, COLUMNS};
pub use fetcher::{CommentFetch, CommentFetcher};
pub use report::AuthorStats;

use reddit_client::ForumApi;
use sentiment_core::{AppConfig, CoreError};
use sentiment_engine::{LabelClassifier, SentimentScorer};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything one run needs, built once at startup and passed down.
pub struct PipelineContext<F, S> {
    pub forum: F,
    pub scorer: S,
    pub classifier: LabelClassifier,
    pub scope: SearchScope,
    pub tickers: Vec<String>,
    pub comment_concurrency: usize,
}

impl<F, S> PipelineContext<F, S>
where
    F: ForumApi,
    S: SentimentScorer,
{
    pub fn new(forum: F, scorer: S, scope: SearchScope, tickers: Vec<String>) -> Self {
        Self {
            forum,
            scorer,
            classifier: LabelClassifier::default(),
            scope,
            tickers,
            comment_concurrency: 1,
        }
    }

    pub fn from_config(config: &AppConfig, forum: F, scorer: S) -> Result<Self, CoreError> {
        let classifier = LabelClassifier::new(
            config.sentiment.positive_threshold,
            config.sentiment.negative_threshold,
        )?;
        let scope = SearchScope::new(&config.collection.subreddit, config.collection.search_limit);

        Ok(Self {
            forum,
            scorer,
            classifier,
            scope,
            tickers: config.collection.tickers.clone(),
            comment_concurrency: config.collection.comment_concurrency.max(1),
        })
    }

    pub fn collector(&self) -> PostCollector<'_, F, S> {
        PostCollector::new(&self.forum, &self.scorer, self.classifier, self.scope.clone())
            .with_concurrency(self.comment_concurrency)
    }

    pub fn dataset_builder(&self) -> DatasetBuilder<'_, F, S> {
        DatasetBuilder::new(self.collector())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub rows_exported: usize,
    pub rows_per_ticker: Vec<(String, usize)>,
}

/// Collects every configured ticker, prints the author table and writes the CSV.
pub async fn run<F, S>(context: &PipelineContext<F, S>, output: &Path) -> Result<RunSummary, CoreError>
where
    F: ForumApi,
    S: SentimentScorer,
{
    context.scorer.check_lexicon()?;

    info!(
        "Collecting {} tickers from r/{}",
        context.tickers.len(),
        context.scope.subreddit
    );
    let dataset = context.dataset_builder().build(&context.tickers).await?;
    if dataset.is_empty() {
        warn!("No posts qualified, the export will only hold the header");
    }

    println!("\nAuthor Statistics:");
    print!("{}", AuthorStats::from_dataset(&dataset));

    CsvExporter::export(&dataset, output)?;
    println!("\nResults saved to {}", output.display());

    Ok(RunSummary {
        output: output.to_path_buf(),
        rows_exported: dataset.len(),
        rows_per_ticker: dataset.ticker_counts(),
    })
}
