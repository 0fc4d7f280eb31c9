use crate::collector::PostCollector;
use chrono::{DateTime, Utc};
use reddit_client::ForumApi;
use sentiment_core::{CoreError, PostRecord};
use sentiment_engine::SentimentScorer;
use std::cmp::Ordering;
use tracing::info;

pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders an epoch timestamp (seconds, UTC) for the display columns.
pub fn display_timestamp(epoch: f64) -> Option<String> {
    if !epoch.is_finite() {
        return None;
    }
    let seconds = epoch.floor();
    let nanos = ((epoch - seconds) * 1e9) as u32;
    DateTime::<Utc>::from_timestamp(seconds as i64, nanos)
        .map(|time| time.format(DISPLAY_FORMAT).to_string())
}

/// Ascending by timestamp, absent timestamps last.
fn compare_latest(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub record: PostRecord,
    pub timestamp: Option<String>,
    pub commentdate: Option<String>,
}

impl From<PostRecord> for DatasetRow {
    fn from(record: PostRecord) -> Self {
        let timestamp = display_timestamp(record.date);
        let commentdate = record.latest_comment_date.and_then(display_timestamp);
        Self {
            record,
            timestamp,
            commentdate,
        }
    }
}

/// All collected rows, ordered by latest comment time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

impl Dataset {
    /// Derives the display columns and applies the single stable sort.
    pub fn from_records(records: Vec<PostRecord>) -> Self {
        let mut rows: Vec<DatasetRow> = records.into_iter().map(DatasetRow::from).collect();
        rows.sort_by(|a, b| {
            compare_latest(a.record.latest_comment_date, b.record.latest_comment_date)
        });
        Self { rows }
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn records(&self) -> impl Iterator<Item = &PostRecord> {
        self.rows.iter().map(|row| &row.record)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row count per ticker, in first-seen order.
    pub fn ticker_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for record in self.records() {
            match counts.iter_mut().find(|(ticker, _)| *ticker == record.ticker) {
                Some((_, count)) => *count += 1,
                None => counts.push((record.ticker.clone(), 1)),
            }
        }
        counts
    }
}

pub struct DatasetBuilder<'a, F, S: ?Sized> {
    collector: PostCollector<'a, F, S>,
}

impl<'a, F, S> DatasetBuilder<'a, F, S>
where
    F: ForumApi,
    S: SentimentScorer + ?Sized,
{
    pub fn new(collector: PostCollector<'a, F, S>) -> Self {
        Self { collector }
    }

    pub async fn build(&self, tickers: &[String]) -> Result<Dataset, CoreError> {
        let mut records = Vec::new();
        for ticker in tickers {
            let collected = self.collector.collect(ticker).await?;
            records.extend(collected);
        }

        let dataset = Dataset::from_records(records);
        info!(
            "Built dataset with {} rows across {} tickers",
            dataset.len(),
            tickers.len()
        );
        Ok(dataset)
    }
}
