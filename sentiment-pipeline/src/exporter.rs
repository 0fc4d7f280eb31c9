use crate::dataset::Dataset;
use sentiment_core::{CoreError, ExportError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Output columns, in the order downstream consumers expect.
pub const COLUMNS: [&str; 12] = [
    "ticker",
    "num_comments",
    "comment_sentiment_average",
    "latest_comment_date",
    "score",
    "upvote_ratio",
    "date",
    "domain",
    "num_crossposts",
    "author",
    "timestamp",
    "commentdate",
];

pub struct CsvExporter;

impl CsvExporter {
    pub fn render(dataset: &Dataset) -> Result<Vec<u8>, CoreError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(COLUMNS).map_err(ExportError::from)?;

        for row in dataset.rows() {
            let record = &row.record;
            wtr.write_record([
                record.ticker.clone(),
                record.num_comments.to_string(),
                record.comment_sentiment_average.to_string(),
                record
                    .latest_comment_date
                    .map(|t| t.to_string())
                    .unwrap_or_default(),
                record.score.to_string(),
                record.upvote_ratio.to_string(),
                record.date.to_string(),
                record.domain.clone(),
                record.num_crossposts.to_string(),
                record.author.clone(),
                row.timestamp.clone().unwrap_or_default(),
                row.commentdate.clone().unwrap_or_default(),
            ])
            .map_err(ExportError::from)?;
        }

        wtr.into_inner()
            .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())).into())
    }

    /// Writes the whole dataset or nothing: the file is staged next to the
    /// destination and renamed over it once complete.
    pub fn export(dataset: &Dataset, destination: &Path) -> Result<(), CoreError> {
        let contents = Self::render(dataset)?;
        let staging = staging_path(destination);

        let write_failed = |reason: String| ExportError::WriteFailed {
            path: destination.display().to_string(),
            reason,
        };

        if let Err(e) = fs::write(&staging, &contents) {
            error!("Failed to stage export at {}: {}", staging.display(), e);
            let _ = fs::remove_file(&staging);
            return Err(write_failed(e.to_string()).into());
        }

        if let Err(e) = fs::rename(&staging, destination) {
            error!("Failed to move export into {}: {}", destination.display(), e);
            let _ = fs::remove_file(&staging);
            return Err(write_failed(e.to_string()).into());
        }

        info!(
            "Wrote {} rows to {}",
            dataset.len(),
            destination.display()
        );
        Ok(())
    }
}

fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentiment_core::PostRecord;

    fn record(ticker: &str, latest: Option<f64>) -> PostRecord {
        PostRecord {
            ticker: ticker.to_string(),
            post_id: "abc".to_string(),
            num_comments: 12,
            comment_sentiment_average: 0.25,
            latest_comment_date: latest,
            score: 42,
            upvote_ratio: 0.93,
            date: 1611800000.0,
            domain: "self.wallstreetbets".to_string(),
            num_crossposts: 1,
            author: "ape, with comma".to_string(),
        }
    }

    #[test]
    fn test_header_and_rows() {
        let dataset = Dataset::from_records(vec![record("GME", Some(1611867702.0))]);
        let output = String::from_utf8(CsvExporter::render(&dataset).unwrap()).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], COLUMNS.join(","));
        assert_eq!(
            lines[1],
            "GME,12,0.25,1611867702,42,0.93,1611800000,self.wallstreetbets,1,\"ape, with comma\",2021-01-28 02:13:20,2021-01-28 21:01:42"
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_missing_latest_comment_is_empty_cell() {
        let dataset = Dataset::from_records(vec![record("AMC", None)]);
        let output = String::from_utf8(CsvExporter::render(&dataset).unwrap()).unwrap();
        let row = output.lines().nth(1).unwrap();
        assert!(row.starts_with("AMC,12,0.25,,42,"));
        assert!(row.ends_with("2021-01-28 02:13:20,"));
    }

    #[test]
    fn test_empty_dataset_writes_header_only() {
        let output = CsvExporter::render(&Dataset::default()).unwrap();
        assert_eq!(String::from_utf8(output).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_staging_path() {
        assert_eq!(
            staging_path(Path::new("out/data.csv")),
            PathBuf::from("out/data.csv.partial")
        );
    }
}
