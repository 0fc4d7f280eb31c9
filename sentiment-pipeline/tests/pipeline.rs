use reddit_client::ForumApi;
use sentiment_core::{
    CoreError, ExportError, PostRecord, RedditApiError, RedditComment, RedditPost,
    SentimentError,
};
use sentiment_engine::{LabelClassifier, PolarityScores, SentimentScorer};
use sentiment_pipeline::{
    run, CommentFetch, CommentFetcher, CsvExporter, Dataset, PipelineContext, PostCollector,
    PostOutcome, Rejection, SearchScope, COLUMNS,
};
use std::collections::{HashMap, HashSet};
use std::env;
use std::path::PathBuf;
use std::sync::Mutex;

const SELF_DOMAIN: &str = "self.wallstreetbets";

#[derive(Default)]
struct StubForum {
    posts: HashMap<String, Vec<RedditPost>>,
    comments: HashMap<String, Vec<RedditComment>>,
    failing: HashSet<String>,
    failing_search: bool,
    searches: Mutex<Vec<String>>,
    comment_requests: Mutex<Vec<String>>,
}

impl StubForum {
    fn with_post(mut self, ticker: &str, post: RedditPost, comments: Vec<RedditComment>) -> Self {
        self.comments.insert(post.id.clone(), comments);
        self.posts.entry(ticker.to_string()).or_default().push(post);
        self
    }

    fn with_failing_post(mut self, ticker: &str, post: RedditPost) -> Self {
        self.failing.insert(post.id.clone());
        self.posts.entry(ticker.to_string()).or_default().push(post);
        self
    }

    fn requested(&self) -> Vec<String> {
        self.comment_requests.lock().unwrap().clone()
    }

    fn searched(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }
}

impl ForumApi for StubForum {
    async fn search(
        &self,
        query: &str,
        subreddit: &str,
        limit: usize,
    ) -> Result<Vec<RedditPost>, CoreError> {
        self.searches.lock().unwrap().push(query.to_string());
        if self.failing_search {
            return Err(RedditApiError::SubredditNotFound {
                subreddit: subreddit.to_string(),
            }
            .into());
        }
        Ok(self
            .posts
            .get(query)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .collect())
    }

    async fn comments(&self, post: &RedditPost) -> Result<Vec<RedditComment>, CoreError> {
        self.comment_requests.lock().unwrap().push(post.id.clone());
        if self.failing.contains(&post.id) {
            return Err(RedditApiError::ServerError { status_code: 503 }.into());
        }
        Ok(self.comments.get(&post.id).cloned().unwrap_or_default())
    }
}

/// Reads the compound score straight out of the comment text.
struct NumericScorer;

impl SentimentScorer for NumericScorer {
    fn score(&self, text: &str) -> PolarityScores {
        PolarityScores {
            compound: text.trim().parse().unwrap_or(0.0),
            ..PolarityScores::neutral()
        }
    }

    // Comment bodies are numbers, so the word-based lexicon check does not apply.
    fn check_lexicon(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Scores every text as neutral, as if the lexicon were empty.
struct BlankScorer;

impl SentimentScorer for BlankScorer {
    fn score(&self, _text: &str) -> PolarityScores {
        PolarityScores::neutral()
    }
}

fn post(id: &str, domain: &str, author: &str) -> RedditPost {
    RedditPost {
        id: id.to_string(),
        title: format!("Post {}", id),
        subreddit: "wallstreetbets".to_string(),
        url: format!("https://www.reddit.com/r/wallstreetbets/comments/{}/", id),
        permalink: format!("/r/wallstreetbets/comments/{}/", id),
        domain: domain.to_string(),
        author: author.to_string(),
        score: 100,
        upvote_ratio: 0.95,
        num_comments: 3,
        num_crossposts: 2,
        created_utc: 1611800000.0,
    }
}

fn comments(scores: &[(f64, f64)]) -> Vec<RedditComment> {
    scores
        .iter()
        .enumerate()
        .map(|(i, (compound, created))| RedditComment {
            id: format!("c{}", i),
            body: compound.to_string(),
            created_utc: *created,
        })
        .collect()
}

fn scope() -> SearchScope {
    SearchScope::new("wallstreetbets", 130)
}

fn temp_output() -> PathBuf {
    env::temp_dir().join(format!("wsb_sentiment_{}.csv", uuid::Uuid::new_v4()))
}

async fn collect_one(forum: &StubForum, ticker: &str) -> Vec<PostRecord> {
    let collector = PostCollector::new(forum, &NumericScorer, LabelClassifier::default(), scope());
    collector.collect(ticker).await.unwrap()
}

#[tokio::test]
async fn test_qualifying_post_is_included() {
    let forum = StubForum::default().with_post(
        "GME",
        post("p1", SELF_DOMAIN, "ape"),
        comments(&[(0.5, 100.0), (0.5, 300.0), (-0.5, 200.0)]),
    );

    let records = collect_one(&forum, "GME").await;
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.ticker, "GME");
    assert_eq!(record.post_id, "p1");
    assert!((record.comment_sentiment_average - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(record.latest_comment_date, Some(300.0));
    assert_eq!(record.num_comments, 3);
    assert_eq!(record.score, 100);
    assert_eq!(record.upvote_ratio, 0.95);
    assert_eq!(record.date, 1611800000.0);
    assert_eq!(record.domain, SELF_DOMAIN);
    assert_eq!(record.num_crossposts, 2);
    assert_eq!(record.author, "ape");
}

#[tokio::test]
async fn test_post_without_comments_is_dropped() {
    let forum = StubForum::default().with_post("GME", post("p1", SELF_DOMAIN, "ape"), vec![]);
    assert!(collect_one(&forum, "GME").await.is_empty());
}

#[tokio::test]
async fn test_neutral_average_is_dropped() {
    let forum = StubForum::default()
        .with_post(
            "GME",
            post("balanced", SELF_DOMAIN, "ape"),
            comments(&[(0.9, 1.0), (-0.9, 2.0)]),
        )
        .with_post(
            "GME",
            post("bland", SELF_DOMAIN, "ape"),
            comments(&[(0.05, 1.0), (-0.1, 2.0), (0.1, 3.0)]),
        );
    assert!(collect_one(&forum, "GME").await.is_empty());
}

#[tokio::test]
async fn test_foreign_domain_is_dropped_without_fetching() {
    let forum = StubForum::default()
        .with_post(
            "GME",
            post("link", "i.redd.it", "ape"),
            comments(&[(0.9, 1.0)]),
        )
        .with_post(
            "GME",
            post("other_sub", "self.stocks", "ape"),
            comments(&[(0.9, 1.0)]),
        );

    assert!(collect_one(&forum, "GME").await.is_empty());
    assert!(forum.requested().is_empty());
}

#[tokio::test]
async fn test_evaluate_reports_rejection_reason() {
    let forum = StubForum::default();
    let collector = PostCollector::new(&forum, &NumericScorer, LabelClassifier::default(), scope());

    let outcome = collector
        .evaluate("GME", &post("link", "youtube.com", "ape"))
        .await;
    assert_eq!(outcome, PostOutcome::Rejected(Rejection::ForeignDomain));

    let outcome = collector
        .evaluate("GME", &post("empty", SELF_DOMAIN, "ape"))
        .await;
    assert_eq!(outcome, PostOutcome::Rejected(Rejection::NeutralSentiment));
}

#[tokio::test]
async fn test_comment_fetch_failure_degrades() {
    let forum = StubForum::default()
        .with_failing_post("GME", post("broken", SELF_DOMAIN, "ape"))
        .with_post(
            "GME",
            post("fine", SELF_DOMAIN, "bull"),
            comments(&[(-0.8, 10.0)]),
        );

    let records = collect_one(&forum, "GME").await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].post_id, "fine");
    assert_eq!(records[0].comment_sentiment_average, -1.0);
    assert_eq!(forum.requested(), vec!["broken", "fine"]);
}

#[tokio::test]
async fn test_fetcher_distinguishes_failure_from_empty() {
    let forum = StubForum::default()
        .with_failing_post("GME", post("broken", SELF_DOMAIN, "ape"))
        .with_post("GME", post("quiet", SELF_DOMAIN, "ape"), vec![])
        .with_post(
            "GME",
            post("busy", SELF_DOMAIN, "ape"),
            comments(&[(0.2, 50.0), (0.3, 75.0)]),
        );
    let fetcher = CommentFetcher::new(&forum);

    let broken = post("broken", SELF_DOMAIN, "ape");
    assert!(matches!(
        fetcher.fetch_thread(&broken).await,
        CommentFetch::Failed(CoreError::RedditApi(RedditApiError::ServerError { .. }))
    ));
    assert!(fetcher.fetch(&broken).await.is_empty());
    assert_eq!(fetcher.latest_comment_time(&broken).await, None);

    let quiet = post("quiet", SELF_DOMAIN, "ape");
    assert!(matches!(
        fetcher.fetch_thread(&quiet).await,
        CommentFetch::NoComments
    ));

    let busy = post("busy", SELF_DOMAIN, "ape");
    assert_eq!(fetcher.fetch(&busy).await, vec!["0.2", "0.3"]);
    assert_eq!(fetcher.latest_comment_time(&busy).await, Some(75.0));
}

#[tokio::test]
async fn test_search_limit_is_passed_through() {
    let mut forum = StubForum::default();
    for i in 0..5 {
        forum = forum.with_post(
            "GME",
            post(&format!("p{}", i), SELF_DOMAIN, "ape"),
            comments(&[(0.5, i as f64)]),
        );
    }

    let collector = PostCollector::new(
        &forum,
        &NumericScorer,
        LabelClassifier::default(),
        SearchScope::new("wallstreetbets", 3),
    );
    assert_eq!(collector.collect("GME").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_concurrent_collection_matches_sequential() {
    let mut forum = StubForum::default();
    for i in 0..8 {
        let compound = if i % 3 == 0 { 0.0 } else { 0.4 };
        forum = forum.with_post(
            "GME",
            post(&format!("p{}", i), SELF_DOMAIN, "ape"),
            comments(&[(compound, 100.0 - i as f64)]),
        );
    }

    let sequential = collect_one(&forum, "GME").await;
    let concurrent = PostCollector::new(&forum, &NumericScorer, LabelClassifier::default(), scope())
        .with_concurrency(4)
        .collect("GME")
        .await
        .unwrap();

    assert_eq!(sequential, concurrent);
    assert_eq!(sequential.len(), 5);
}

#[tokio::test]
async fn test_search_failure_aborts_run() {
    let forum = StubForum {
        failing_search: true,
        ..StubForum::default()
    };
    let context = PipelineContext::new(forum, NumericScorer, scope(), vec!["GME".to_string()]);
    let output = temp_output();

    let result = run(&context, &output).await;
    assert!(matches!(
        result,
        Err(CoreError::RedditApi(RedditApiError::SubredditNotFound { .. }))
    ));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_unusable_lexicon_stops_run_before_search() {
    let forum = StubForum::default().with_post(
        "GME",
        post("p1", SELF_DOMAIN, "ape"),
        comments(&[(0.5, 10.0)]),
    );
    let context = PipelineContext::new(forum, BlankScorer, scope(), vec!["GME".to_string()]);
    let output = temp_output();

    let result = run(&context, &output).await;
    assert!(matches!(
        result,
        Err(CoreError::Sentiment(SentimentError::LexiconUnavailable { .. }))
    ));
    assert!(context.forum.searched().is_empty());
    assert!(context.forum.requested().is_empty());
    assert!(!output.exists());
}

#[tokio::test]
async fn test_two_tickers_exported_in_timestamp_order() {
    let forum = StubForum::default()
        .with_post(
            "GME",
            post("gme_post", SELF_DOMAIN, "ape"),
            comments(&[(0.6, 1611900000.0)]),
        )
        .with_post(
            "AMC",
            post("amc_post", SELF_DOMAIN, "bull"),
            comments(&[(-0.6, 1611850000.0), (0.7, 1611860000.0), (-0.4, 1611855000.0)]),
        );
    let context = PipelineContext::new(
        forum,
        NumericScorer,
        scope(),
        vec!["GME".to_string(), "AMC".to_string()],
    );
    let output = temp_output();

    let summary = run(&context, &output).await.unwrap();
    assert_eq!(summary.rows_exported, 2);
    assert_eq!(
        summary.rows_per_ticker,
        vec![("AMC".to_string(), 1), ("GME".to_string(), 1)]
    );

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), COLUMNS.to_vec());

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "AMC");
    assert_eq!(&rows[0][3], "1611860000");
    assert_eq!(&rows[1][0], "GME");
    assert_eq!(&rows[1][3], "1611900000");

    for row in &rows {
        for (column, value) in COLUMNS.iter().zip(row.iter()).take(10) {
            assert!(!value.is_empty(), "column {} is empty", column);
        }
    }

    let amc_average: f64 = rows[0][2].parse().unwrap();
    assert!((amc_average + 1.0 / 3.0).abs() < 1e-9);

    std::fs::remove_file(&output).unwrap();
}

#[tokio::test]
async fn test_export_failure_is_reported() {
    let dataset = Dataset::from_records(vec![]);
    let destination = env::temp_dir()
        .join(format!("missing_{}", uuid::Uuid::new_v4()))
        .join("out.csv");

    let result = CsvExporter::export(&dataset, &destination);
    assert!(matches!(
        result,
        Err(CoreError::Export(ExportError::WriteFailed { .. }))
    ));
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_export_replaces_existing_file() {
    let output = temp_output();
    std::fs::write(&output, "stale").unwrap();

    let forum = StubForum::default().with_post(
        "GME",
        post("p1", SELF_DOMAIN, "ape"),
        comments(&[(0.5, 10.0)]),
    );
    let context = PipelineContext::new(forum, NumericScorer, scope(), vec!["GME".to_string()]);
    run(&context, &output).await.unwrap();

    let contents = std::fs::read_to_string(&output).unwrap();
    assert!(contents.starts_with("ticker,"));
    assert!(!contents.contains("stale"));

    std::fs::remove_file(&output).unwrap();
}
