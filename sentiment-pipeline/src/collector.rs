use crate::fetcher::CommentFetcher;
use futures::stream::{self, StreamExt};
use reddit_client::ForumApi;
use sentiment_core::{CoreError, PostRecord, RedditPost};
use sentiment_engine::{LabelClassifier, SentimentScorer};
use tracing::{debug, info};

/// Where and how far to search for a ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchScope {
    pub subreddit: String,
    pub self_post_domain: String,
    pub limit: usize,
}

impl SearchScope {
    pub fn new(subreddit: &str, limit: usize) -> Self {
        Self {
            subreddit: subreddit.to_string(),
            self_post_domain: format!("self.{}", subreddit),
            limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Link post, or a text post from another subreddit.
    ForeignDomain,
    /// Average label is exactly zero, including posts without usable comments.
    NeutralSentiment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome {
    Accepted(PostRecord),
    Rejected(Rejection),
}

pub struct PostCollector<'a, F, S: ?Sized> {
    fetcher: CommentFetcher<'a, F>,
    scorer: &'a S,
    classifier: LabelClassifier,
    scope: SearchScope,
    concurrency: usize,
}

impl<'a, F, S> PostCollector<'a, F, S>
where
    F: ForumApi,
    S: SentimentScorer + ?Sized,
{
    pub fn new(
        forum: &'a F,
        scorer: &'a S,
        classifier: LabelClassifier,
        scope: SearchScope,
    ) -> Self {
        Self {
            fetcher: CommentFetcher::new(forum),
            scorer,
            classifier,
            scope,
            concurrency: 1,
        }
    }

    /// Number of posts whose comments are fetched at the same time. Results
    /// keep search order regardless.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn collect(&self, ticker: &str) -> Result<Vec<PostRecord>, CoreError> {
        let candidates = self
            .fetcher
            .forum()
            .search(ticker, &self.scope.subreddit, self.scope.limit)
            .await?;
        info!(
            "Evaluating {} candidate posts for {} in r/{}",
            candidates.len(),
            ticker,
            self.scope.subreddit
        );

        let outcomes: Vec<PostOutcome> = stream::iter(candidates.iter())
            .map(|post| self.evaluate(ticker, post))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut records = Vec::new();
        let mut foreign = 0usize;
        let mut neutral = 0usize;
        for outcome in outcomes {
            match outcome {
                PostOutcome::Accepted(record) => records.push(record),
                PostOutcome::Rejected(Rejection::ForeignDomain) => foreign += 1,
                PostOutcome::Rejected(Rejection::NeutralSentiment) => neutral += 1,
            }
        }

        info!(
            "{}: kept {} posts, dropped {} off-domain and {} neutral",
            ticker,
            records.len(),
            foreign,
            neutral
        );
        Ok(records)
    }

    pub async fn evaluate(&self, ticker: &str, post: &RedditPost) -> PostOutcome {
        if post.domain != self.scope.self_post_domain {
            debug!("Skipping post {} with domain {}", post.id, post.domain);
            return PostOutcome::Rejected(Rejection::ForeignDomain);
        }

        let thread = self.fetcher.fetch_thread(post).await;
        let average = self
            .classifier
            .average_sentiment(self.scorer, &thread.bodies());

        // Neutral and comment-less posts are indistinguishable here; both drop.
        if average == 0.0 {
            debug!(
                "Skipping post {}: neutral sentiment over {} comments{}",
                post.id,
                thread.comments().len(),
                if thread.is_failed() { " (fetch failed)" } else { "" }
            );
            return PostOutcome::Rejected(Rejection::NeutralSentiment);
        }

        debug!("Post {} scored {:.3}", post.id, average);
        PostOutcome::Accepted(PostRecord::from_post(
            ticker,
            post,
            average,
            thread.latest_created(),
        ))
    }
}
