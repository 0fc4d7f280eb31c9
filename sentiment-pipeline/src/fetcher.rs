use reddit_client::ForumApi;
use sentiment_core::{CoreError, ErrorExt, RedditComment, RedditPost};
use tracing::{debug, warn};

/// Outcome of pulling one post's comments. Failures are kept as values so the
/// batch can carry on while callers can still tell them apart from empty threads.
#[derive(Debug)]
pub enum CommentFetch {
    Fetched(Vec<RedditComment>),
    NoComments,
    Failed(CoreError),
}

impl CommentFetch {
    pub fn comments(&self) -> &[RedditComment] {
        match self {
            CommentFetch::Fetched(comments) => comments,
            CommentFetch::NoComments | CommentFetch::Failed(_) => &[],
        }
    }

    pub fn bodies(&self) -> Vec<String> {
        self.comments().iter().map(|c| c.body.clone()).collect()
    }

    /// Creation time of the newest comment, if any.
    pub fn latest_created(&self) -> Option<f64> {
        self.comments()
            .iter()
            .map(|c| c.created_utc)
            .fold(None, |latest: Option<f64>, t| {
                Some(latest.map_or(t, |l| l.max(t)))
            })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CommentFetch::Failed(_))
    }
}

pub struct CommentFetcher<'a, F> {
    forum: &'a F,
}

impl<'a, F: ForumApi> CommentFetcher<'a, F> {
    pub fn new(forum: &'a F) -> Self {
        Self { forum }
    }

    pub fn forum(&self) -> &'a F {
        self.forum
    }

    pub async fn fetch_thread(&self, post: &RedditPost) -> CommentFetch {
        match self.forum.comments(post).await {
            Ok(comments) if comments.is_empty() => {
                debug!("Post {} has no comments", post.id);
                CommentFetch::NoComments
            }
            Ok(comments) => CommentFetch::Fetched(comments),
            Err(e) => {
                warn!(
                    "Comments for post {} unavailable ({}), treating as empty",
                    post.id,
                    e.error_code()
                );
                e.log_warn();
                CommentFetch::Failed(e)
            }
        }
    }

    /// Text of every comment reachable for the post; empty on failure.
    pub async fn fetch(&self, post: &RedditPost) -> Vec<String> {
        self.fetch_thread(post).await.bodies()
    }

    pub async fn latest_comment_time(&self, post: &RedditPost) -> Option<f64> {
        self.fetch_thread(post).await.latest_created()
    }
}
