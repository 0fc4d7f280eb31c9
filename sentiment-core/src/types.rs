use serde::{Deserialize, Serialize};

/// Marker Reddit uses for accounts that no longer exist.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// A submission as returned by a subreddit search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub subreddit: String,
    pub url: String,
    pub permalink: String,
    pub domain: String,
    pub author: String,
    pub score: i64,
    pub upvote_ratio: f64,
    pub num_comments: u64,
    pub num_crossposts: u64,
    pub created_utc: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditComment {
    pub id: String,
    pub body: String,
    pub created_utc: f64,
}

/// One row of the collected dataset. Built once per qualifying post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub ticker: String,
    pub post_id: String,
    pub num_comments: u64,
    pub comment_sentiment_average: f64,
    pub latest_comment_date: Option<f64>,
    pub score: i64,
    pub upvote_ratio: f64,
    pub date: f64,
    pub domain: String,
    pub num_crossposts: u64,
    pub author: String,
}

impl PostRecord {
    pub fn from_post(
        ticker: &str,
        post: &RedditPost,
        comment_sentiment_average: f64,
        latest_comment_date: Option<f64>,
    ) -> Self {
        Self {
            ticker: ticker.to_string(),
            post_id: post.id.clone(),
            num_comments: post.num_comments,
            comment_sentiment_average,
            latest_comment_date,
            score: post.score,
            upvote_ratio: post.upvote_ratio,
            date: post.created_utc,
            domain: post.domain.clone(),
            num_crossposts: post.num_crossposts,
            author: post.author.clone(),
        }
    }
}
