use reqwest::{Client, Response};
use sentiment_core::{CoreError, RedditApiError, RedditComment, RedditPost, DELETED_AUTHOR};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, error, info, warn};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Reddit caps listing pages at 100 children.
pub const MAX_PAGE_SIZE: usize = 100;

const COMMENT_TREE_LIMIT: &str = "500";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub subreddit: String,
    pub url: String,
    pub permalink: String,
    pub created_utc: f64,
    pub score: i64,
    pub num_comments: u64,
    #[serde(default)]
    pub upvote_ratio: f64,
    #[serde(default)]
    pub num_crossposts: u64,
    pub domain: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentListing {
    #[serde(default)]
    pub kind: String,
    pub data: CommentListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentListingData {
    pub children: Vec<CommentChild>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum CommentChild {
    #[serde(rename = "t1")]
    Comment(RedditCommentData),
    #[serde(rename = "more")]
    More(MoreCommentsData),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    #[serde(default)]
    pub body: String,
    pub created_utc: f64,
    #[serde(default)]
    pub replies: CommentReplies,
}

/// Reddit sends `""` instead of an empty listing for leaf comments.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommentReplies {
    Listing(Box<CommentListing>),
    Empty(String),
}

impl Default for CommentReplies {
    fn default() -> Self {
        CommentReplies::Empty(String::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoreCommentsData {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub children: Vec<String>,
}

/// Flattened comments of one thread, depth first.
#[derive(Debug, Clone, Default)]
pub struct CommentTree {
    pub comments: Vec<RedditComment>,
    pub unexpanded: u64,
}

impl CommentTree {
    pub fn from_listing(listing: CommentListing) -> Self {
        let mut tree = Self::default();
        tree.walk(listing);
        tree
    }

    fn walk(&mut self, listing: CommentListing) {
        for child in listing.data.children {
            match child {
                CommentChild::Comment(data) => {
                    self.comments.push(RedditComment {
                        id: data.id,
                        body: data.body,
                        created_utc: data.created_utc,
                    });
                    if let CommentReplies::Listing(replies) = data.replies {
                        self.walk(*replies);
                    }
                }
                CommentChild::More(more) => {
                    self.unexpanded += more.count.max(more.children.len() as u64);
                }
            }
        }
    }
}

/// Walks a paginated search until `limit` posts are gathered. `fetch_page`
/// receives the page size to ask for and the `after` cursor of the previous
/// page. Stops early once Reddit reports no further cursor or sends an empty
/// page.
pub async fn collect_search_pages<P, Fut>(
    limit: usize,
    mut fetch_page: P,
) -> Result<Vec<RedditPost>, CoreError>
where
    P: FnMut(usize, Option<String>) -> Fut,
    Fut: Future<Output = Result<RedditListing<RedditPostData>, CoreError>>,
{
    let mut posts = Vec::new();
    let mut after: Option<String> = None;

    while posts.len() < limit {
        let page_size = (limit - posts.len()).min(MAX_PAGE_SIZE);
        let listing = fetch_page(page_size, after.take()).await?;

        let received = listing.data.children.len();
        posts.extend(
            listing
                .data
                .children
                .into_iter()
                .map(|child| RedditPost::from(child.data)),
        );

        match listing.data.after {
            Some(next) if received > 0 => after = Some(next),
            _ => break,
        }
    }

    posts.truncate(limit);
    Ok(posts)
}

#[derive(Debug, Clone)]
pub struct RedditApiClient {
    http_client: Client,
}

impl RedditApiClient {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }

    pub async fn make_request(
        &self,
        endpoint: &str,
        access_token: &str,
        query_params: &[(&str, String)],
        not_found: RedditApiError,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", REDDIT_API_BASE, endpoint);

        debug!("Making Reddit API request: GET {}", endpoint);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .query(query_params)
            .send()
            .await
            .map_err(|e| {
                error!("Network error for GET {}: {}", endpoint, e);
                if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let api_error = match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, Reddit asked to wait {} seconds", retry_after);
                RedditApiError::RateLimitExceeded { retry_after }
            }
            401 => RedditApiError::InvalidToken,
            403 => RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            },
            404 => not_found,
            code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
            code => RedditApiError::InvalidResponse {
                details: format!("Unexpected status {} for {}", code, endpoint),
            },
        };
        Err(CoreError::RedditApi(api_error))
    }

    pub async fn search_subreddit(
        &self,
        access_token: &str,
        subreddit: &str,
        query: &str,
        limit: usize,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/search", subreddit);
        let mut params = vec![
            ("q", query.to_string()),
            ("restrict_sr", "1".to_string()),
            ("sort", "relevance".to_string()),
            ("t", "all".to_string()),
            ("type", "link".to_string()),
            ("raw_json", "1".to_string()),
            ("limit", limit.min(MAX_PAGE_SIZE).to_string()),
        ];
        if let Some(after_val) = after {
            params.push(("after", after_val.to_string()));
        }

        let response = self
            .make_request(
                &endpoint,
                access_token,
                &params,
                RedditApiError::SubredditNotFound {
                    subreddit: subreddit.to_string(),
                },
            )
            .await?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse search results: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse search results for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{} for '{}'",
            listing.data.children.len(),
            subreddit,
            query
        );
        Ok(listing)
    }

    pub async fn get_comment_tree(
        &self,
        access_token: &str,
        post_id: &str,
    ) -> Result<CommentTree, CoreError> {
        let endpoint = format!("/comments/{}", post_id);
        let params = [
            ("limit", COMMENT_TREE_LIMIT.to_string()),
            ("raw_json", "1".to_string()),
        ];

        let response = self
            .make_request(
                &endpoint,
                access_token,
                &params,
                RedditApiError::PostNotFound {
                    post_id: post_id.to_string(),
                },
            )
            .await?;

        // The thread endpoint answers with [post listing, comment listing].
        let (_, comments): (IgnoredAny, CommentListing) = response.json().await.map_err(|e| {
            error!("Failed to parse comments for {}: {}", post_id, e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse comments for post {}", post_id),
            })
        })?;

        let tree = CommentTree::from_listing(comments);
        debug!(
            "Retrieved {} comments for post {} ({} left unexpanded)",
            tree.comments.len(),
            post_id,
            tree.unexpanded
        );
        Ok(tree)
    }
}

impl From<RedditPostData> for RedditPost {
    fn from(post_data: RedditPostData) -> Self {
        let author = if post_data.author.is_empty() {
            DELETED_AUTHOR.to_string()
        } else {
            post_data.author
        };

        Self {
            id: post_data.id,
            title: post_data.title,
            subreddit: post_data.subreddit,
            url: post_data.url,
            permalink: post_data.permalink,
            domain: post_data.domain,
            author,
            score: post_data.score,
            upvote_ratio: post_data.upvote_ratio,
            num_comments: post_data.num_comments,
            num_crossposts: post_data.num_crossposts,
            created_utc: post_data.created_utc,
        }
    }
}
