pub mod api;
pub mod auth;


pub use api::{collect_search_pages, CommentTree, RedditApiClient, MAX_PAGE_SIZE};
pub use auth::{AppOnlyAuthenticator, RedditOAuth2Config, RedditToken};

use reqwest::Client;
use sentiment_core::{CoreError, RedditComment, RedditPost};
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Read access to a forum: search submissions and pull their comments.
pub trait ForumApi {
    async fn search(
        &self,
        query: &str,
        subreddit: &str,
        limit: usize,
    ) -> Result<Vec<RedditPost>, CoreError>;

    async fn comments(&self, post: &RedditPost) -> Result<Vec<RedditComment>, CoreError>;
}

pub struct RedditClient {
    auth: AppOnlyAuthenticator,
    api: RedditApiClient,
}

impl RedditClient {
    pub fn new(config: RedditOAuth2Config) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let auth = AppOnlyAuthenticator::new(&config, http_client.clone())?;
        let api = RedditApiClient::new(http_client);

        Ok(Self { auth, api })
    }

    /// Fetches the first access token so bad credentials surface before
    /// any collection work starts.
    pub async fn authenticate(&self) -> Result<(), CoreError> {
        self.auth.access_token().await?;
        info!("Authenticated with Reddit");
        Ok(())
    }

    pub async fn cached_token(&self) -> Option<RedditToken> {
        self.auth.cached_token().await
    }
}

impl ForumApi for RedditClient {
    async fn search(
        &self,
        query: &str,
        subreddit: &str,
        limit: usize,
    ) -> Result<Vec<RedditPost>, CoreError> {
        let posts = collect_search_pages(limit, move |page_size, after| async move {
            let token = self.auth.access_token().await?;
            self.api
                .search_subreddit(&token, subreddit, query, page_size, after.as_deref())
                .await
        })
        .await?;

        debug!("Search '{}' in r/{} yielded {} posts", query, subreddit, posts.len());
        Ok(posts)
    }

    async fn comments(&self, post: &RedditPost) -> Result<Vec<RedditComment>, CoreError> {
        let token = self.auth.access_token().await?;
        let tree = self.api.get_comment_tree(&token, &post.id).await?;
        Ok(tree.comments)
    }
}
