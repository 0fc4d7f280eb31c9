use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

pub const CLIENT_ID_VAR: &str = "REDDIT_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "REDDIT_CLIENT_SECRET";
pub const USER_AGENT_VAR: &str = "REDDIT_USER_AGENT";

/// Reddit stops serving search results past this many posts.
pub const MAX_SEARCH_LIMIT: usize = 1000;

/// Run configuration. Every section falls back to the reference settings
/// (r/wallstreetbets, GME and AMC, 130 search results, +/-0.1 thresholds).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub reddit: RedditSettings,
    pub collection: CollectionSettings,
    pub sentiment: SentimentSettings,
    pub output: OutputSettings,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: Option<String>,
}

impl fmt::Debug for RedditSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionSettings {
    pub subreddit: String,
    pub tickers: Vec<String>,
    pub search_limit: usize,
    pub comment_concurrency: usize,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            subreddit: "wallstreetbets".to_string(),
            tickers: vec!["GME".to_string(), "AMC".to_string()],
            search_limit: 130,
            comment_concurrency: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentSettings {
    pub positive_threshold: f64,
    pub negative_threshold: f64,
}

impl Default for SentimentSettings {
    fn default() -> Self {
        Self {
            positive_threshold: 0.1,
            negative_threshold: -0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub path: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: "Reddit_Sentiment_Equity.csv".to_string(),
        }
    }
}

/// The three secrets needed for application-only Reddit access.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl AppConfig {
    pub const DEFAULT_PATH: &'static str = "wsb-sentiment.toml";

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Loads the configuration file. An explicit path must exist; without one
    /// the default path is tried and built-in settings are used if it is absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(Self::DEFAULT_PATH), false),
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => {
                info!("Loaded configuration from {}", path.display());
                Self::from_toml_str(&contents)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if required {
                    Err(ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    })
                } else {
                    debug!("No {} found, using built-in settings", path.display());
                    Ok(Self::default())
                }
            }
            Err(e) => Err(ConfigError::ReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Environment values win over the file for the Reddit secrets.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(value) = non_empty(CLIENT_ID_VAR) {
            self.reddit.client_id = Some(value);
        }
        if let Some(value) = non_empty(CLIENT_SECRET_VAR) {
            self.reddit.client_secret = Some(value);
        }
        if let Some(value) = non_empty(USER_AGENT_VAR) {
            self.reddit.user_agent = Some(value);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let collection = &self.collection;
        if collection.subreddit.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "collection.subreddit".to_string(),
            });
        }
        if collection.tickers.is_empty() {
            return Err(ConfigError::MissingField {
                field: "collection.tickers".to_string(),
            });
        }
        if let Some(ticker) = collection.tickers.iter().find(|t| t.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "collection.tickers".to_string(),
                value: format!("{:?}", ticker),
            });
        }
        if collection.search_limit == 0 || collection.search_limit > MAX_SEARCH_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "collection.search_limit".to_string(),
                value: collection.search_limit.to_string(),
            });
        }
        if collection.comment_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "collection.comment_concurrency".to_string(),
                value: "0".to_string(),
            });
        }

        let sentiment = &self.sentiment;
        for (field, value) in [
            ("sentiment.positive_threshold", sentiment.positive_threshold),
            ("sentiment.negative_threshold", sentiment.negative_threshold),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }
        if sentiment.negative_threshold > sentiment.positive_threshold {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "negative_threshold {} exceeds positive_threshold {}",
                    sentiment.negative_threshold, sentiment.positive_threshold
                ),
            });
        }

        if self.output.path.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "output.path".to_string(),
            });
        }

        Ok(())
    }

    pub fn credentials(&self) -> Result<RedditCredentials, ConfigError> {
        fn required(value: &Option<String>, var_name: &str) -> Result<String, ConfigError> {
            value
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                    var_name: var_name.to_string(),
                })
        }

        Ok(RedditCredentials {
            client_id: required(&self.reddit.client_id, CLIENT_ID_VAR)?,
            client_secret: required(&self.reddit.client_secret, CLIENT_SECRET_VAR)?,
            user_agent: required(&self.reddit.user_agent, USER_AGENT_VAR)?,
        })
    }
}
