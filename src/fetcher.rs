use std::time::Duration;

use feed_rs::model::Feed;
use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, info};

use crate::types::{DigestError, Result};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "feed-digest/0.1".to_string(),
            timeout_seconds: 30,
            max_redirects: 5,
        }
    }
}

/// HTTP fetch + parse for a single feed URL. No retries: a failed feed is
/// reported to the caller and skipped for this run.
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    pub async fn fetch(&self, url: &str) -> Result<Feed> {
        debug!("Fetching feed: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DigestError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content = response.text().await?;
        info!("Fetched feed: {} ({} bytes)", url, content.len());

        parser::parse(content.as_bytes())
            .map_err(|e| DigestError::Parse(format!("{}: {}", url, e)))
    }
}

impl Default for FeedFetcher {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}
