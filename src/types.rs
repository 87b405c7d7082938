use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical, normalized representation of one feed entry.
///
/// `published_at` is always populated: entries without a usable source date
/// fall back to the time of normalization, never null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub published_at: DateTime<Utc>,
    pub display_date: String,
    pub author: String,
    pub summary: String,
    pub source_url: String,
    pub category: String,
}

/// The persisted run artifact: all articles in final category/priority order
/// plus the date the run was performed (target timezone).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub update_time: String,
    pub articles: Vec<Article>,
}

/// One feed that could not be fetched or parsed. Collected per run so a bad
/// feed produces a log line and zero articles instead of aborting the run.
#[derive(Debug, Clone)]
pub struct FeedFailure {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    BadStatus { url: String, status: u16 },

    #[error("feed parse error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("email build error: {0}")]
    Email(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

pub type Result<T> = std::result::Result<T, DigestError>;
