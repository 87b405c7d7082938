use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::types::{DigestError, Result};

/// Category assigned to URLs that appear before any header or match no group.
pub const DEFAULT_CATEGORY: &str = "Blog";

/// One category group from the feed list: a header line and the URLs under it.
#[derive(Debug, Clone)]
pub struct FeedGroup {
    pub category: String,
    pub urls: Vec<String>,
}

/// Typed form of the feed list text. The raw format is a sequence of lines,
/// each either a `Category:` header or a URL belonging to the most recently
/// seen header; it is parsed once here instead of being re-scanned per lookup.
#[derive(Debug, Clone)]
pub struct FeedList {
    groups: Vec<FeedGroup>,
}

impl FeedList {
    /// Parse the raw feed list text. Blank lines are skipped; a line ending in
    /// `:` opens a new group. URLs seen before any header land in the default
    /// "Blog" group.
    pub fn parse(text: &str) -> Self {
        let mut groups: Vec<FeedGroup> = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(name) = line.strip_suffix(':') {
                groups.push(FeedGroup {
                    category: name.to_string(),
                    urls: Vec::new(),
                });
            } else {
                match groups.last_mut() {
                    Some(group) => group.urls.push(line.to_string()),
                    None => {
                        debug!(url = %line, "URL before any category header, assigning default");
                        groups.push(FeedGroup {
                            category: DEFAULT_CATEGORY.to_string(),
                            urls: vec![line.to_string()],
                        });
                    }
                }
            }
        }
        Self { groups }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DigestError::Config(format!("cannot read feed list {}: {}", path.display(), e))
        })?;
        Ok(Self::parse(&text))
    }

    /// Resolve the category owning `url`, or the default if unmatched.
    /// Lookup is exact-match on the URL line.
    pub fn category_of(&self, url: &str) -> &str {
        self.groups
            .iter()
            .find(|g| g.urls.iter().any(|u| u == url))
            .map(|g| g.category.as_str())
            .unwrap_or(DEFAULT_CATEGORY)
    }

    /// All subscriptions in list order as (url, category) pairs.
    pub fn subscriptions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.groups
            .iter()
            .flat_map(|g| g.urls.iter().map(move |u| (u.as_str(), g.category.as_str())))
    }

    pub fn groups(&self) -> &[FeedGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.urls.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct LabelsFile {
    default_limit: i64,
    #[serde(default)]
    labels: Vec<LabelEntry>,
}

#[derive(Debug, Deserialize)]
struct LabelEntry {
    feed_category: String,
    article_limit: i64,
}

/// Per-category article caps with a global default fallback.
///
/// A limit <= 0 means unlimited. Limits apply to the raw entry list in
/// feed-native order, before normalization and sorting.
#[derive(Debug, Clone)]
pub struct LimitPolicy {
    default_limit: i64,
    per_category: HashMap<String, i64>,
}

impl LimitPolicy {
    pub fn new(default_limit: i64) -> Self {
        Self {
            default_limit,
            per_category: HashMap::new(),
        }
    }

    pub fn with_limit(mut self, category: &str, limit: i64) -> Self {
        self.per_category.insert(category.to_string(), limit);
        self
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let file: LabelsFile = serde_yaml::from_str(text)?;
        let per_category = file
            .labels
            .into_iter()
            .map(|l| (l.feed_category, l.article_limit))
            .collect();
        Ok(Self {
            default_limit: file.default_limit,
            per_category,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DigestError::Config(format!("cannot read labels config {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }

    /// Limit for `category`, falling back to the global default when the
    /// category is unconfigured.
    pub fn limit_for(&self, category: &str) -> i64 {
        self.per_category
            .get(category)
            .copied()
            .unwrap_or(self.default_limit)
    }
}

#[derive(Debug, Deserialize)]
struct EmailFile {
    email: EmailConfig,
}

/// Delivery settings that live in config rather than the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub enabled: bool,
    #[serde(default)]
    pub recipients: Vec<String>,
}

impl EmailConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let file: EmailFile = serde_yaml::from_str(text)?;
        Ok(file.email)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DigestError::Config(format!("cannot read email config {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }
}
