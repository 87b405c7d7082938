use chrono::{DateTime, Utc};
use feed_rs::model::Feed;
use tracing::{error, info};

use crate::config::{FeedList, LimitPolicy};
use crate::fetcher::FeedFetcher;
use crate::normalizer;
use crate::types::{Article, FeedFailure, FeedSnapshot};

/// Fixed flatten order for the final sequence. Categories outside this list
/// are appended after it in first-seen order rather than dropped.
pub const CATEGORY_PRIORITY: &[&str] = &["Blog", "News"];

/// Articles accumulated for one category, in fetch order.
#[derive(Debug, Clone)]
pub struct CategoryBucket {
    pub category: String,
    pub articles: Vec<Article>,
}

/// Normalize one fetched feed into articles.
///
/// The raw entry list is truncated to `limit` first, in feed-native order, so
/// the cap reflects the source feed's own ordering rather than recency. A
/// limit <= 0 keeps every entry.
pub fn articles_from_feed(
    feed: &Feed,
    subscription_url: &str,
    category: &str,
    limit: i64,
    now: DateTime<Utc>,
) -> Vec<Article> {
    let author = normalizer::feed_author(feed, subscription_url);
    let source_url = normalizer::feed_source_url(feed, subscription_url);

    let take = if limit > 0 { limit as usize } else { feed.entries.len() };
    feed.entries
        .iter()
        .take(take)
        .filter_map(|entry| normalizer::normalize_entry(entry, &author, &source_url, category, now))
        .collect()
}

/// Append articles to their category bucket, creating buckets in first-seen
/// category order.
pub fn push_into_bucket(buckets: &mut Vec<CategoryBucket>, category: &str, articles: Vec<Article>) {
    match buckets.iter_mut().find(|b| b.category == category) {
        Some(bucket) => bucket.articles.extend(articles),
        None => buckets.push(CategoryBucket {
            category: category.to_string(),
            articles,
        }),
    }
}

/// Sort each bucket descending by publish time (stable, ties keep fetch
/// order) and flatten: priority categories first, remaining buckets in
/// first-seen order.
pub fn flatten_by_priority(mut buckets: Vec<CategoryBucket>) -> Vec<Article> {
    for bucket in &mut buckets {
        bucket
            .articles
            .sort_by(|a, b| b.published_at.cmp(&a.published_at));
    }

    let mut flattened = Vec::new();
    for &category in CATEGORY_PRIORITY {
        if let Some(pos) = buckets.iter().position(|b| b.category == category) {
            flattened.append(&mut buckets.remove(pos).articles);
        }
    }
    for mut bucket in buckets {
        flattened.append(&mut bucket.articles);
    }
    flattened
}

/// Single-shot aggregation run: fetch every subscription sequentially,
/// normalize, apply limits, order, and produce the snapshot. Failed feeds are
/// collected rather than aborting the run.
pub struct FeedAggregator {
    fetcher: FeedFetcher,
    feed_list: FeedList,
    limits: LimitPolicy,
}

impl FeedAggregator {
    pub fn new(fetcher: FeedFetcher, feed_list: FeedList, limits: LimitPolicy) -> Self {
        Self {
            fetcher,
            feed_list,
            limits,
        }
    }

    pub async fn run(&self) -> (FeedSnapshot, Vec<FeedFailure>) {
        let now = Utc::now();
        let mut buckets: Vec<CategoryBucket> = Vec::new();
        let mut failures = Vec::new();

        for (url, category) in self.feed_list.subscriptions() {
            match self.fetcher.fetch(url).await {
                Ok(feed) => {
                    let limit = self.limits.limit_for(category);
                    let articles = articles_from_feed(&feed, url, category, limit, now);
                    info!(
                        "Feed {}: {} articles in category {} (limit {})",
                        url,
                        articles.len(),
                        category,
                        limit
                    );
                    push_into_bucket(&mut buckets, category, articles);
                }
                Err(e) => {
                    error!("Failed to fetch feed {}: {}", url, e);
                    failures.push(FeedFailure {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let articles = flatten_by_priority(buckets);
        let snapshot = FeedSnapshot {
            update_time: update_time(now),
            articles,
        };
        (snapshot, failures)
    }
}

/// The run date in the target timezone.
fn update_time(now: DateTime<Utc>) -> String {
    now.with_timezone(&normalizer::target_tz())
        .format("%Y-%m-%d")
        .to_string()
}
