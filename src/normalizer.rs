use chrono::{DateTime, FixedOffset, Utc};
use feed_rs::model::{Entry, Feed};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::types::Article;

/// Maximum summary length in characters, before the ellipsis marker.
pub const SUMMARY_MAX_CHARS: usize = 150;
pub const ELLIPSIS: &str = "...";
pub const NO_SUMMARY: &str = "No summary";

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

/// The fixed target timezone (UTC+8). All source timestamps are converted
/// into it; "now" fallbacks are taken in it.
pub fn target_tz() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).expect("valid UTC+8 offset")
}

/// Format an instant as the fixed-width display date in the target timezone.
pub fn display_date(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&target_tz()).format(DISPLAY_FORMAT).to_string()
}

/// Strip HTML via a simple tag-removal pass (any `<...>` token is dropped,
/// this is not a full HTML parser), trim, and truncate to
/// [`SUMMARY_MAX_CHARS`] characters. The ellipsis marker is appended only
/// when truncation actually occurred.
pub fn clean_summary(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, "");
    let trimmed = stripped.trim();
    if trimmed.chars().count() > SUMMARY_MAX_CHARS {
        let head: String = trimmed.chars().take(SUMMARY_MAX_CHARS).collect();
        format!("{}{}", head, ELLIPSIS)
    } else {
        trimmed.to_string()
    }
}

/// The parent feed's title, used as the article author. Falls back to the
/// subscription URL's domain when the feed carries no title.
pub fn feed_author(feed: &Feed, subscription_url: &str) -> String {
    if let Some(title) = &feed.title {
        if !title.content.trim().is_empty() {
            return title.content.trim().to_string();
        }
    }
    Url::parse(subscription_url)
        .ok()
        .and_then(|u| u.domain().map(|d| d.to_string()))
        .unwrap_or_else(|| subscription_url.to_string())
}

/// The feed's own site link if present, else the subscription URL. Never empty.
pub fn feed_source_url(feed: &Feed, subscription_url: &str) -> String {
    feed.links
        .first()
        .map(|l| l.href.clone())
        .filter(|href| !href.is_empty())
        .unwrap_or_else(|| subscription_url.to_string())
}

/// Convert one raw entry into a canonical [`Article`].
///
/// Field-level problems degrade to fallbacks and never abort the entry:
/// missing/unparseable dates become `now`, a missing summary becomes the
/// placeholder. The one exception is an entry with no link at all, which is
/// skipped since there is nothing useful to point the reader at.
pub fn normalize_entry(
    entry: &Entry,
    author: &str,
    source_url: &str,
    category: &str,
    now: DateTime<Utc>,
) -> Option<Article> {
    let link = match entry.links.first() {
        Some(link) => link.href.clone(),
        None => {
            debug!(entry_id = %entry.id, "Skipping entry without a link");
            return None;
        }
    };

    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.clone())
        .unwrap_or_else(|| "Untitled".to_string());

    // Source struct times are UTC; prefer published, then updated, then now.
    let published_at = entry.published.or(entry.updated).unwrap_or(now);

    let summary = entry
        .summary
        .as_ref()
        .map(|s| s.content.as_str())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.as_deref()))
        .map(clean_summary)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NO_SUMMARY.to_string());

    Some(Article {
        title,
        link,
        published_at,
        display_date: display_date(published_at),
        author: author.to_string(),
        summary,
        source_url: source_url.to_string(),
        category: category.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse_feed(xml: &str) -> Feed {
        feed_rs::parser::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn strips_tags_and_trims() {
        let cleaned = clean_summary("  <p>Hello <b>world</b></p>\n");
        assert_eq!(cleaned, "Hello world");
    }

    #[test]
    fn truncation_is_exact_and_a_prefix() {
        let raw = "x".repeat(200);
        let cleaned = clean_summary(&raw);
        assert_eq!(cleaned.chars().count(), SUMMARY_MAX_CHARS + ELLIPSIS.len());
        assert!(raw.starts_with(cleaned.trim_end_matches(ELLIPSIS)));
    }

    #[test]
    fn no_ellipsis_at_exactly_max_length() {
        let raw = "y".repeat(SUMMARY_MAX_CHARS);
        assert_eq!(clean_summary(&raw), raw);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let raw = "漢".repeat(200);
        let cleaned = clean_summary(&raw);
        assert_eq!(cleaned.chars().count(), SUMMARY_MAX_CHARS + ELLIPSIS.len());
    }

    const FEED_XML: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Example Blog</title>
  <link>https://blog.example.com</link>
  <item>
    <title>Dated post</title>
    <link>https://blog.example.com/dated</link>
    <description>&lt;p&gt;Short summary&lt;/p&gt;</description>
    <pubDate>Tue, 19 Mar 2024 12:00:00 GMT</pubDate>
  </item>
  <item>
    <title>Undated post</title>
    <link>https://blog.example.com/undated</link>
  </item>
</channel></rss>"#;

    #[test]
    fn converts_published_time_to_target_timezone() {
        let feed = parse_feed(FEED_XML);
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();
        let article =
            normalize_entry(&feed.entries[0], "Example Blog", "https://blog.example.com", "Blog", now)
                .unwrap();
        assert_eq!(
            article.published_at,
            Utc.with_ymd_and_hms(2024, 3, 19, 12, 0, 0).unwrap()
        );
        // 12:00 UTC is 20:00 in UTC+8.
        assert_eq!(article.display_date, "2024-03-19 20:00");
        assert_eq!(article.summary, "Short summary");
    }

    #[test]
    fn missing_dates_fall_back_to_now() {
        let feed = parse_feed(FEED_XML);
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 7, 30, 0).unwrap();
        let article =
            normalize_entry(&feed.entries[1], "Example Blog", "https://blog.example.com", "Blog", now)
                .unwrap();
        assert_eq!(article.published_at, now);
        assert_eq!(article.display_date, "2024-03-20 15:30");
    }

    #[test]
    fn missing_summary_uses_placeholder() {
        let feed = parse_feed(FEED_XML);
        let now = Utc::now();
        let article =
            normalize_entry(&feed.entries[1], "Example Blog", "https://blog.example.com", "Blog", now)
                .unwrap();
        assert_eq!(article.summary, NO_SUMMARY);
    }

    #[test]
    fn feed_author_falls_back_to_domain() {
        let feed = parse_feed(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title></title></channel></rss>"#,
        );
        assert_eq!(
            feed_author(&feed, "https://blog.example.com/feed.xml"),
            "blog.example.com"
        );
    }

    #[test]
    fn source_url_prefers_feed_link() {
        let feed = parse_feed(FEED_XML);
        assert_eq!(
            feed_source_url(&feed, "https://blog.example.com/feed.xml"),
            "https://blog.example.com"
        );
    }
}
