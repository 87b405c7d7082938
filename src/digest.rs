use chrono::{DateTime, FixedOffset};
use std::fmt::Write as _;

use crate::aggregator::CATEGORY_PRIORITY;
use crate::types::Article;

pub const DIGEST_SUBJECT: &str = "Daily RSS Digest";

const STYLE: &str = r#"<style>
  body { font-family: -apple-system, "Segoe UI", Roboto, Helvetica, Arial, sans-serif;
         line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto;
         padding: 15px; background: #f9f9f9; font-size: 14px; }
  .header { display: flex; justify-content: space-between; align-items: baseline;
            border-bottom: 2px solid #eee; padding-bottom: 8px; margin: 20px 0 15px; }
  .header h2 { font-size: 20px; font-weight: 500; color: #2c3e50; margin: 0; }
  .header .time { font-size: 13px; color: #7f8c8d; }
  h3 { font-size: 18px; font-weight: 500; color: #34495e; margin: 20px 0 12px; }
  .post { background: white; border-radius: 6px; padding: 15px; margin: 12px 0;
          box-shadow: 0 1px 3px rgba(0,0,0,0.05); }
  .title { font-size: 16px; margin-bottom: 8px; }
  .title a { color: #2c3e50; text-decoration: none; font-weight: 500; }
  .meta { font-size: 13px; color: #7f8c8d; margin-bottom: 8px; }
  .category { display: inline-block; padding: 2px 6px; border-radius: 3px;
              font-size: 12px; font-weight: 500; margin-right: 6px;
              background: #e3f2fd; color: #1976d2; }
  .summary { font-size: 14px; color: #5f6368; line-height: 1.5; }
  footer { margin-top: 30px; padding-top: 15px; border-top: 1px solid #eee;
           text-align: center; font-size: 13px; color: #95a5a6; }
</style>"#;

/// The rendered digest email: HTML body plus a plain-text alternative.
#[derive(Debug, Clone)]
pub struct RenderedDigest {
    pub subject: String,
    pub html: String,
    pub text: String,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Group articles by category, priority categories first and any others in
/// first-seen order. Input order within a category is kept as-is (the
/// snapshot already sorts descending by publish time).
fn group_by_category(articles: &[Article]) -> Vec<(&str, Vec<&Article>)> {
    let mut groups: Vec<(&str, Vec<&Article>)> = CATEGORY_PRIORITY
        .iter()
        .map(|&c| (c, Vec::new()))
        .collect();
    for article in articles {
        match groups.iter_mut().find(|(c, _)| *c == article.category) {
            Some((_, bucket)) => bucket.push(article),
            None => groups.push((article.category.as_str(), vec![article])),
        }
    }
    groups.retain(|(_, bucket)| !bucket.is_empty());
    groups
}

/// Render the digest for an already-filtered article list. Returns `None`
/// when there is nothing to send.
pub fn render_digest(articles: &[Article], now_local: DateTime<FixedOffset>) -> Option<RenderedDigest> {
    if articles.is_empty() {
        return None;
    }

    let current_time = now_local.format("%Y-%m-%d %H:%M").to_string();
    let groups = group_by_category(articles);

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<html><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1.0">{STYLE}</head><body>"#
    );
    let _ = write!(
        html,
        r#"<div class="header"><h2>{DIGEST_SUBJECT}</h2><span class="time">{current_time}</span></div>"#
    );

    let mut text = format!("{DIGEST_SUBJECT} — {current_time}\n");

    for (category, bucket) in &groups {
        let _ = write!(html, "<h3>{}</h3>", escape(category));
        let _ = write!(text, "\n{category}\n");

        for article in bucket {
            let _ = write!(
                html,
                r#"<div class="post"><div class="title"><a href="{link}" target="_blank">{title}</a></div><div class="meta"><span class="category">{category}</span>{author} / {date}</div><div class="summary">{summary}</div></div>"#,
                link = article.link,
                title = escape(&article.title),
                category = escape(&article.category),
                author = escape(&article.author),
                date = article.display_date,
                summary = escape(&article.summary),
            );
            let _ = write!(
                text,
                "- {} ({} / {})\n  {}\n",
                article.title, article.author, article.display_date, article.link
            );
        }
    }

    html.push_str("<footer>Generated by feed-digest</footer></body></html>");

    Some(RenderedDigest {
        subject: DIGEST_SUBJECT.to_string(),
        html,
        text,
    })
}
