use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};

use crate::types::Article;

/// Which articles from a persisted snapshot belong in the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Articles whose date, in the target timezone, is today's date.
    CalendarDay,
    /// The 24h cycle anchored at 08:00 local: `[yesterday 08:00, today
    /// 08:00)` before today's 08:00, else `[today 08:00, tomorrow 08:00)`.
    RollingEightAm,
}

fn at_hour(date: NaiveDate, hour: u32, tz: FixedOffset) -> DateTime<FixedOffset> {
    let naive = date.and_hms_opt(hour, 0, 0).expect("valid wall-clock hour");
    tz.from_local_datetime(&naive)
        .single()
        .expect("fixed offsets are unambiguous")
}

/// Half-open window bounds `[start, end)` for a policy, given the current
/// local time. Comparison downstream is on structured times, not on the
/// formatted display strings.
pub fn window_bounds(
    policy: WindowPolicy,
    now_local: DateTime<FixedOffset>,
) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let tz = *now_local.offset();
    let today = now_local.date_naive();
    match policy {
        WindowPolicy::CalendarDay => {
            let start = at_hour(today, 0, tz);
            (start, start + Duration::days(1))
        }
        WindowPolicy::RollingEightAm => {
            let today_8am = at_hour(today, 8, tz);
            if now_local < today_8am {
                (today_8am - Duration::days(1), today_8am)
            } else {
                (today_8am, today_8am + Duration::days(1))
            }
        }
    }
}

/// Select the articles whose publish time falls in the policy's window.
/// Snapshot order (category priority, per-category descending) is preserved.
/// An empty result means "skip the digest this run", not an error.
pub fn filter_articles(
    articles: &[Article],
    policy: WindowPolicy,
    now_local: DateTime<FixedOffset>,
) -> Vec<Article> {
    let (start, end) = window_bounds(policy, now_local);
    let start = start.with_timezone(&Utc);
    let end = end.with_timezone(&Utc);
    articles
        .iter()
        .filter(|a| start <= a.published_at && a.published_at < end)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::target_tz;
    use chrono::TimeZone;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        target_tz().with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn article(published_local: DateTime<FixedOffset>) -> Article {
        Article {
            title: "t".to_string(),
            link: "https://example.com/t".to_string(),
            published_at: published_local.with_timezone(&Utc),
            display_date: published_local.format("%Y-%m-%d %H:%M").to_string(),
            author: "Feed".to_string(),
            summary: "s".to_string(),
            source_url: "https://example.com".to_string(),
            category: "Blog".to_string(),
        }
    }

    #[test]
    fn rolling_window_before_8am_covers_previous_cycle() {
        let now = local(2024, 3, 20, 7, 0);
        let (start, end) = window_bounds(WindowPolicy::RollingEightAm, now);
        assert_eq!(start, local(2024, 3, 19, 8, 0));
        assert_eq!(end, local(2024, 3, 20, 8, 0));
    }

    #[test]
    fn rolling_window_after_8am_covers_current_cycle() {
        let now = local(2024, 3, 20, 9, 30);
        let (start, end) = window_bounds(WindowPolicy::RollingEightAm, now);
        assert_eq!(start, local(2024, 3, 20, 8, 0));
        assert_eq!(end, local(2024, 3, 21, 8, 0));
    }

    #[test]
    fn rolling_window_includes_last_evening_excludes_future() {
        // Current time 07:00 on 2024-03-20 in the target timezone.
        let now = local(2024, 3, 20, 7, 0);
        let inside = article(local(2024, 3, 19, 20, 0));
        let outside = article(local(2024, 3, 20, 9, 0));

        let kept = filter_articles(&[inside, outside], WindowPolicy::RollingEightAm, now);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].display_date, "2024-03-19 20:00");
    }

    #[test]
    fn window_end_is_exclusive() {
        let now = local(2024, 3, 20, 7, 0);
        let boundary = article(local(2024, 3, 20, 8, 0));
        let kept = filter_articles(&[boundary], WindowPolicy::RollingEightAm, now);
        assert!(kept.is_empty());
    }

    #[test]
    fn calendar_day_keeps_only_todays_articles() {
        let now = local(2024, 3, 20, 18, 0);
        let today = article(local(2024, 3, 20, 0, 5));
        let yesterday = article(local(2024, 3, 19, 23, 55));

        let kept = filter_articles(&[today, yesterday], WindowPolicy::CalendarDay, now);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].display_date, "2024-03-20 00:05");
    }

    #[test]
    fn empty_result_is_valid() {
        let now = local(2024, 3, 20, 18, 0);
        let kept = filter_articles(&[], WindowPolicy::CalendarDay, now);
        assert!(kept.is_empty());
    }

    #[test]
    fn filter_preserves_snapshot_order() {
        let now = local(2024, 3, 20, 18, 0);
        let a = article(local(2024, 3, 20, 10, 0));
        let b = article(local(2024, 3, 20, 12, 0));
        let kept = filter_articles(&[a, b], WindowPolicy::CalendarDay, now);
        assert_eq!(kept[0].display_date, "2024-03-20 10:00");
        assert_eq!(kept[1].display_date, "2024-03-20 12:00");
    }
}
