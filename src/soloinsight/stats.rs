//! # Statistics Engine
//!
//! Pure functions over an entry snapshot. Nothing is cached: every view
//! recomputes from the list it is handed.
//!
//! Two notions of time are used:
//! - **Elapsed time** (rolling windows, gaps, streaks, intervals) works on raw
//!   millisecond timestamps. "Whole days" truncate toward zero.
//! - **Calendar time** (per-day buckets, months, hour of day) is evaluated in
//!   the time zone of the `DateTime` the caller passes in, so the same entries
//!   bucket differently for a user in Tokyo and one in Lisbon.
//!
//! Every average and percentage is defined for empty input and returns 0.

use crate::model::{Entry, Outcome};
use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Timelike};
use serde::Serialize;

pub const DAY_MS: i64 = 86_400_000;
pub const SHORT_WINDOW_DAYS: i64 = 30;
pub const LONG_WINDOW_DAYS: i64 = 90;
pub const CHART_DAYS: u32 = 7;
pub const TIME_OF_DAY_BUCKETS: usize = 12;
pub const TOP_TAGS: usize = 5;
pub const TREND_LENGTH: usize = 20;
/// Sessions closer than this extend a streak.
pub const STREAK_BREAK_MS: i64 = 2 * DAY_MS;
/// Sessions closer than this count as the same sitting for interval averages.
pub const SAME_SITTING_DAYS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Duration,
    Intensity,
}

impl Metric {
    fn of(self, entry: &Entry) -> f64 {
        match self {
            Metric::Duration => f64::from(entry.duration),
            Metric::Intensity => f64::from(entry.intensity),
        }
    }
}

fn whole_days(later_ms: i64, earlier_ms: i64) -> i64 {
    (later_ms - earlier_ms) / DAY_MS
}

fn local<Tz: TimeZone>(entry: &Entry, tz: &Tz) -> DateTime<Tz> {
    entry.occurred_at().with_timezone(tz)
}

/// Arithmetic mean, treating an empty input as having a denominator of one.
fn mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    sum / count.max(1) as f64
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / whole` as a rounded percentage; 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 * 100.0 / whole as f64).round() as u32
}

fn sorted_timestamps(entries: &[Entry]) -> Vec<i64> {
    let mut ts: Vec<i64> = entries.iter().map(|e| e.timestamp).collect();
    ts.sort_unstable();
    ts
}

/// Entries no more than `days` whole days before `now_ms`.
pub fn within_days(entries: &[Entry], now_ms: i64, days: i64) -> Vec<&Entry> {
    entries
        .iter()
        .filter(|e| whole_days(now_ms, e.timestamp) <= days)
        .collect()
}

pub fn rolling_count(entries: &[Entry], now_ms: i64, days: i64) -> usize {
    within_days(entries, now_ms, days).len()
}

pub fn rolling_average(entries: &[Entry], now_ms: i64, days: i64, metric: Metric) -> f64 {
    mean(within_days(entries, now_ms, days).into_iter().map(|e| metric.of(e)))
}

/// Share of the window's entries with a YES outcome, as a rounded percentage.
pub fn outcome_rate(entries: &[Entry], now_ms: i64, days: i64) -> u32 {
    let window = within_days(entries, now_ms, days);
    let hits = window.iter().filter(|e| e.outcome == Outcome::Yes).count();
    percentage(hits, window.len())
}

/// Largest whole-day gap between chronologically adjacent entries.
pub fn max_gap_days(entries: &[Entry]) -> i64 {
    sorted_timestamps(entries)
        .windows(2)
        .map(|pair| whole_days(pair[1], pair[0]))
        .max()
        .unwrap_or(0)
}

/// Longest run of sessions each less than two days after the previous one.
pub fn longest_streak(entries: &[Entry]) -> usize {
    let ts = sorted_timestamps(entries);
    if ts.is_empty() {
        return 0;
    }
    let mut best = 1;
    let mut current = 1;
    for pair in ts.windows(2) {
        if pair[1] - pair[0] < STREAK_BREAK_MS {
            current += 1;
        } else {
            current = 1;
        }
        best = best.max(current);
    }
    best
}

/// Mean days between adjacent sessions, skipping same-sitting pairs.
pub fn average_interval_days(entries: &[Entry]) -> f64 {
    let gaps = sorted_timestamps(entries)
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) as f64 / DAY_MS as f64)
        .filter(|days| *days >= SAME_SITTING_DAYS)
        .collect::<Vec<_>>();
    mean(gaps)
}

pub fn edging_rate(entries: &[Entry]) -> u32 {
    let edging = entries
        .iter()
        .filter(|e| e.outcome == Outcome::Edging)
        .count();
    percentage(edging, entries.len())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: NaiveDate,
    pub count: usize,
    pub avg_intensity: f64,
}

/// One bucket per calendar day for the last `days` days (today included),
/// oldest first.
pub fn daily_buckets<Tz: TimeZone>(entries: &[Entry], now: &DateTime<Tz>, days: u32) -> Vec<DayBucket> {
    let tz = now.timezone();
    let today = now.date_naive();
    let dated: Vec<(NaiveDate, &Entry)> = entries
        .iter()
        .map(|e| (local(e, &tz).date_naive(), e))
        .collect();

    (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
        .map(|date| {
            let day: Vec<&Entry> = dated
                .iter()
                .filter(|(d, _)| *d == date)
                .map(|(_, e)| *e)
                .collect();
            DayBucket {
                date,
                count: day.len(),
                avg_intensity: mean(day.iter().map(|e| Metric::Intensity.of(e))),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthStats {
    pub year: i32,
    pub month: u32,
    pub total_sessions: usize,
    pub total_duration: u64,
    pub avg_intensity: f64,
    /// The month's entries, newest first.
    pub entries: Vec<Entry>,
}

/// Aggregates for the calendar month containing `reference`.
pub fn month_stats<Tz: TimeZone>(entries: &[Entry], reference: &DateTime<Tz>) -> MonthStats {
    let tz = reference.timezone();
    let (year, month) = (reference.year(), reference.month());
    let mut in_month: Vec<Entry> = entries
        .iter()
        .filter(|e| {
            let at = local(e, &tz);
            at.year() == year && at.month() == month
        })
        .cloned()
        .collect();
    in_month.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    MonthStats {
        year,
        month,
        total_sessions: in_month.len(),
        total_duration: in_month.iter().map(|e| u64::from(e.duration)).sum(),
        avg_intensity: round1(mean(in_month.iter().map(|e| Metric::Intensity.of(e)))),
        entries: in_month,
    }
}

/// Entry counts per two-hour window of the local day: index 0 is 00:00-01:59.
pub fn time_of_day<Tz: TimeZone>(entries: &[Entry], tz: &Tz) -> [usize; TIME_OF_DAY_BUCKETS] {
    let mut buckets = [0; TIME_OF_DAY_BUCKETS];
    for entry in entries {
        let hour = local(entry, tz).hour() as usize;
        buckets[hour / 2] += 1;
    }
    buckets
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagStat {
    pub tag: String,
    pub count: usize,
    pub avg_intensity: f64,
}

/// Tags ranked by the mean intensity of the entries carrying them. Ties go
/// to the more frequent tag, then alphabetical order.
pub fn tag_ranking(entries: &[Entry], limit: usize) -> Vec<TagStat> {
    let mut totals: Vec<(String, usize, u64)> = Vec::new();
    for entry in entries {
        let mut seen: Vec<&str> = Vec::with_capacity(entry.tags.len());
        for tag in &entry.tags {
            if seen.contains(&tag.as_str()) {
                continue;
            }
            seen.push(tag);
            match totals.iter_mut().find(|(name, _, _)| name == tag) {
                Some((_, count, sum)) => {
                    *count += 1;
                    *sum += u64::from(entry.intensity);
                }
                None => totals.push((tag.clone(), 1, u64::from(entry.intensity))),
            }
        }
    }

    let mut ranked: Vec<TagStat> = totals
        .into_iter()
        .map(|(tag, count, sum)| TagStat {
            tag,
            count,
            avg_intensity: sum as f64 / count as f64,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.avg_intensity
            .total_cmp(&a.avg_intensity)
            .then(b.count.cmp(&a.count))
            .then_with(|| a.tag.cmp(&b.tag))
    });
    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub duration: u32,
    pub intensity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    /// The most recent sessions, oldest first.
    pub points: Vec<TrendPoint>,
    pub avg_duration: u32,
    pub avg_intensity: f64,
}

/// Duration and intensity of the last `limit` sessions, plus all-time averages.
pub fn trend<Tz: TimeZone>(entries: &[Entry], tz: &Tz, limit: usize) -> Trend {
    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.timestamp);
    let skip = sorted.len().saturating_sub(limit);
    let points = sorted[skip..]
        .iter()
        .map(|e| TrendPoint {
            date: local(e, tz).date_naive(),
            duration: e.duration,
            intensity: e.intensity,
        })
        .collect();

    Trend {
        points,
        avg_duration: mean(entries.iter().map(|e| Metric::Duration.of(e))).round() as u32,
        avg_intensity: round1(mean(entries.iter().map(|e| Metric::Intensity.of(e)))),
    }
}

/// The headline numbers shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub count_30: usize,
    pub count_90: usize,
    /// Minutes, rounded to the nearest whole minute.
    pub avg_duration: u32,
    /// One decimal place.
    pub avg_intensity: f64,
    pub outcome_rate: u32,
    pub max_gap_days: i64,
    pub last_session: Option<Entry>,
    pub last_7_days: Vec<DayBucket>,
}

pub fn dashboard<Tz: TimeZone>(entries: &[Entry], now: &DateTime<Tz>) -> DashboardStats {
    let now_ms = now.timestamp_millis();
    DashboardStats {
        count_30: rolling_count(entries, now_ms, SHORT_WINDOW_DAYS),
        count_90: rolling_count(entries, now_ms, LONG_WINDOW_DAYS),
        avg_duration: rolling_average(entries, now_ms, SHORT_WINDOW_DAYS, Metric::Duration)
            .round() as u32,
        avg_intensity: round1(rolling_average(
            entries,
            now_ms,
            SHORT_WINDOW_DAYS,
            Metric::Intensity,
        )),
        outcome_rate: outcome_rate(entries, now_ms, SHORT_WINDOW_DAYS),
        max_gap_days: max_gap_days(entries),
        last_session: entries.last().cloned(),
        last_7_days: daily_buckets(entries, now, CHART_DAYS),
    }
}

/// The long-view analytics screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepInsights {
    pub time_of_day: [usize; TIME_OF_DAY_BUCKETS],
    pub top_tags: Vec<TagStat>,
    pub longest_streak: usize,
    pub avg_interval_days: f64,
    pub edging_rate: u32,
    pub trend: Trend,
}

pub fn deep_insights<Tz: TimeZone>(entries: &[Entry], tz: &Tz) -> DeepInsights {
    DeepInsights {
        time_of_day: time_of_day(entries, tz),
        top_tags: tag_ranking(entries, TOP_TAGS),
        longest_streak: longest_streak(entries),
        avg_interval_days: round1(average_interval_days(entries)),
        edging_rate: edging_rate(entries),
        trend: trend(entries, tz, TREND_LENGTH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    const T: i64 = 1_717_200_000_000; // 2024-06-01T00:00:00Z
    const HOUR_MS: i64 = 3_600_000;

    fn entry(ts: i64, duration: u32, intensity: u8, outcome: Outcome, tags: &[&str]) -> Entry {
        Entry {
            id: format!("e{}", ts),
            timestamp: ts,
            duration,
            intensity,
            outcome,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            note: String::new(),
            linked_content: None,
            photo_data: None,
        }
    }

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    #[test]
    fn dashboard_scenario_two_sessions() {
        let entries = vec![
            entry(T, 10, 2, Outcome::No, &[]),
            entry(T + DAY_MS, 45, 5, Outcome::Yes, &["a"]),
        ];
        let stats = dashboard(&entries, &at(T + DAY_MS + HOUR_MS));
        assert_eq!(stats.count_30, 2);
        assert_eq!(stats.avg_duration, 28);
        assert_eq!(stats.avg_intensity, 3.5);
        assert_eq!(stats.outcome_rate, 50);
        assert_eq!(stats.max_gap_days, 1);
        assert_eq!(stats.last_session.unwrap().duration, 45);
    }

    #[test]
    fn empty_history_yields_zeroes() {
        let stats = dashboard(&[], &at(T));
        assert_eq!(stats.count_30, 0);
        assert_eq!(stats.avg_duration, 0);
        assert_eq!(stats.avg_intensity, 0.0);
        assert_eq!(stats.outcome_rate, 0);
        assert_eq!(stats.max_gap_days, 0);
        assert!(stats.last_session.is_none());
        assert!(stats.last_7_days.iter().all(|b| b.count == 0 && b.avg_intensity == 0.0));

        let insights = deep_insights(&[], &Utc);
        assert_eq!(insights.edging_rate, 0);
        assert_eq!(insights.longest_streak, 0);
        assert_eq!(insights.avg_interval_days, 0.0);
        assert!(insights.top_tags.is_empty());
        assert!(!insights.avg_interval_days.is_nan());
    }

    #[test]
    fn rolling_average_is_zero_when_window_is_empty() {
        let old = vec![entry(T - 40 * DAY_MS, 20, 4, Outcome::Yes, &[])];
        assert_eq!(rolling_average(&old, T, 30, Metric::Intensity), 0.0);
        assert_eq!(rolling_count(&old, T, 90), 1);
    }

    #[test]
    fn rolling_average_of_intensity_stays_in_range() {
        let entries: Vec<Entry> = (0..10)
            .map(|i| entry(T - i * DAY_MS, 5, (i % 5 + 1) as u8, Outcome::No, &[]))
            .collect();
        let avg = rolling_average(&entries, T, 30, Metric::Intensity);
        assert!((0.0..=5.0).contains(&avg));
    }

    #[test]
    fn window_boundary_uses_whole_days() {
        let edge = vec![entry(T - 30 * DAY_MS - HOUR_MS, 5, 3, Outcome::No, &[])];
        assert_eq!(rolling_count(&edge, T, 30), 1);
        let past = vec![entry(T - 31 * DAY_MS, 5, 3, Outcome::No, &[])];
        assert_eq!(rolling_count(&past, T, 30), 0);
    }

    #[test]
    fn max_gap_ignores_order() {
        let mut entries = vec![
            entry(T, 5, 3, Outcome::No, &[]),
            entry(T + 10 * DAY_MS, 5, 3, Outcome::No, &[]),
            entry(T + 3 * DAY_MS, 5, 3, Outcome::No, &[]),
        ];
        let forward = max_gap_days(&entries);
        entries.reverse();
        assert_eq!(forward, 7);
        assert_eq!(max_gap_days(&entries), forward);
        assert_eq!(max_gap_days(&entries[..1]), 0);
    }

    #[test]
    fn daily_buckets_cover_last_seven_days_oldest_first() {
        let now = at(T + 12 * HOUR_MS);
        let entries = vec![
            entry(T + HOUR_MS, 5, 4, Outcome::No, &[]),
            entry(T + 2 * HOUR_MS, 5, 2, Outcome::No, &[]),
            entry(T - 6 * DAY_MS, 5, 5, Outcome::No, &[]),
            entry(T - 7 * DAY_MS, 5, 1, Outcome::No, &[]),
        ];
        let buckets = daily_buckets(&entries, &now, CHART_DAYS);
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].date, NaiveDate::from_ymd_opt(2024, 5, 26).unwrap());
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[0].avg_intensity, 5.0);
        assert_eq!(buckets[6].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(buckets[6].count, 2);
        assert_eq!(buckets[6].avg_intensity, 3.0);
        assert_eq!(buckets[3].count, 0);
    }

    #[test]
    fn calendar_buckets_follow_time_zone() {
        // 23:30 UTC on May 31 is already June 1 at UTC+2.
        let late = vec![entry(T - 30 * 60_000, 5, 3, Outcome::No, &[])];
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();

        let utc_month = month_stats(&late, &at(T));
        assert_eq!(utc_month.total_sessions, 0);

        let local_month = month_stats(&late, &at(T).with_timezone(&plus_two));
        assert_eq!(local_month.total_sessions, 1);

        let buckets = time_of_day(&late, &plus_two);
        assert_eq!(buckets[0], 1);
        assert_eq!(time_of_day(&late, &Utc)[11], 1);
    }

    #[test]
    fn month_stats_sums_and_sorts() {
        let entries = vec![
            entry(T + DAY_MS, 10, 2, Outcome::No, &[]),
            entry(T + 5 * DAY_MS, 20, 3, Outcome::No, &[]),
            entry(T - DAY_MS, 99, 5, Outcome::No, &[]),
        ];
        let month = month_stats(&entries, &at(T + 10 * DAY_MS));
        assert_eq!((month.year, month.month), (2024, 6));
        assert_eq!(month.total_sessions, 2);
        assert_eq!(month.total_duration, 30);
        assert_eq!(month.avg_intensity, 2.5);
        assert_eq!(month.entries[0].timestamp, T + 5 * DAY_MS);
    }

    #[test]
    fn time_of_day_uses_two_hour_windows() {
        let entries = vec![
            entry(T + HOUR_MS, 5, 3, Outcome::No, &[]),
            entry(T + 13 * HOUR_MS, 5, 3, Outcome::No, &[]),
            entry(T + 12 * HOUR_MS, 5, 3, Outcome::No, &[]),
        ];
        let buckets = time_of_day(&entries, &Utc);
        assert_eq!(buckets[0], 1);
        assert_eq!(buckets[6], 2);
        assert_eq!(buckets.iter().sum::<usize>(), 3);
    }

    #[test]
    fn tag_ranking_orders_by_mean_intensity() {
        let entries = vec![
            entry(T, 5, 5, Outcome::No, &["a"]),
            entry(T + 1, 5, 3, Outcome::No, &["a"]),
            entry(T + 2, 5, 1, Outcome::No, &["b"]),
        ];
        let ranking = tag_ranking(&entries, TOP_TAGS);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].tag, "a");
        assert_eq!(ranking[0].avg_intensity, 4.0);
        assert_eq!(ranking[0].count, 2);
        assert_eq!(ranking[1].tag, "b");
        assert_eq!(ranking[1].avg_intensity, 1.0);
    }

    #[test]
    fn tag_ranking_truncates_and_counts_each_entry_once() {
        let entries = vec![
            entry(T, 5, 2, Outcome::No, &["a", "b", "c", "d", "e", "f", "a"]),
            entry(T + 1, 5, 4, Outcome::No, &["f"]),
        ];
        let ranking = tag_ranking(&entries, 5);
        assert_eq!(ranking.len(), 5);
        assert_eq!(ranking[0].tag, "f");
        assert_eq!(ranking[0].count, 2);
        let a = ranking.iter().find(|t| t.tag == "a").unwrap();
        assert_eq!(a.count, 1);
    }

    #[test]
    fn streak_counts_sessions_and_resets_on_two_day_gap() {
        let entries = vec![
            entry(T, 5, 3, Outcome::No, &[]),
            entry(T + DAY_MS, 5, 3, Outcome::No, &[]),
            entry(T + DAY_MS + HOUR_MS, 5, 3, Outcome::No, &[]),
            entry(T + 4 * DAY_MS, 5, 3, Outcome::No, &[]),
            entry(T + 5 * DAY_MS, 5, 3, Outcome::No, &[]),
        ];
        assert_eq!(longest_streak(&entries), 3);
        assert_eq!(longest_streak(&entries[..1]), 1);

        let exactly_two = vec![
            entry(T, 5, 3, Outcome::No, &[]),
            entry(T + 2 * DAY_MS, 5, 3, Outcome::No, &[]),
        ];
        assert_eq!(longest_streak(&exactly_two), 1);
    }

    #[test]
    fn interval_skips_same_sitting_pairs() {
        let entries = vec![
            entry(T, 5, 3, Outcome::No, &[]),
            entry(T + HOUR_MS, 5, 3, Outcome::No, &[]),
            entry(T + 2 * DAY_MS + HOUR_MS, 5, 3, Outcome::No, &[]),
            entry(T + 6 * DAY_MS + HOUR_MS, 5, 3, Outcome::No, &[]),
        ];
        assert_eq!(average_interval_days(&entries), 3.0);
        assert_eq!(average_interval_days(&entries[..2]), 0.0);
    }

    #[test]
    fn edging_rate_is_rounded_percentage() {
        let entries = vec![
            entry(T, 5, 3, Outcome::Edging, &[]),
            entry(T + 1, 5, 3, Outcome::No, &[]),
            entry(T + 2, 5, 3, Outcome::Yes, &[]),
        ];
        assert_eq!(edging_rate(&entries), 33);
    }

    #[test]
    fn trend_keeps_latest_sessions_in_order() {
        let entries: Vec<Entry> = (0..25)
            .rev()
            .map(|i| entry(T + i * DAY_MS, (i + 1) as u32, 3, Outcome::No, &[]))
            .collect();
        let trend = trend(&entries, &Utc, TREND_LENGTH);
        assert_eq!(trend.points.len(), 20);
        assert_eq!(trend.points[0].duration, 6);
        assert_eq!(trend.points[19].duration, 25);
        assert_eq!(trend.avg_duration, 13);
        assert_eq!(trend.avg_intensity, 3.0);
    }
}
