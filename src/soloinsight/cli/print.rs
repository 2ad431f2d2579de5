use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use soloinsight::achievements::AchievementStatus;
use soloinsight::api::{CmdMessage, MessageLevel};
use soloinsight::config::{InsightConfig, TimeZonePolicy};
use soloinsight::model::{ContentItem, Entry, Outcome};
use soloinsight::stats::{DashboardStats, DeepInsights, MonthStats, TIME_OF_DAY_BUCKETS};
use serde::Serialize;
use soloinsight::error::Result;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const ID_WIDTH: usize = 8;
const BAR_WIDTH: usize = 30;
const FAVORITE_MARKER: &str = "★";

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

/// JSON mode keeps stdout for the payload.
pub(super) fn eprint_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info | MessageLevel::Success => eprintln!("{}", message.content),
            MessageLevel::Warning => eprintln!("warning: {}", message.content),
            MessageLevel::Error => eprintln!("error: {}", message.content),
        }
    }
}

pub(super) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(super) fn print_entries(entries: &[Entry], tz: TimeZonePolicy) {
    if entries.is_empty() {
        println!("No sessions logged.");
        return;
    }

    for entry in entries {
        let id = short_id(&entry.id);
        let when = format_when(entry.timestamp, tz, "%Y-%m-%d %H:%M");
        let stats = format!("{:>4}m  {}", entry.duration, intensity_dots(entry.intensity));
        let outcome = format!("{:<6}", entry.outcome.to_string());
        let outcome = match entry.outcome {
            Outcome::Yes => outcome.green(),
            Outcome::No => outcome.normal(),
            Outcome::Edging => outcome.yellow(),
        };

        let mut detail = entry.tags.join(", ");
        if !entry.note.is_empty() {
            if !detail.is_empty() {
                detail.push_str("  ");
            }
            detail.push_str(&entry.note.replace('\n', " "));
        }

        let fixed = ID_WIDTH + 2 + when.width() + 2 + stats.width() + 2 + 6 + 2 + TIME_WIDTH;
        let available = LINE_WIDTH.saturating_sub(fixed);
        let detail = truncate_to_width(&detail, available);
        let padding = available.saturating_sub(detail.width());

        println!(
            "{}  {}  {}  {}  {}{}{}",
            id.yellow(),
            when,
            stats,
            outcome,
            detail.dimmed(),
            " ".repeat(padding),
            format_time_ago(entry.occurred_at()).dimmed()
        );
    }
}

pub(super) fn print_dashboard(stats: &DashboardStats) {
    println!("{}", "Last 30 days".bold());
    println!("  Sessions        {:>6}", stats.count_30);
    println!("  Avg duration    {:>5}m", stats.avg_duration);
    println!("  Avg intensity   {:>6.1}", stats.avg_intensity);
    println!("  Outcome rate    {:>5}%", stats.outcome_rate);
    println!();
    println!("  Sessions (90d)  {:>6}", stats.count_90);
    println!("  Longest gap     {:>5}d", stats.max_gap_days);
    if let Some(last) = &stats.last_session {
        println!(
            "  Last session    {}",
            format_time_ago(last.occurred_at()).trim_start()
        );
    }

    println!();
    println!("{}", "Last 7 days".bold());
    let max = stats.last_7_days.iter().map(|b| b.count).max().unwrap_or(0);
    for bucket in &stats.last_7_days {
        println!(
            "  {}  {} {}",
            bucket.date.format("%a %m-%d"),
            bar(bucket.count, max, 10).cyan(),
            if bucket.count > 0 {
                format!("{} ({:.1})", bucket.count, bucket.avg_intensity)
            } else {
                String::new()
            }
            .dimmed()
        );
    }
}

pub(super) fn print_month(month: &MonthStats, tz: TimeZonePolicy) {
    println!("{}", format!("{}-{:02}", month.year, month.month).bold());
    println!("  Sessions        {:>6}", month.total_sessions);
    println!("  Total duration  {:>5}m", month.total_duration);
    println!("  Avg intensity   {:>6.1}", month.avg_intensity);
    if !month.entries.is_empty() {
        println!();
        print_entries(&month.entries, tz);
    }
}

pub(super) fn print_insights(insights: &DeepInsights) {
    println!("{}", "Time of day".bold());
    let max = insights.time_of_day.iter().copied().max().unwrap_or(0);
    for (slot, count) in insights.time_of_day.iter().enumerate() {
        let start = slot * 24 / TIME_OF_DAY_BUCKETS;
        println!(
            "  {:02}:00-{:02}:59  {} {}",
            start,
            start + 1,
            bar(*count, max, BAR_WIDTH).magenta(),
            if *count > 0 { count.to_string() } else { String::new() }.dimmed()
        );
    }

    println!();
    println!("{}", "Top tags by intensity".bold());
    if insights.top_tags.is_empty() {
        println!("  {}", "No tagged sessions yet.".dimmed());
    }
    for (rank, tag) in insights.top_tags.iter().enumerate() {
        println!(
            "  {}. {:<20} {:.1}  {}",
            rank + 1,
            truncate_to_width(&tag.tag, 20),
            tag.avg_intensity,
            format!("({} sessions)", tag.count).dimmed()
        );
    }

    println!();
    println!("{}", "Habits".bold());
    println!("  Longest streak  {:>6} sessions", insights.longest_streak);
    println!("  Avg interval    {:>6.1} days", insights.avg_interval_days);
    println!("  Edging rate     {:>5}%", insights.edging_rate);

    let trend = &insights.trend;
    if !trend.points.is_empty() {
        println!();
        println!(
            "{}  {}",
            "Trend".bold(),
            format!(
                "(all-time avg {}m, intensity {:.1})",
                trend.avg_duration, trend.avg_intensity
            )
            .dimmed()
        );
        let max = trend.points.iter().map(|p| p.duration as usize).max().unwrap_or(0);
        for point in &trend.points {
            println!(
                "  {}  {} {}m {}",
                point.date.format("%m-%d"),
                bar(point.duration as usize, max, BAR_WIDTH).blue(),
                point.duration,
                intensity_dots(point.intensity).dimmed()
            );
        }
    }
}

pub(super) fn print_achievements(statuses: &[AchievementStatus]) {
    for status in statuses {
        match status.unlocked_at {
            Some(at) => println!(
                "  {} {:<16} {}  {}",
                "✓".green(),
                status.title.green(),
                status.description,
                DateTime::from_timestamp_millis(at)
                    .map(format_time_ago)
                    .unwrap_or_default()
                    .trim_start()
                    .dimmed()
            ),
            None => println!(
                "  {} {:<16} {}",
                "·".dimmed(),
                status.title.dimmed(),
                status.description.dimmed()
            ),
        }
    }
}

pub(super) fn print_tags(tags: &[String]) {
    for tag in tags {
        println!("  {}", tag);
    }
}

pub(super) fn print_library(items: &[ContentItem]) {
    if items.is_empty() {
        println!("No library items.");
        return;
    }
    for item in items {
        let star = if item.is_favorite {
            FAVORITE_MARKER.yellow()
        } else {
            " ".normal()
        };
        let mut detail = Vec::new();
        if let Some(actor) = &item.actor {
            if item.title.is_some() {
                detail.push(actor.as_str());
            }
        }
        if let Some(url) = &item.url {
            if item.title.is_some() || item.actor.is_some() {
                detail.push(url.as_str());
            }
        }
        let available = LINE_WIDTH.saturating_sub(ID_WIDTH + 4);
        let label = truncate_to_width(item.label(), available / 2);
        let rest = truncate_to_width(&detail.join("  "), available.saturating_sub(label.width() + 2));
        println!("{} {}  {}  {}", star, short_id(&item.id).yellow(), label.bold(), rest.dimmed());
    }
}

pub(super) fn print_config(config: &InsightConfig) {
    for key in InsightConfig::KEYS {
        println!("{} = {}", key, config.get(key).unwrap_or_default());
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(ID_WIDTH).collect()
}

fn intensity_dots(intensity: u8) -> String {
    let filled = usize::from(intensity.min(5));
    format!("{}{}", "●".repeat(filled), "○".repeat(5 - filled))
}

fn bar(value: usize, max: usize, width: usize) -> String {
    if max == 0 || value == 0 {
        return String::new();
    }
    let len = (value * width).div_ceil(max);
    "█".repeat(len.max(1))
}

fn format_when(timestamp: i64, tz: TimeZonePolicy, fmt: &str) -> String {
    let Some(utc) = DateTime::from_timestamp_millis(timestamp) else {
        return "?".to_string();
    };
    match tz {
        TimeZonePolicy::Local => utc.with_timezone(&Local).format(fmt).to_string(),
        TimeZonePolicy::Utc => utc.format(fmt).to_string(),
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(timestamp);

    let formatter = Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());

    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
