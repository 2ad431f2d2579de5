//! Milestones unlocked by the entry history.
//!
//! Each [`Achievement`] is a pure predicate over the full entry list. An
//! achievement moves from locked to unlocked once and never back: deleting
//! entries later does not re-lock it. Only a full data wipe clears the map.

use crate::model::{Entry, Language, UnlockMap};
use serde::Serialize;
use std::collections::HashSet;

pub struct Achievement {
    pub id: &'static str,
    title: [&'static str; 2],
    description: [&'static str; 2],
    predicate: fn(&[Entry]) -> bool,
}

impl Achievement {
    pub fn title(&self, language: Language) -> &'static str {
        self.title[lang_index(language)]
    }

    pub fn description(&self, language: Language) -> &'static str {
        self.description[lang_index(language)]
    }

    pub fn is_met(&self, entries: &[Entry]) -> bool {
        (self.predicate)(entries)
    }
}

impl std::fmt::Debug for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Achievement").field("id", &self.id).finish()
    }
}

fn lang_index(language: Language) -> usize {
    match language {
        Language::En => 0,
        Language::Zh => 1,
    }
}

pub const MARATHON_MINUTES: u32 = 30;
pub const EXPLORER_TAGS: usize = 5;

fn distinct_tags(entries: &[Entry]) -> usize {
    entries
        .iter()
        .flat_map(|e| e.tags.iter())
        .collect::<HashSet<_>>()
        .len()
}

fn has_any(entries: &[Entry]) -> bool {
    !entries.is_empty()
}

fn has_seven(entries: &[Entry]) -> bool {
    entries.len() >= 7
}

fn has_varied_tags(entries: &[Entry]) -> bool {
    distinct_tags(entries) >= EXPLORER_TAGS
}

fn has_marathon(entries: &[Entry]) -> bool {
    entries.iter().any(|e| e.duration > MARATHON_MINUTES)
}

pub static ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "first_log",
        title: ["First Step", "第一步"],
        description: ["Log your first session", "记录第一次"],
        predicate: has_any,
    },
    Achievement {
        id: "week_streak",
        title: ["Habit Forming", "习惯养成"],
        description: ["Log 7 sessions", "累计记录 7 次"],
        predicate: has_seven,
    },
    Achievement {
        id: "explorer",
        title: ["Explorer", "探索者"],
        description: ["Use 5 different tags", "使用 5 个不同的标签"],
        predicate: has_varied_tags,
    },
    Achievement {
        id: "marathon",
        title: ["Marathon", "马拉松"],
        description: ["A session longer than 30 minutes", "单次超过 30 分钟"],
        predicate: has_marathon,
    },
];

pub fn find(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Unlock every locked achievement whose predicate now holds, stamping it
/// with `now_ms`. Returns the newly unlocked ones; already unlocked entries
/// in `unlocked` are never touched.
pub fn evaluate(entries: &[Entry], unlocked: &mut UnlockMap, now_ms: i64) -> Vec<&'static Achievement> {
    let mut fresh = Vec::new();
    for achievement in ACHIEVEMENTS {
        if unlocked.contains_key(achievement.id) || !achievement.is_met(entries) {
            continue;
        }
        unlocked.insert(achievement.id.to_string(), now_ms);
        tracing::info!("Achievement unlocked: {}", achievement.id);
        fresh.push(achievement);
    }
    fresh
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStatus {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub unlocked_at: Option<i64>,
}

/// Every achievement in display order, with its unlock time if any.
pub fn statuses(unlocked: &UnlockMap, language: Language) -> Vec<AchievementStatus> {
    ACHIEVEMENTS
        .iter()
        .map(|a| AchievementStatus {
            id: a.id,
            title: a.title(language),
            description: a.description(language),
            unlocked_at: unlocked.get(a.id).copied(),
        })
        .collect()
}
