//! Core data types.
//!
//! JSON field names follow the persisted schema (camelCase, with the legacy
//! `orgasm` and `contentUsed` keys on entries) so that existing local slots,
//! cloud documents and backup files round-trip unchanged.

use crate::error::{InsightError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const NOTE_MAX_CHARS: usize = 500;
pub const MIN_DURATION: u32 = 1;
pub const INTENSITY_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

pub const DEFAULT_TAGS: &[&str] = &[
    "Relaxation",
    "Stress Relief",
    "Imagination",
    "Toy",
    "Visual Content",
    "Audio",
    "Tired",
    "Energetic",
];

pub fn default_tags() -> Vec<String> {
    DEFAULT_TAGS.iter().map(|t| t.to_string()).collect()
}

/// Achievement id -> unlock time (ms since epoch). Absent means locked.
pub type UnlockMap = BTreeMap<String, i64>;

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Anything stored in a collection that is de-duplicated by id.
pub trait Identified {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Yes,
    No,
    Edging,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Yes => write!(f, "YES"),
            Outcome::No => write!(f, "NO"),
            Outcome::Edging => write!(f, "EDGING"),
        }
    }
}

impl std::str::FromStr for Outcome {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "YES" | "Y" => Ok(Outcome::Yes),
            "NO" | "N" => Ok(Outcome::No),
            "EDGING" | "E" => Ok(Outcome::Edging),
            other => Err(InsightError::Validation(format!(
                "Unknown outcome '{}' (expected yes, no or edging)",
                other
            ))),
        }
    }
}

/// Snapshot of the content used during a session. Not a reference: later
/// edits to the library item do not touch it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

impl LinkedContent {
    pub fn is_empty(&self) -> bool {
        self.url.as_deref().map_or(true, str::is_empty)
            && self.actor.as_deref().map_or(true, str::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub timestamp: i64,
    pub duration: u32,
    pub intensity: u8,
    #[serde(rename = "orgasm")]
    pub outcome: Outcome,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub note: String,
    #[serde(
        rename = "contentUsed",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub linked_content: Option<LinkedContent>,
    /// Attached image as a data URL. Carried through storage and backups as is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_data: Option<String>,
}

impl Entry {
    pub fn occurred_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.duration < MIN_DURATION {
            return Err(InsightError::Validation(format!(
                "Duration must be at least {} minute",
                MIN_DURATION
            )));
        }
        if !INTENSITY_RANGE.contains(&self.intensity) {
            return Err(InsightError::Validation(format!(
                "Intensity must be between {} and {}, got {}",
                INTENSITY_RANGE.start(),
                INTENSITY_RANGE.end(),
                self.intensity
            )));
        }
        Ok(())
    }

    /// Enforces the note cap and tag hygiene in place.
    pub fn normalize(&mut self) {
        self.note = truncate_note(&self.note);
        self.tags = normalize_tags(&self.tags);
        if self.linked_content.as_ref().is_some_and(LinkedContent::is_empty) {
            self.linked_content = None;
        }
    }
}

impl Identified for Entry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Everything needed to log an entry except its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub timestamp: i64,
    pub duration: u32,
    pub intensity: u8,
    pub outcome: Outcome,
    pub tags: Vec<String>,
    pub note: String,
    pub linked_content: Option<LinkedContent>,
}

impl EntryDraft {
    pub fn new(timestamp: i64, duration: u32, intensity: u8, outcome: Outcome) -> Self {
        Self {
            timestamp,
            duration,
            intensity,
            outcome,
            tags: Vec::new(),
            note: String::new(),
            linked_content: None,
        }
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_linked_content(mut self, content: LinkedContent) -> Self {
        self.linked_content = Some(content);
        self
    }

    /// Validates the draft and turns it into an entry with a fresh id.
    pub fn into_entry(self) -> Result<Entry> {
        let mut entry = Entry {
            id: new_id(),
            timestamp: self.timestamp,
            duration: self.duration,
            intensity: self.intensity,
            outcome: self.outcome,
            tags: self.tags,
            note: self.note,
            linked_content: self.linked_content,
            photo_data: None,
        };
        entry.validate()?;
        entry.normalize();
        Ok(entry)
    }
}

fn truncate_note(note: &str) -> String {
    if note.chars().count() <= NOTE_MAX_CHARS {
        note.to_string()
    } else {
        note.chars().take(NOTE_MAX_CHARS).collect()
    }
}

/// Trims names, drops empties and repeated names, keeps first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<i64>,
}

impl ContentItem {
    pub fn new(url: Option<String>, actor: Option<String>, title: Option<String>) -> Self {
        Self {
            id: new_id(),
            url: non_empty(url),
            actor: non_empty(actor),
            title: non_empty(title),
            is_favorite: false,
            created_at: now_millis(),
            last_used_at: None,
        }
    }

    pub fn has_content(&self) -> bool {
        self.url.is_some() || self.actor.is_some() || self.title.is_some()
    }

    /// Best label for display: title, then actor, then url.
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.actor.as_deref())
            .or(self.url.as_deref())
            .unwrap_or("")
    }

    /// Case-insensitive substring match over title, actor and url.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.title, &self.actor, &self.url]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term))
    }

    /// Url ready to hand to a browser; bare hosts get an https scheme.
    pub fn open_url(&self) -> Option<String> {
        let url = self.url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Some(url.to_string())
        } else {
            Some(format!("https://{}", url))
        }
    }

    pub fn as_linked_content(&self) -> LinkedContent {
        LinkedContent {
            url: self.url.clone(),
            actor: self.actor.clone(),
        }
    }
}

impl Identified for ContentItem {
    fn id(&self) -> &str {
        &self.id
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAccessState {
    pub unlocked: bool,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Zh => write!(f, "zh"),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "zh" => Ok(Language::Zh),
            other => Err(InsightError::Validation(format!(
                "Unsupported language '{}' (expected en or zh)",
                other
            ))),
        }
    }
}

/// The full per-user data set, as held in memory for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppData {
    pub entries: Vec<Entry>,
    pub tags: Vec<String>,
    pub achievements: UnlockMap,
    pub library: Vec<ContentItem>,
    pub ai_access: AiAccessState,
    pub language: Language,
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            tags: default_tags(),
            achievements: UnlockMap::new(),
            library: Vec::new(),
            ai_access: AiAccessState::default(),
            language: Language::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_rejects_out_of_range_values() {
        let zero = EntryDraft::new(0, 0, 3, Outcome::No).into_entry();
        assert!(matches!(zero, Err(InsightError::Validation(_))));

        let hot = EntryDraft::new(0, 10, 6, Outcome::No).into_entry();
        assert!(matches!(hot, Err(InsightError::Validation(_))));

        let cold = EntryDraft::new(0, 10, 0, Outcome::No).into_entry();
        assert!(cold.is_err());
    }

    #[test]
    fn draft_assigns_unique_ids() {
        let a = EntryDraft::new(0, 5, 3, Outcome::Yes).into_entry().unwrap();
        let b = EntryDraft::new(0, 5, 3, Outcome::Yes).into_entry().unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn note_is_capped() {
        let long = "x".repeat(NOTE_MAX_CHARS + 20);
        let entry = EntryDraft::new(0, 5, 3, Outcome::Yes)
            .with_note(long)
            .into_entry()
            .unwrap();
        assert_eq!(entry.note.chars().count(), NOTE_MAX_CHARS);
    }

    #[test]
    fn tags_are_deduplicated_in_order() {
        let entry = EntryDraft::new(0, 5, 3, Outcome::Yes)
            .with_tags(["Toy", " Audio ", "Toy", ""])
            .into_entry()
            .unwrap();
        assert_eq!(entry.tags, vec!["Toy", "Audio"]);
    }

    #[test]
    fn entry_uses_legacy_json_keys() {
        let entry = Entry {
            id: "e1".into(),
            timestamp: 1_700_000_000_000,
            duration: 12,
            intensity: 4,
            outcome: Outcome::Edging,
            tags: vec!["Audio".into()],
            note: String::new(),
            linked_content: Some(LinkedContent {
                url: Some("example.com".into()),
                actor: None,
            }),
            photo_data: Some("data:image/png;base64,AAAA".into()),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["orgasm"], "EDGING");
        assert_eq!(json["contentUsed"]["url"], "example.com");
        assert_eq!(json["photoData"], "data:image/png;base64,AAAA");
        assert!(json.get("outcome").is_none());
    }

    #[test]
    fn entry_tolerates_missing_optional_fields() {
        let raw = r#"{"id":"x","timestamp":5,"duration":3,"intensity":2,"orgasm":"NO"}"#;
        let entry: Entry = serde_json::from_str(raw).unwrap();
        assert!(entry.tags.is_empty());
        assert!(entry.linked_content.is_none());
        assert!(entry.photo_data.is_none());
        assert!(serde_json::to_value(&entry).unwrap().get("photoData").is_none());
    }

    #[test]
    fn content_item_search_is_case_insensitive() {
        let item = ContentItem::new(Some("Example.com/v".into()), None, Some("Evening".into()));
        assert!(item.matches("example"));
        assert!(item.matches("EVEN"));
        assert!(!item.matches("morning"));
        assert!(item.matches(""));
    }

    #[test]
    fn open_url_adds_scheme() {
        let bare = ContentItem::new(Some("example.com".into()), None, None);
        assert_eq!(bare.open_url().as_deref(), Some("https://example.com"));

        let full = ContentItem::new(Some("HTTP://example.com".into()), None, None);
        assert_eq!(full.open_url().as_deref(), Some("HTTP://example.com"));

        let none = ContentItem::new(None, Some("someone".into()), None);
        assert_eq!(none.open_url(), None);
    }

    #[test]
    fn language_parses_and_serializes_lowercase() {
        assert_eq!("ZH".parse::<Language>().unwrap(), Language::Zh);
        assert_eq!(serde_json::to_string(&Language::En).unwrap(), "\"en\"");
        assert!("fr".parse::<Language>().is_err());
    }
}
