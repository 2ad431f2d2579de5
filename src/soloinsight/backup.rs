//! # Backup Files
//!
//! A backup is one JSON object holding every collection plus a small header:
//!
//! ```json
//! {
//!   "entries": [...], "tags": [...], "achievements": {...},
//!   "library": [...], "aiAccess": {...}, "language": "en",
//!   "version": 2, "backupDate": "2024-06-01T12:00:00+00:00", "platform": "cli"
//! }
//! ```
//!
//! Import is lenient field by field: a missing or unreadable field is skipped
//! and the current value kept. The file is rejected outright when it is not
//! JSON or when neither `entries` nor `tags` can be read from it.

use crate::error::{InsightError, Result};
use crate::model::{AiAccessState, AppData, ContentItem, Entry, Language, UnlockMap};
use crate::store::Slot;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

pub const BACKUP_VERSION: u32 = 2;
pub const PLATFORM: &str = "cli";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BackupFile<'a> {
    entries: &'a [Entry],
    tags: &'a [String],
    achievements: &'a UnlockMap,
    library: &'a [ContentItem],
    ai_access: AiAccessState,
    language: Language,
    version: u32,
    backup_date: String,
    platform: &'static str,
}

/// Serialize the whole data set as a backup file.
pub fn export(data: &AppData, now: DateTime<Utc>) -> Result<String> {
    let file = BackupFile {
        entries: &data.entries,
        tags: &data.tags,
        achievements: &data.achievements,
        library: &data.library,
        ai_access: data.ai_access,
        language: data.language,
        version: BACKUP_VERSION,
        backup_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        platform: PLATFORM,
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Suggested file name for a backup taken at `now`.
pub fn file_name(now: DateTime<Utc>) -> String {
    format!("solo-insight-backup-{}.json", now.format("%Y-%m-%d"))
}

/// The readable parts of a backup file, not yet applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Restore {
    pub entries: Option<Vec<Entry>>,
    pub tags: Option<Vec<String>>,
    pub achievements: Option<UnlockMap>,
    pub library: Option<Vec<ContentItem>>,
    pub ai_access: Option<AiAccessState>,
    pub language: Option<Language>,
    /// Fields that were present but could not be read.
    pub skipped: Vec<&'static str>,
}

impl Restore {
    pub fn entry_count(&self) -> usize {
        self.entries.as_ref().map_or(0, Vec::len)
    }

    /// Overwrite each collection the backup carries. Returns the slots that
    /// changed, in the order they should be persisted.
    pub fn apply(self, data: &mut AppData) -> Vec<Slot> {
        let mut slots = Vec::new();
        if let Some(entries) = self.entries {
            data.entries = entries;
            slots.push(Slot::Entries);
        }
        if let Some(tags) = self.tags {
            data.tags = tags;
            slots.push(Slot::Tags);
        }
        if let Some(achievements) = self.achievements {
            data.achievements = achievements;
            slots.push(Slot::Achievements);
        }
        if let Some(library) = self.library {
            data.library = library;
            slots.push(Slot::Library);
        }
        if let Some(ai_access) = self.ai_access {
            data.ai_access = ai_access;
            slots.push(Slot::AiAccess);
        }
        if let Some(language) = self.language {
            data.language = language;
            slots.push(Slot::Language);
        }
        slots
    }
}

/// Read a backup file without applying it.
pub fn parse(json: &str) -> Result<Restore> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| InsightError::Backup(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(InsightError::Backup("expected a JSON object".into()));
    };

    let mut restore = Restore::default();
    restore.entries = field(&fields, "entries", &mut restore.skipped);
    restore.tags = field(&fields, "tags", &mut restore.skipped);
    restore.achievements = field(&fields, "achievements", &mut restore.skipped);
    restore.library = field(&fields, "library", &mut restore.skipped);
    restore.ai_access = field(&fields, "aiAccess", &mut restore.skipped);
    restore.language = field(&fields, "language", &mut restore.skipped);

    if restore.entries.is_none() && restore.tags.is_none() {
        return Err(InsightError::Backup(
            "no entries or tags found in file".into(),
        ));
    }
    if let Some(version) = fields.get("version").and_then(Value::as_u64) {
        if version > u64::from(BACKUP_VERSION) {
            tracing::warn!("Backup version {} is newer than {}", version, BACKUP_VERSION);
        }
    }
    Ok(restore)
}

fn field<T: DeserializeOwned>(
    fields: &Map<String, Value>,
    name: &'static str,
    skipped: &mut Vec<&'static str>,
) -> Option<T> {
    let value = fields.get(name).filter(|v| !v.is_null())?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Skipping unreadable backup field {}: {}", name, e);
            skipped.push(name);
            None
        }
    }
}
