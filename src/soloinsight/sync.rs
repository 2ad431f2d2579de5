//! # Local to Cloud Merge
//!
//! Runs once, on first successful authentication, to carry local-only data into
//! the user's cloud document.
//!
//! - **No document yet**: the document is created straight from the local
//!   snapshot (every field). After that the cloud is the only source of truth.
//! - **Existing document**: only `entries`, `library` and `tags` are merged.
//!   Entries and library items are de-duplicated by id: remote order is kept,
//!   local items with unseen ids are appended, and on an id collision the
//!   remote version wins untouched. Tags are an ordered set union, remote
//!   first. Achievements, access gate state and language stay as the cloud has
//!   them.
//!
//! The three merged fields are written one at a time. If a write fails midway
//! the document is left partially merged and the error is returned.

use crate::model::{AppData, Identified};
use crate::store::remote::{DocumentStore, SyncError, UserDocument, UserId};
use crate::store::Slot;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// The document did not exist and was seeded from local data.
    pub created: bool,
    /// Something new was found and written back.
    pub updated: bool,
    pub entries_added: usize,
    pub library_added: usize,
    pub tags_added: usize,
}

/// Appends local items whose id is not already present remotely.
/// Returns the merged collection and how many items were appended.
pub fn merge_by_id<T: Identified + Clone>(remote: &[T], local: &[T]) -> (Vec<T>, usize) {
    let mut seen: HashSet<&str> = remote.iter().map(Identified::id).collect();
    let mut merged = remote.to_vec();
    let mut added = 0;
    for item in local {
        if seen.insert(item.id()) {
            merged.push(item.clone());
            added += 1;
        }
    }
    (merged, added)
}

/// Ordered set union: remote tags first, then unseen local ones.
pub fn merge_tags(remote: &[String], local: &[String]) -> (Vec<String>, usize) {
    let mut merged: Vec<String> = Vec::with_capacity(remote.len() + local.len());
    for tag in remote {
        if !merged.contains(tag) {
            merged.push(tag.clone());
        }
    }
    let before = merged.len();
    for tag in local {
        if !merged.contains(tag) {
            merged.push(tag.clone());
        }
    }
    let added = merged.len() - before;
    (merged, added)
}

/// Reconcile a local snapshot with the user's cloud document.
pub fn merge_local_into_cloud<D: DocumentStore>(
    docs: &mut D,
    user: &UserId,
    local: &AppData,
    now_ms: i64,
) -> Result<MergeReport, SyncError> {
    let Some(remote) = docs.fetch(user)? else {
        tracing::info!(
            "No cloud document for {}; seeding it with {} local entries",
            user,
            local.entries.len()
        );
        docs.create(user, UserDocument::from_app_data(local, now_ms))?;
        return Ok(MergeReport {
            created: true,
            updated: true,
            entries_added: local.entries.len(),
            library_added: local.library.len(),
            tags_added: local.tags.len(),
        });
    };

    let (entries, entries_added) = merge_by_id(&remote.entries, &local.entries);
    let (library, library_added) = merge_by_id(&remote.library, &local.library);
    let (tags, tags_added) = merge_tags(&remote.tags, &local.tags);

    let mut report = MergeReport {
        created: false,
        updated: false,
        entries_added,
        library_added,
        tags_added,
    };

    if entries_added == 0 && library_added == 0 {
        tracing::info!("Cloud document for {} already has all local data", user);
        report.tags_added = 0;
        return Ok(report);
    }

    tracing::info!(
        "Merging into cloud for {}: {} entries, {} library items, {} tags",
        user,
        entries_added,
        library_added,
        tags_added
    );
    write_field(docs, user, Slot::Entries, &entries)?;
    write_field(docs, user, Slot::Library, &library)?;
    write_field(docs, user, Slot::Tags, &tags)?;
    report.updated = true;
    Ok(report)
}

fn write_field<D: DocumentStore, T: serde::Serialize>(
    docs: &mut D,
    user: &UserId,
    slot: Slot,
    value: &T,
) -> Result<(), SyncError> {
    let value = serde_json::to_value(value)
        .map_err(|e| SyncError::Corrupt(user.to_string(), e.to_string()))?;
    docs.update_field(user, slot, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentItem, Entry, Outcome};
    use crate::store::remote_memory::MemDocumentStore;

    fn entry(id: &str, duration: u32) -> Entry {
        Entry {
            id: id.into(),
            timestamp: 0,
            duration,
            intensity: 3,
            outcome: Outcome::No,
            tags: vec![],
            note: String::new(),
            linked_content: None,
            photo_data: None,
        }
    }

    fn user() -> UserId {
        UserId::new("u")
    }

    #[test]
    fn merge_by_id_keeps_remote_on_collision() {
        let remote = vec![entry("x", 10), entry("y", 11)];
        let local = vec![entry("x", 99), entry("z", 12)];
        let (merged, added) = merge_by_id(&remote, &local);

        assert_eq!(added, 1);
        let ids: Vec<_> = merged.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
        assert_eq!(merged[0].duration, 10);
    }

    #[test]
    fn merged_length_is_remote_plus_unseen_local() {
        let remote = vec![entry("a", 1), entry("b", 1), entry("c", 1)];
        let local = vec![entry("b", 1), entry("d", 1), entry("e", 1), entry("a", 1)];
        let (merged, _) = merge_by_id(&remote, &local);
        assert_eq!(merged.len(), 3 + 2);
    }

    #[test]
    fn merge_tags_is_ordered_union() {
        let remote = vec!["a".to_string(), "b".to_string()];
        let local = vec!["b".to_string(), "c".to_string()];
        let (merged, added) = merge_tags(&remote, &local);
        assert_eq!(merged, vec!["a", "b", "c"]);
        assert_eq!(added, 1);
    }

    #[test]
    fn missing_document_is_seeded_from_local() {
        let mut docs = MemDocumentStore::new();
        let mut local = AppData::default();
        local.entries.push(entry("l1", 5));
        local.achievements.insert("first_log".into(), 123);

        let report = merge_local_into_cloud(&mut docs, &user(), &local, 1000).unwrap();
        assert!(report.created);

        let doc = docs.snapshot(&user()).unwrap();
        assert_eq!(doc.entries.len(), 1);
        assert_eq!(doc.achievements.get("first_log"), Some(&123));
        assert_eq!(doc.created_at, 1000);
    }

    #[test]
    fn existing_document_keeps_its_achievements() {
        let mut docs = MemDocumentStore::new();
        let mut remote = AppData::default();
        remote.entries.push(entry("r1", 5));
        docs.create(&user(), UserDocument::from_app_data(&remote, 1))
            .unwrap();

        let mut local = AppData::default();
        local.entries.push(entry("r1", 50));
        local.entries.push(entry("l1", 6));
        local.tags.push("Custom".into());
        local.achievements.insert("marathon".into(), 5);
        local.library.push(ContentItem::new(None, Some("someone".into()), None));

        let report = merge_local_into_cloud(&mut docs, &user(), &local, 2).unwrap();
        assert!(!report.created);
        assert!(report.updated);
        assert_eq!(report.entries_added, 1);
        assert_eq!(report.library_added, 1);
        assert_eq!(report.tags_added, 1);

        let doc = docs.snapshot(&user()).unwrap();
        assert_eq!(doc.entries.len(), 2);
        assert_eq!(doc.entries[0].duration, 5);
        assert!(doc.achievements.is_empty());
        assert!(doc.tags.contains(&"Custom".to_string()));
        assert_eq!(doc.library.len(), 1);
    }

    #[test]
    fn nothing_new_means_no_write() {
        let mut docs = MemDocumentStore::new();
        let mut data = AppData::default();
        data.entries.push(entry("same", 5));
        docs.create(&user(), UserDocument::from_app_data(&data, 1))
            .unwrap();
        let writes = docs.write_count();

        data.tags.push("Only tags differ".into());
        let report = merge_local_into_cloud(&mut docs, &user(), &data, 2).unwrap();
        assert!(!report.updated);
        assert_eq!(docs.write_count(), writes);
    }

    #[test]
    fn offline_merge_surfaces_sync_error() {
        let mut docs = MemDocumentStore::new();
        docs.set_offline(true);
        let err = merge_local_into_cloud(&mut docs, &user(), &AppData::default(), 0).unwrap_err();
        assert!(matches!(err, SyncError::Unavailable(_)));
    }
}
