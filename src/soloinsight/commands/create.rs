use crate::commands::helpers::{persist_or_warn, refresh_achievements, resolve_id};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{InsightError, Result};
use crate::model::EntryDraft;
use crate::store::{DataStore, Slot};
use crate::workspace::Workspace;

/// Log a new entry.
///
/// `from_library` selects a library item whose url and actor are copied onto
/// the entry; the item's `last_used_at` is bumped.
pub fn run<S: DataStore>(
    ws: &mut Workspace<S>,
    mut draft: EntryDraft,
    from_library: Option<&str>,
    now_ms: i64,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    let used_item = match from_library {
        Some(selector) => {
            let pos = resolve_id(&ws.data().library, selector)?
                .ok_or_else(|| InsightError::ItemNotFound(selector.to_string()))?;
            draft.linked_content = Some(ws.data().library[pos].as_linked_content());
            Some(pos)
        }
        None => None,
    };

    let entry = draft.into_entry()?;
    ws.data_mut().entries.push(entry.clone());
    tracing::debug!("Logged entry {}", entry.id);
    persist_or_warn(ws, Slot::Entries, &mut result);

    if let Some(pos) = used_item {
        ws.data_mut().library[pos].last_used_at = Some(now_ms);
        persist_or_warn(ws, Slot::Library, &mut result);
    }

    result.add_message(CmdMessage::success(format!(
        "Logged {} min, intensity {}, {}",
        entry.duration, entry.intensity, entry.outcome
    )));
    refresh_achievements(ws, now_ms, &mut result);
    Ok(result.with_affected_entries(vec![entry]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentItem, Outcome};
    use crate::store::local::LocalStore;
    use crate::store::memory::MemBackend;

    fn workspace() -> Workspace<LocalStore<MemBackend>> {
        Workspace::open(LocalStore::new(MemBackend::new())).unwrap()
    }

    #[test]
    fn appends_and_persists() {
        let mut ws = workspace();
        let result = run(&mut ws, EntryDraft::new(10, 15, 3, Outcome::No), None, 10).unwrap();
        assert_eq!(result.affected_entries.len(), 1);
        assert_eq!(ws.entries().len(), 1);

        let (store, _) = ws.into_parts();
        let reopened = Workspace::open(store).unwrap();
        assert_eq!(reopened.entries()[0].duration, 15);
    }

    #[test]
    fn invalid_draft_changes_nothing() {
        let mut ws = workspace();
        let err = run(&mut ws, EntryDraft::new(10, 0, 3, Outcome::No), None, 10);
        assert!(matches!(err, Err(InsightError::Validation(_))));
        assert!(ws.entries().is_empty());
        assert!(ws.data().achievements.is_empty());
    }

    #[test]
    fn first_entry_unlocks_first_log() {
        let mut ws = workspace();
        let result = run(&mut ws, EntryDraft::new(10, 45, 5, Outcome::Yes), None, 77).unwrap();
        assert_eq!(result.unlocked, vec!["first_log", "marathon"]);
        assert_eq!(ws.data().achievements.get("first_log"), Some(&77));
    }

    #[test]
    fn links_library_item_by_snapshot() {
        let mut ws = workspace();
        let item = ContentItem::new(Some("example.com/v".into()), Some("someone".into()), None);
        let id = item.id.clone();
        ws.data_mut().library.push(item);

        let result = run(&mut ws, EntryDraft::new(10, 5, 3, Outcome::No), Some(&id), 99).unwrap();
        let linked = result.affected_entries[0].linked_content.clone().unwrap();
        assert_eq!(linked.actor.as_deref(), Some("someone"));
        assert_eq!(ws.data().library[0].last_used_at, Some(99));

        let missing = run(&mut ws, EntryDraft::new(10, 5, 3, Outcome::No), Some("nope-nope"), 99);
        assert!(matches!(missing, Err(InsightError::ItemNotFound(_))));
    }
}
