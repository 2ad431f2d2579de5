use crate::commands::helpers::{persist_or_warn, position_of};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::{DataStore, Slot};
use crate::workspace::Workspace;

/// Remove the entry with exactly this id. Without `confirmed` nothing
/// happens; any other id is not an error and leaves the list as it was.
pub fn run<S: DataStore>(ws: &mut Workspace<S>, selector: &str, confirmed: bool) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if !confirmed {
        result.add_message(CmdMessage::info("Delete cancelled."));
        return Ok(result);
    }

    let Some(pos) = position_of(ws.entries(), selector) else {
        result.add_message(CmdMessage::info(format!("No entry matches {}", selector)));
        return Ok(result.with_listed_entries(ws.entries().to_vec()));
    };

    let removed = ws.data_mut().entries.remove(pos);
    tracing::debug!("Deleted entry {}", removed.id);
    persist_or_warn(ws, Slot::Entries, &mut result);
    result.add_message(CmdMessage::success(format!(
        "Deleted entry from {}",
        removed.occurred_at().format("%Y-%m-%d %H:%M")
    )));
    Ok(result
        .with_affected_entries(vec![removed])
        .with_listed_entries(ws.entries().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::create;
    use crate::model::{EntryDraft, Outcome};
    use crate::store::local::LocalStore;
    use crate::store::memory::MemBackend;

    fn workspace_with(n: usize) -> Workspace<LocalStore<MemBackend>> {
        let mut ws = Workspace::open(LocalStore::new(MemBackend::new())).unwrap();
        for i in 0..n {
            create::run(&mut ws, EntryDraft::new(i as i64, 5, 3, Outcome::No), None, 0).unwrap();
        }
        ws
    }

    #[test]
    fn unknown_id_leaves_list_unchanged() {
        let mut ws = workspace_with(3);
        let before = ws.entries().to_vec();
        let result = run(&mut ws, "does-not-exist", true).unwrap();
        assert_eq!(result.listed_entries, before);
        assert_eq!(ws.entries().len(), 3);
    }

    #[test]
    fn short_unknown_id_is_not_an_error() {
        let mut ws = workspace_with(3);
        let result = run(&mut ws, "x", true).unwrap();
        assert!(result.affected_entries.is_empty());
        assert_eq!(ws.entries().len(), 3);
    }

    #[test]
    fn prefix_of_a_real_id_deletes_nothing() {
        let mut ws = workspace_with(3);
        let prefix = ws.entries()[1].id[..8].to_string();
        let result = run(&mut ws, &prefix, true).unwrap();
        assert!(result.affected_entries.is_empty());
        assert_eq!(ws.entries().len(), 3);
    }

    #[test]
    fn unconfirmed_delete_does_nothing() {
        let mut ws = workspace_with(1);
        let id = ws.entries()[0].id.clone();
        run(&mut ws, &id, false).unwrap();
        assert_eq!(ws.entries().len(), 1);
    }

    #[test]
    fn removes_by_id_and_keeps_achievements() {
        let mut ws = workspace_with(2);
        let id = ws.entries()[1].id.clone();
        let result = run(&mut ws, &id, true).unwrap();
        assert_eq!(result.affected_entries[0].id, id);
        assert_eq!(ws.entries().len(), 1);
        assert!(ws.data().achievements.contains_key("first_log"));

        let first = ws.entries()[0].id.clone();
        run(&mut ws, &first, true).unwrap();
        assert!(ws.entries().is_empty());
        assert!(ws.data().achievements.contains_key("first_log"));
    }
}
