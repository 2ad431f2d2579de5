use crate::achievements;
use crate::commands::helpers::refresh_achievements;
use crate::commands::CmdResult;
use crate::error::Result;
use crate::store::DataStore;
use crate::workspace::Workspace;

/// Every achievement with its unlock state. Catches up on unlocks that
/// earlier sessions missed (an import, another device) before listing.
pub fn run<S: DataStore>(ws: &mut Workspace<S>, now_ms: i64) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    refresh_achievements(ws, now_ms, &mut result);
    let statuses = achievements::statuses(&ws.data().achievements, ws.data().language);
    Ok(result.with_achievements(statuses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntryDraft, Outcome};
    use crate::store::local::LocalStore;
    use crate::store::memory::MemBackend;

    #[test]
    fn lists_all_and_catches_up() {
        let mut ws = Workspace::open(LocalStore::new(MemBackend::new())).unwrap();
        let entry = EntryDraft::new(0, 5, 3, Outcome::No).into_entry().unwrap();
        ws.data_mut().entries.push(entry);

        let result = run(&mut ws, 42).unwrap();
        assert_eq!(result.achievements.len(), achievements::ACHIEVEMENTS.len());
        assert_eq!(result.unlocked, vec!["first_log"]);
        let first = result.achievements.iter().find(|a| a.id == "first_log").unwrap();
        assert_eq!(first.unlocked_at, Some(42));
    }
}
