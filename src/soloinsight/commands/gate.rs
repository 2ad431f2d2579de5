use crate::commands::helpers::persist_or_warn;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::gate::GateOutcome;
use crate::store::{DataStore, Slot};
use crate::workspace::Workspace;

pub fn run<S: DataStore>(ws: &mut Workspace<S>, key: &str) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if ws.data().ai_access.is_locked_out() {
        result.add_message(CmdMessage::error(
            "Maximum attempts exceeded. Feature locked.",
        ));
        return Ok(result.with_gate(GateOutcome::LockedOut));
    }

    let before = ws.data().ai_access;
    let outcome = ws.data_mut().ai_access.attempt(key);
    if ws.data().ai_access != before {
        persist_or_warn(ws, Slot::AiAccess, &mut result);
    }

    let message = match outcome {
        GateOutcome::Unlocked => CmdMessage::success("Insights assistant unlocked."),
        GateOutcome::Rejected { remaining } => CmdMessage::warning(format!(
            "Incorrect key. {} attempts remaining.",
            remaining
        )),
        GateOutcome::LockedOut => CmdMessage::error(
            "Access permanently disabled due to too many failed attempts.",
        ),
    };
    result.add_message(message);
    Ok(result.with_gate(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::MAX_ATTEMPTS;
    use crate::store::local::LocalStore;
    use crate::store::memory::MemBackend;

    #[test]
    fn wrong_attempts_persist_across_sessions() {
        let mut ws = Workspace::open(LocalStore::new(MemBackend::new())).unwrap();
        for _ in 0..MAX_ATTEMPTS - 1 {
            run(&mut ws, "guess").unwrap();
        }
        let (store, _) = ws.into_parts();
        let mut ws = Workspace::open(store).unwrap();
        assert_eq!(ws.data().ai_access.attempts, MAX_ATTEMPTS - 1);

        let last = run(&mut ws, "guess").unwrap();
        assert_eq!(last.gate, Some(GateOutcome::LockedOut));
        let after = run(&mut ws, "114514").unwrap();
        assert_eq!(after.gate, Some(GateOutcome::LockedOut));
        assert!(!ws.data().ai_access.unlocked);
    }

    #[test]
    fn correct_key_unlocks_and_persists() {
        let mut ws = Workspace::open(LocalStore::new(MemBackend::new())).unwrap();
        let result = run(&mut ws, "114514").unwrap();
        assert_eq!(result.gate, Some(GateOutcome::Unlocked));
        let (store, _) = ws.into_parts();
        assert!(Workspace::open(store).unwrap().data().ai_access.unlocked);
    }
}
