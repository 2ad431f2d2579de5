use crate::commands::helpers::{persist_or_warn, position_of, refresh_achievements};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{Entry, Outcome};
use crate::store::{DataStore, Slot};
use crate::workspace::Workspace;

/// Fields to change on an existing entry; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub timestamp: Option<i64>,
    pub duration: Option<u32>,
    pub intensity: Option<u8>,
    pub outcome: Option<Outcome>,
    pub tags: Option<Vec<String>>,
    pub note: Option<String>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        *self == EntryPatch::default()
    }

    fn apply_to(self, entry: &mut Entry) {
        if let Some(timestamp) = self.timestamp {
            entry.timestamp = timestamp;
        }
        if let Some(duration) = self.duration {
            entry.duration = duration;
        }
        if let Some(intensity) = self.intensity {
            entry.intensity = intensity;
        }
        if let Some(outcome) = self.outcome {
            entry.outcome = outcome;
        }
        if let Some(tags) = self.tags {
            entry.tags = tags;
        }
        if let Some(note) = self.note {
            entry.note = note;
        }
    }
}

/// Replace an entry in place, validated like a new one. The id never
/// changes and an unknown id is a no-op.
pub fn run<S: DataStore>(
    ws: &mut Workspace<S>,
    selector: &str,
    patch: EntryPatch,
    now_ms: i64,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let Some(pos) = position_of(ws.entries(), selector) else {
        result.add_message(CmdMessage::info(format!("No entry matches {}", selector)));
        return Ok(result);
    };
    if patch.is_empty() {
        result.add_message(CmdMessage::info("Nothing to change."));
        return Ok(result.with_affected_entries(vec![ws.entries()[pos].clone()]));
    }

    let mut edited = ws.entries()[pos].clone();
    patch.apply_to(&mut edited);
    edited.validate()?;
    edited.normalize();

    ws.data_mut().entries[pos] = edited.clone();
    persist_or_warn(ws, Slot::Entries, &mut result);
    result.add_message(CmdMessage::success("Entry updated"));
    refresh_achievements(ws, now_ms, &mut result);
    Ok(result.with_affected_entries(vec![edited]))
}
