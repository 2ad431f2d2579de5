use crate::backup::{self, Restore};
use crate::commands::helpers::persist_or_warn;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::DataStore;
use crate::workspace::Workspace;
use chrono::{DateTime, Utc};

pub fn export<S: DataStore>(ws: &Workspace<S>, now: DateTime<Utc>) -> Result<CmdResult> {
    let json = backup::export(ws.data(), now)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Exported {} entries",
        ws.entries().len()
    )));
    Ok(result.with_backup(json))
}

/// Read a backup file so the caller can confirm before anything is applied.
pub fn preview(json: &str) -> Result<Restore> {
    backup::parse(json)
}

/// Overwrite every collection the backup carries. Nothing happens without
/// `confirmed`.
pub fn import<S: DataStore>(ws: &mut Workspace<S>, restore: Restore, confirmed: bool) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if !confirmed {
        result.add_message(CmdMessage::info("Import cancelled."));
        return Ok(result);
    }

    for field in &restore.skipped {
        result.add_message(CmdMessage::warning(format!(
            "Skipped unreadable field {}",
            field
        )));
    }
    let count = restore.entry_count();
    let slots = restore.apply(ws.data_mut());
    for slot in slots {
        persist_or_warn(ws, slot, &mut result);
    }
    tracing::info!("Restored backup with {} entries", count);
    result.add_message(CmdMessage::success(format!("Restored {} entries", count)));
    Ok(result.with_listed_entries(ws.entries().to_vec()))
}
