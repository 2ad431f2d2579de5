use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::AppData;
use crate::store::local::{KvBackend, LocalStore};
use crate::workspace::Workspace;

/// Erase everything stored on this device. Cloud documents are untouched.
pub fn run<B: KvBackend>(ws: &mut Workspace<LocalStore<B>>, confirmed: bool) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if !confirmed {
        result.add_message(CmdMessage::info("Wipe cancelled."));
        return Ok(result);
    }
    let count = ws.entries().len();
    ws.store_mut().wipe();
    *ws.data_mut() = AppData::default();
    tracing::info!("Wiped local data ({} entries)", count);
    result.add_message(CmdMessage::success(format!(
        "Deleted all local data ({} entries)",
        count
    )));
    Ok(result)
}
