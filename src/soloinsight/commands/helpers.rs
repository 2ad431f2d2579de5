use crate::achievements;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{InsightError, Result};
use crate::model::Identified;
use crate::store::{DataStore, Slot};
use crate::workspace::Workspace;

/// Shortest id prefix accepted when selecting an entry or library item.
pub const MIN_ID_PREFIX: usize = 4;

/// Write one slot, turning a backend failure into a warning on `result`.
///
/// The in-memory change has already been applied and stays applied; the
/// user retries by repeating the action.
pub fn persist_or_warn<S: DataStore>(ws: &mut Workspace<S>, slot: Slot, result: &mut CmdResult) {
    if let Err(e) = ws.persist(slot) {
        tracing::warn!("Failed to save {}: {}", slot, e);
        result.add_message(CmdMessage::warning(format!(
            "Could not save {} ({}). The change is kept for this session only.",
            slot, e
        )));
    }
}

/// Re-run achievement predicates after the entry list changed. Newly
/// unlocked achievements are persisted and announced on `result`.
pub fn refresh_achievements<S: DataStore>(ws: &mut Workspace<S>, now_ms: i64, result: &mut CmdResult) {
    let data = ws.data_mut();
    let fresh = achievements::evaluate(&data.entries, &mut data.achievements, now_ms);
    if fresh.is_empty() {
        return;
    }
    let language = data.language;
    for achievement in &fresh {
        result.add_message(CmdMessage::success(format!(
            "Achievement unlocked: {} ({})",
            achievement.title(language),
            achievement.description(language)
        )));
        result.unlocked.push(achievement.id);
    }
    persist_or_warn(ws, Slot::Achievements, result);
}

/// Position of the item whose id is exactly `id`.
pub fn position_of<T: Identified>(items: &[T], id: &str) -> Option<usize> {
    items.iter().position(|i| i.id() == id)
}

/// Find the position of the item whose id equals `selector` or starts with it.
///
/// `Ok(None)` when nothing matches; an error when a prefix is too short or
/// matches more than one item.
pub fn resolve_id<T: Identified>(items: &[T], selector: &str) -> Result<Option<usize>> {
    let selector = selector.trim();
    if let Some(pos) = items.iter().position(|i| i.id() == selector) {
        return Ok(Some(pos));
    }
    if selector.chars().count() < MIN_ID_PREFIX {
        return Err(InsightError::Validation(format!(
            "Id prefix '{}' is too short (need at least {} characters)",
            selector, MIN_ID_PREFIX
        )));
    }
    let mut matches = items
        .iter()
        .enumerate()
        .filter(|(_, i)| i.id().starts_with(selector))
        .map(|(pos, _)| pos);
    let first = matches.next();
    if matches.next().is_some() {
        return Err(InsightError::Validation(format!(
            "Id prefix '{}' is ambiguous",
            selector
        )));
    }
    Ok(first)
}
