//! Personal library of reference content (links, performers, titles).

use crate::commands::helpers::{persist_or_warn, resolve_id};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{InsightError, Result};
use crate::model::{non_empty, ContentItem};
use crate::store::{DataStore, Slot};
use crate::workspace::Workspace;

/// Replacement values for an item; `None` keeps the field, `Some("")` clears it.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub url: Option<String>,
    pub actor: Option<String>,
    pub title: Option<String>,
}

/// New items go to the front of the library.
pub fn add<S: DataStore>(
    ws: &mut Workspace<S>,
    url: Option<String>,
    actor: Option<String>,
    title: Option<String>,
) -> Result<CmdResult> {
    let item = ContentItem::new(url, actor, title);
    if !item.has_content() {
        return Err(InsightError::Validation(
            "A library item needs a url, an actor or a title".into(),
        ));
    }

    let mut result = CmdResult::default();
    ws.data_mut().library.insert(0, item.clone());
    persist_or_warn(ws, Slot::Library, &mut result);
    result.add_message(CmdMessage::success(format!("Added {} to library", item.label())));
    Ok(result.with_library_items(vec![item]))
}

pub fn update<S: DataStore>(ws: &mut Workspace<S>, selector: &str, patch: ItemPatch) -> Result<CmdResult> {
    let pos = find(ws, selector)?;
    let mut item = ws.data().library[pos].clone();
    if let Some(url) = patch.url {
        item.url = non_empty(Some(url));
    }
    if let Some(actor) = patch.actor {
        item.actor = non_empty(Some(actor));
    }
    if let Some(title) = patch.title {
        item.title = non_empty(Some(title));
    }
    if !item.has_content() {
        return Err(InsightError::Validation(
            "A library item needs a url, an actor or a title".into(),
        ));
    }

    let mut result = CmdResult::default();
    ws.data_mut().library[pos] = item.clone();
    persist_or_warn(ws, Slot::Library, &mut result);
    result.add_message(CmdMessage::success(format!("Updated {}", item.label())));
    Ok(result.with_library_items(vec![item]))
}

/// Entries that linked this item keep their own copy of its content.
pub fn delete<S: DataStore>(ws: &mut Workspace<S>, selector: &str, confirmed: bool) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if !confirmed {
        result.add_message(CmdMessage::info("Delete cancelled."));
        return Ok(result);
    }
    let Some(pos) = resolve_id(&ws.data().library, selector)? else {
        result.add_message(CmdMessage::info(format!("No library item matches {}", selector)));
        return Ok(result);
    };

    let removed = ws.data_mut().library.remove(pos);
    persist_or_warn(ws, Slot::Library, &mut result);
    result.add_message(CmdMessage::success(format!("Removed {}", removed.label())));
    Ok(result.with_library_items(vec![removed]))
}

pub fn toggle_favorite<S: DataStore>(ws: &mut Workspace<S>, selector: &str) -> Result<CmdResult> {
    let pos = find(ws, selector)?;
    let item = {
        let item = &mut ws.data_mut().library[pos];
        item.is_favorite = !item.is_favorite;
        item.clone()
    };

    let mut result = CmdResult::default();
    persist_or_warn(ws, Slot::Library, &mut result);
    let verb = if item.is_favorite { "Starred" } else { "Unstarred" };
    result.add_message(CmdMessage::success(format!("{} {}", verb, item.label())));
    Ok(result.with_library_items(vec![item]))
}

/// Items matching `term` (empty matches all) in library order.
pub fn search<S: DataStore>(ws: &Workspace<S>, term: &str, favorites_only: bool) -> Result<CmdResult> {
    let items = ws
        .data()
        .library
        .iter()
        .filter(|i| !favorites_only || i.is_favorite)
        .filter(|i| i.matches(term))
        .cloned()
        .collect();
    Ok(CmdResult::default().with_library_items(items))
}

/// The browser-ready url of an item.
pub fn open<S: DataStore>(ws: &Workspace<S>, selector: &str) -> Result<CmdResult> {
    let pos = find(ws, selector)?;
    let item = ws.data().library[pos].clone();
    let mut result = CmdResult::default();
    match item.open_url() {
        Some(url) => result.add_message(CmdMessage::info(url)),
        None => result.add_message(CmdMessage::warning(format!("{} has no url", item.label()))),
    }
    Ok(result.with_library_items(vec![item]))
}

fn find<S: DataStore>(ws: &Workspace<S>, selector: &str) -> Result<usize> {
    resolve_id(&ws.data().library, selector)?
        .ok_or_else(|| InsightError::ItemNotFound(selector.to_string()))
}
