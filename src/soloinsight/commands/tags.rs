use crate::commands::helpers::persist_or_warn;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{InsightError, Result};
use crate::store::{DataStore, Slot};
use crate::workspace::Workspace;

pub fn list<S: DataStore>(ws: &Workspace<S>) -> Result<CmdResult> {
    Ok(CmdResult::default().with_tags(ws.data().tags.clone()))
}

/// Register a tag. Names are trimmed; an existing name is left alone.
pub fn add<S: DataStore>(ws: &mut Workspace<S>, name: &str) -> Result<CmdResult> {
    let name = name.trim();
    if name.is_empty() {
        return Err(InsightError::Validation("Tag name cannot be empty".into()));
    }

    let mut result = CmdResult::default();
    if ws.data().tags.iter().any(|t| t == name) {
        result.add_message(CmdMessage::info(format!("Tag {} already exists", name)));
        return Ok(result.with_tags(ws.data().tags.clone()));
    }

    ws.data_mut().tags.push(name.to_string());
    persist_or_warn(ws, Slot::Tags, &mut result);
    result.add_message(CmdMessage::success(format!("Added tag {}", name)));
    Ok(result.with_tags(ws.data().tags.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_TAGS;
    use crate::store::local::LocalStore;
    use crate::store::memory::MemBackend;

    #[test]
    fn adds_trimmed_unique_tags() {
        let mut ws = Workspace::open(LocalStore::new(MemBackend::new())).unwrap();
        add(&mut ws, "  Night ").unwrap();
        add(&mut ws, "Night").unwrap();
        let tags = list(&ws).unwrap().tags;
        assert_eq!(tags.len(), DEFAULT_TAGS.len() + 1);
        assert_eq!(tags.last().map(String::as_str), Some("Night"));
    }

    #[test]
    fn rejects_blank_names() {
        let mut ws = Workspace::open(LocalStore::new(MemBackend::new())).unwrap();
        assert!(add(&mut ws, "   ").is_err());
    }
}
