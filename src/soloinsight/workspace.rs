//! In-memory session state.
//!
//! A [`Workspace`] owns the canonical [`AppData`] for the active session and
//! the [`DataStore`] it is persisted to. Mutations are applied here first and
//! then written out slot by slot; whatever the backend pushes later (the
//! cloud subscription) overwrites the in-memory state wholesale.

use crate::error::Result;
use crate::model::{AppData, AiAccessState, ContentItem, Entry, Language, UnlockMap};
use crate::store::{DataStore, Slot};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub struct Workspace<S: DataStore> {
    store: S,
    data: AppData,
}

impl<S: DataStore> Workspace<S> {
    /// Load every slot from `store`. Absent or malformed slots fall back to
    /// their defaults; only backend failures (a cloud fetch) are errors.
    ///
    /// A snapshot the store has already pushed (a fresh subscription delivers
    /// the current document) is consumed here, so `pump` only ever sees
    /// deliveries newer than the state the workspace starts from.
    pub fn open(mut store: S) -> Result<Self> {
        let data = match store.take_pushed() {
            Some(pushed) => pushed,
            None => load_data(&store)?,
        };
        tracing::debug!(
            "Opened workspace: {} entries, {} tags, {} library items",
            data.entries.len(),
            data.tags.len(),
            data.library.len()
        );
        Ok(Self { store, data })
    }

    /// Start from known data without reading the store.
    pub fn with_data(store: S, data: AppData) -> Self {
        Self { store, data }
    }

    pub fn data(&self) -> &AppData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut AppData {
        &mut self.data
    }

    pub fn entries(&self) -> &[Entry] {
        &self.data.entries
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_parts(self) -> (S, AppData) {
        (self.store, self.data)
    }

    /// Write the in-memory value of `slot` to the store.
    pub fn persist(&mut self, slot: Slot) -> Result<()> {
        let value = slot_value(&self.data, slot)?;
        self.store.store(slot, value)
    }

    /// Apply the newest state pushed by the store, if there is one.
    /// Returns true when the in-memory state was replaced.
    pub fn pump(&mut self) -> bool {
        match self.store.take_pushed() {
            Some(pushed) => {
                let changed = pushed != self.data;
                self.data = pushed;
                changed
            }
            None => false,
        }
    }
}

pub(crate) fn slot_value(data: &AppData, slot: Slot) -> Result<Value> {
    let value = match slot {
        Slot::Entries => serde_json::to_value(&data.entries)?,
        Slot::Tags => serde_json::to_value(&data.tags)?,
        Slot::Achievements => serde_json::to_value(&data.achievements)?,
        Slot::Library => serde_json::to_value(&data.library)?,
        Slot::AiAccess => serde_json::to_value(data.ai_access)?,
        Slot::Language => serde_json::to_value(data.language)?,
    };
    Ok(value)
}

fn load_data<S: DataStore>(store: &S) -> Result<AppData> {
    let defaults = AppData::default();
    Ok(AppData {
        entries: load_slot::<S, Vec<Entry>>(store, Slot::Entries)?.unwrap_or_default(),
        tags: load_slot::<S, Vec<String>>(store, Slot::Tags)?.unwrap_or(defaults.tags),
        achievements: load_slot::<S, UnlockMap>(store, Slot::Achievements)?.unwrap_or_default(),
        library: load_slot::<S, Vec<ContentItem>>(store, Slot::Library)?.unwrap_or_default(),
        ai_access: load_slot::<S, AiAccessState>(store, Slot::AiAccess)?.unwrap_or_default(),
        language: load_slot::<S, Language>(store, Slot::Language)?.unwrap_or_default(),
    })
}

fn load_slot<S: DataStore, T: DeserializeOwned>(store: &S, slot: Slot) -> Result<Option<T>> {
    let Some(value) = store.load(slot)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            tracing::warn!("Ignoring malformed {} data: {}", slot, e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_tags;
    use crate::store::local::{KvBackend, LocalStore};
    use crate::store::memory::MemBackend;

    #[test]
    fn empty_store_opens_with_defaults() {
        let ws = Workspace::open(LocalStore::new(MemBackend::new())).unwrap();
        assert!(ws.entries().is_empty());
        assert_eq!(ws.data().tags, default_tags());
        assert_eq!(ws.data().language, Language::En);
        assert_eq!(ws.data().ai_access, AiAccessState::default());
    }

    #[test]
    fn malformed_slot_falls_back_to_default() {
        let mut backend = MemBackend::new();
        backend.write(Slot::Entries.key(), "{\"not\":\"a list\"}").unwrap();
        backend.write(Slot::Tags.key(), "[\"Mine\"]").unwrap();
        let ws = Workspace::open(LocalStore::new(backend)).unwrap();
        assert!(ws.entries().is_empty());
        assert_eq!(ws.data().tags, vec!["Mine"]);
    }

    #[test]
    fn persist_then_reopen() {
        let mut ws = Workspace::open(LocalStore::new(MemBackend::new())).unwrap();
        ws.data_mut().tags.push("Extra".into());
        ws.persist(Slot::Tags).unwrap();

        let (store, _) = ws.into_parts();
        let reopened = Workspace::open(store).unwrap();
        assert!(reopened.data().tags.contains(&"Extra".to_string()));
    }

    #[test]
    fn pump_is_noop_for_local_store() {
        let mut ws = Workspace::open(LocalStore::new(MemBackend::new())).unwrap();
        assert!(!ws.pump());
    }
}
