//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single
//! entry point for every solo operation, whatever the UI.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Owns the session state**: a [`Workspace`] over some [`DataStore`]
//! - **Dispatches** to the appropriate command function
//! - **Supplies the clock** for commands that stamp times
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! It does no business logic, no terminal I/O and no formatting.
//!
//! ## Generic Over DataStore
//!
//! `InsightApi<S: DataStore>` is generic over where the data lives:
//! - Signed out: `InsightApi<LocalStore<FileBackend>>`
//! - Signed in: `InsightApi<CloudStore<FsDocumentStore>>`
//! - Testing: the same with `MemBackend` / `MemDocumentStore`
//!
//! Logging in turns a local API into a cloud API (after merging the local
//! data into the user's document); logging out hands the document store back.

use crate::commands;
use crate::error::Result;
use crate::model::{now_millis, AppData, EntryDraft, Language};
use crate::session::Session;
use crate::store::local::{KvBackend, LocalStore};
use crate::store::remote::{CloudStore, DocumentStore, UserId};
use crate::store::DataStore;
use crate::sync::MergeReport;
use crate::workspace::Workspace;
use chrono::{DateTime, TimeZone, Utc};

pub struct InsightApi<S: DataStore> {
    ws: Workspace<S>,
}

impl<S: DataStore> InsightApi<S> {
    pub fn open(store: S) -> Result<Self> {
        Ok(Self {
            ws: Workspace::open(store)?,
        })
    }

    pub fn data(&self) -> &AppData {
        self.ws.data()
    }

    pub fn workspace(&self) -> &Workspace<S> {
        &self.ws
    }

    pub fn into_store(self) -> S {
        self.ws.into_parts().0
    }

    /// Apply whatever the backend pushed since the last call.
    pub fn refresh(&mut self) -> bool {
        self.ws.pump()
    }

    pub fn log_entry(&mut self, draft: EntryDraft, from_library: Option<&str>) -> Result<CmdResult> {
        commands::create::run(&mut self.ws, draft, from_library, now_millis())
    }

    pub fn list_entries(&self, filter: &ListFilter) -> Result<CmdResult> {
        commands::list::run(&self.ws, filter)
    }

    pub fn delete_entry(&mut self, selector: &str, confirmed: bool) -> Result<CmdResult> {
        commands::delete::run(&mut self.ws, selector, confirmed)
    }

    pub fn update_entry(&mut self, selector: &str, patch: EntryPatch) -> Result<CmdResult> {
        commands::update::run(&mut self.ws, selector, patch, now_millis())
    }

    pub fn dashboard<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<CmdResult> {
        commands::stats::dashboard(&self.ws, now)
    }

    pub fn month<Tz: TimeZone>(&self, reference: &DateTime<Tz>) -> Result<CmdResult> {
        commands::stats::month(&self.ws, reference)
    }

    pub fn insights<Tz: TimeZone>(&self, tz: &Tz) -> Result<CmdResult> {
        commands::stats::insights(&self.ws, tz)
    }

    pub fn achievements(&mut self) -> Result<CmdResult> {
        commands::achievements::run(&mut self.ws, now_millis())
    }

    pub fn tags(&self) -> Result<CmdResult> {
        commands::tags::list(&self.ws)
    }

    pub fn add_tag(&mut self, name: &str) -> Result<CmdResult> {
        commands::tags::add(&mut self.ws, name)
    }

    pub fn add_library_item(
        &mut self,
        url: Option<String>,
        actor: Option<String>,
        title: Option<String>,
    ) -> Result<CmdResult> {
        commands::library::add(&mut self.ws, url, actor, title)
    }

    pub fn update_library_item(&mut self, selector: &str, patch: ItemPatch) -> Result<CmdResult> {
        commands::library::update(&mut self.ws, selector, patch)
    }

    pub fn delete_library_item(&mut self, selector: &str, confirmed: bool) -> Result<CmdResult> {
        commands::library::delete(&mut self.ws, selector, confirmed)
    }

    pub fn toggle_favorite(&mut self, selector: &str) -> Result<CmdResult> {
        commands::library::toggle_favorite(&mut self.ws, selector)
    }

    pub fn search_library(&self, term: &str, favorites_only: bool) -> Result<CmdResult> {
        commands::library::search(&self.ws, term, favorites_only)
    }

    pub fn open_library_item(&self, selector: &str) -> Result<CmdResult> {
        commands::library::open(&self.ws, selector)
    }

    pub fn unlock(&mut self, key: &str) -> Result<CmdResult> {
        commands::gate::run(&mut self.ws, key)
    }

    pub fn language(&mut self, set: Option<Language>) -> Result<CmdResult> {
        commands::language::run(&mut self.ws, set)
    }

    pub fn export_backup(&self) -> Result<CmdResult> {
        commands::backup::export(&self.ws, Utc::now())
    }

    pub fn import_backup(&mut self, restore: Restore, confirmed: bool) -> Result<CmdResult> {
        commands::backup::import(&mut self.ws, restore, confirmed)
    }
}

impl<B: KvBackend> InsightApi<LocalStore<B>> {
    pub fn wipe(&mut self, confirmed: bool) -> Result<CmdResult> {
        commands::wipe::run(&mut self.ws, confirmed)
    }

    /// Sign `user` in: merge this device's data into their cloud document and
    /// continue on the cloud copy.
    pub fn login<D: DocumentStore>(
        &self,
        mut docs: D,
        user: UserId,
    ) -> Result<(InsightApi<CloudStore<D>>, MergeReport)> {
        let (session, report) = Session::login(&mut docs, user, self.ws.data(), now_millis())?;
        let api = InsightApi::open(CloudStore::new(docs, session))?;
        Ok((api, report))
    }
}

impl<D: DocumentStore> InsightApi<CloudStore<D>> {
    /// Continue a session for a user who signed in earlier.
    pub fn resume(mut docs: D, user: UserId) -> Result<Self> {
        let session = Session::resume(&mut docs, user)?;
        Self::open(CloudStore::new(docs, session))
    }

    pub fn user(&self) -> &UserId {
        self.ws.store().session().user()
    }

    /// End the session and hand the document store back.
    pub fn logout(self) -> D {
        self.into_store().logout()
    }
}

pub use crate::backup::Restore;
pub use crate::commands::backup::preview as preview_backup;
pub use crate::commands::config::ConfigAction;
pub use crate::commands::library::ItemPatch;
pub use crate::commands::list::ListFilter;
pub use crate::commands::update::EntryPatch;
pub use commands::{CmdMessage, CmdResult, MessageLevel};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Outcome;
    use crate::store::memory::MemBackend;
    use crate::store::remote_memory::MemDocumentStore;

    fn local() -> InsightApi<LocalStore<MemBackend>> {
        InsightApi::open(LocalStore::new(MemBackend::new())).unwrap()
    }

    #[test]
    fn dispatches_entry_commands() {
        let mut api = local();
        let logged = api
            .log_entry(EntryDraft::new(now_millis(), 20, 4, Outcome::Yes), None)
            .unwrap();
        let id = logged.affected_entries[0].id.clone();
        assert_eq!(api.list_entries(&ListFilter::default()).unwrap().listed_entries.len(), 1);

        let patch = EntryPatch {
            note: Some("edited".into()),
            ..Default::default()
        };
        api.update_entry(&id, patch).unwrap();
        assert_eq!(api.data().entries[0].note, "edited");

        api.delete_entry(&id, true).unwrap();
        assert!(api.data().entries.is_empty());
        assert!(api.dashboard(&Utc::now()).unwrap().dashboard.is_some());
    }

    #[test]
    fn delete_only_matches_whole_ids() {
        let mut api = local();
        for minutes in [5, 10, 15] {
            api.log_entry(EntryDraft::new(now_millis(), minutes, 3, Outcome::No), None)
                .unwrap();
        }
        let real_id = api.data().entries[1].id.clone();

        let short = api.delete_entry("x", true).unwrap();
        assert!(short.affected_entries.is_empty());
        api.delete_entry(&real_id[..8], true).unwrap();
        assert_eq!(api.data().entries.len(), 3);

        api.delete_entry(&real_id, true).unwrap();
        assert_eq!(api.data().entries.len(), 2);
    }

    #[test]
    fn login_carries_local_entries_into_cloud() {
        let mut api = local();
        api.log_entry(EntryDraft::new(1, 5, 3, Outcome::No), None).unwrap();

        let docs = MemDocumentStore::new();
        let (mut cloud, report) = api.login(docs.clone(), UserId::new("amy")).unwrap();
        assert!(report.created);
        assert_eq!(cloud.data().entries.len(), 1);
        assert_eq!(cloud.user().as_str(), "amy");

        cloud.add_tag("Cloud only").unwrap();
        assert!(!cloud.refresh());
        assert!(docs.snapshot(&UserId::new("amy")).unwrap().tags.contains(&"Cloud only".to_string()));

        let docs = cloud.logout();
        assert_eq!(docs.subscriber_count(&UserId::new("amy")), 0);
    }

    #[test]
    fn resume_reads_existing_document() {
        let docs = MemDocumentStore::new();
        let api = local();
        let (cloud, _) = api.login(docs.clone(), UserId::new("bo")).unwrap();
        drop(cloud.logout());

        let resumed = InsightApi::resume(docs, UserId::new("bo")).unwrap();
        assert_eq!(resumed.data().tags, api.data().tags);
    }
}
