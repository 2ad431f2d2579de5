//! # Storage Layer
//!
//! The [`DataStore`] trait is the durability boundary for a session. It speaks
//! in named [`Slot`]s holding whole JSON values: every mutation replaces one
//! slot wholesale, there are no partial updates and no transactions across
//! slots.
//!
//! ## Implementations
//!
//! - [`local::LocalStore`]: device-local key-value storage. Reads fall back to
//!   "absent" when a slot is missing or unreadable, writes never fail
//!   observably. Backed by a [`local::KvBackend`]:
//!   - [`fs::FileBackend`]: one `<key>.json` file per slot (production)
//!   - [`memory::MemBackend`]: an in-memory map (testing)
//!
//! - [`remote::CloudStore`]: one document per authenticated user in a
//!   [`remote::DocumentStore`]. Writes replace one named field of the document,
//!   reads and writes can fail with a [`remote::SyncError`], and the store
//!   delivers pushed snapshots of the document through a subscription.
//!   - [`remote_memory::MemDocumentStore`]: shared in-memory documents
//!   - [`remote_fs::FsDocumentStore`]: a directory of `users/<uid>.json`
//!
//! ## Storage Format
//!
//! For `FileBackend`:
//! ```text
//! local/
//! ├── solo_insight_entries.json
//! ├── solo_insight_tags.json
//! ├── solo_insight_achievements_state.json
//! ├── solo_insight_library.json
//! ├── solo_insight_ai_access.json
//! └── solo_insight_language.json
//! ```

use crate::error::Result;
use crate::model::AppData;
use serde_json::Value;

pub mod fs;
pub mod local;
pub mod memory;
pub mod remote;
pub mod remote_fs;
pub mod remote_memory;

/// The fixed set of named slots a user's data is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Entries,
    Tags,
    Achievements,
    Library,
    AiAccess,
    Language,
}

impl Slot {
    pub const ALL: [Slot; 6] = [
        Slot::Entries,
        Slot::Tags,
        Slot::Achievements,
        Slot::Library,
        Slot::AiAccess,
        Slot::Language,
    ];

    /// Key used by local key-value storage.
    pub fn key(self) -> &'static str {
        match self {
            Slot::Entries => "solo_insight_entries",
            Slot::Tags => "solo_insight_tags",
            Slot::Achievements => "solo_insight_achievements_state",
            Slot::Library => "solo_insight_library",
            Slot::AiAccess => "solo_insight_ai_access",
            Slot::Language => "solo_insight_language",
        }
    }

    /// Field name inside a cloud user document.
    pub fn field(self) -> &'static str {
        match self {
            Slot::Entries => "entries",
            Slot::Tags => "tags",
            Slot::Achievements => "achievements",
            Slot::Library => "library",
            Slot::AiAccess => "aiAccess",
            Slot::Language => "language",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.field())
    }
}

/// Abstract interface for slot storage.
pub trait DataStore {
    /// Load the raw value of a slot. `Ok(None)` means absent.
    fn load(&self, slot: Slot) -> Result<Option<Value>>;

    /// Replace the whole value of a slot.
    fn store(&mut self, slot: Slot, value: Value) -> Result<()>;

    /// The most recent state pushed by the backend since the last call, if
    /// any. Only push-based backends deliver anything here.
    fn take_pushed(&mut self) -> Option<AppData> {
        None
    }
}
