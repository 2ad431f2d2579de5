//! Cloud document storage.
//!
//! Each authenticated user owns exactly one [`UserDocument`]. Writes replace a
//! single named field; there is no concurrency token, so two devices writing
//! the same field race and the last write wins. Every change to a document,
//! including the writer's own, is pushed to that user's subscribers.

use super::{DataStore, Slot};
use crate::error::Result;
use crate::model::{
    AiAccessState, AppData, ContentItem, Entry, Language, UnlockMap,
};
use crate::session::Session;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::mpsc::{self, Receiver, Sender};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("cloud storage unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied for user {0}")]
    PermissionDenied(String),

    #[error("no cloud document for user {0}")]
    NotFound(String),

    #[error("cloud document for user {0} is unreadable: {1}")]
    Corrupt(String, String),
}

/// Identity of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The per-user cloud record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub library: Vec<ContentItem>,
    #[serde(default)]
    pub achievements: UnlockMap,
    #[serde(default)]
    pub ai_access: AiAccessState,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub created_at: i64,
}

impl UserDocument {
    pub fn from_app_data(data: &AppData, created_at: i64) -> Self {
        Self {
            entries: data.entries.clone(),
            tags: data.tags.clone(),
            library: data.library.clone(),
            achievements: data.achievements.clone(),
            ai_access: data.ai_access,
            language: data.language,
            created_at,
        }
    }

    pub fn to_app_data(&self) -> AppData {
        AppData {
            entries: self.entries.clone(),
            tags: self.tags.clone(),
            achievements: self.achievements.clone(),
            library: self.library.clone(),
            ai_access: self.ai_access,
            language: self.language,
        }
    }

    /// Current value of one field.
    pub fn get(&self, slot: Slot) -> serde_json::Result<Value> {
        match slot {
            Slot::Entries => serde_json::to_value(&self.entries),
            Slot::Tags => serde_json::to_value(&self.tags),
            Slot::Achievements => serde_json::to_value(&self.achievements),
            Slot::Library => serde_json::to_value(&self.library),
            Slot::AiAccess => serde_json::to_value(self.ai_access),
            Slot::Language => serde_json::to_value(self.language),
        }
    }

    /// Replace one field wholesale.
    pub fn set(&mut self, slot: Slot, value: Value) -> serde_json::Result<()> {
        match slot {
            Slot::Entries => self.entries = serde_json::from_value(value)?,
            Slot::Tags => self.tags = serde_json::from_value(value)?,
            Slot::Achievements => self.achievements = serde_json::from_value(value)?,
            Slot::Library => self.library = serde_json::from_value(value)?,
            Slot::AiAccess => self.ai_access = serde_json::from_value(value)?,
            Slot::Language => self.language = serde_json::from_value(value)?,
        }
        Ok(())
    }
}

pub type SubscriptionId = u64;

/// A standing subscription to one user's document.
///
/// Snapshots arrive in the order the store produced them. `None` means the
/// document does not exist. Dropping the subscription stops deliveries.
pub struct Subscription {
    id: SubscriptionId,
    user: UserId,
    receiver: Receiver<Option<UserDocument>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Drain everything delivered so far and return only the newest snapshot.
    pub fn latest(&self) -> Option<Option<UserDocument>> {
        self.receiver.try_iter().last()
    }
}

/// Subscriber bookkeeping shared by the document store implementations.
#[derive(Default)]
pub struct Subscribers {
    next_id: SubscriptionId,
    senders: Vec<(SubscriptionId, UserId, Sender<Option<UserDocument>>)>,
}

impl Subscribers {
    /// Register a subscriber and deliver the current state immediately.
    pub fn add(&mut self, user: &UserId, current: Option<&UserDocument>) -> Subscription {
        self.next_id += 1;
        let (tx, rx) = mpsc::channel();
        // Cannot fail: the receiver is still in scope.
        let _ = tx.send(current.cloned());
        self.senders.push((self.next_id, user.clone(), tx));
        Subscription {
            id: self.next_id,
            user: user.clone(),
            receiver: rx,
        }
    }

    pub fn remove(&mut self, id: SubscriptionId) {
        self.senders.retain(|(sid, _, _)| *sid != id);
    }

    /// Push a snapshot to every live subscriber of `user`, pruning dead ones.
    pub fn notify(&mut self, user: &UserId, doc: Option<&UserDocument>) {
        self.senders
            .retain(|(_, u, tx)| u != user || tx.send(doc.cloned()).is_ok());
    }

    pub fn count_for(&self, user: &UserId) -> usize {
        self.senders.iter().filter(|(_, u, _)| u == user).count()
    }
}

/// Abstract interface for per-user cloud documents.
pub trait DocumentStore {
    /// Fetch a user's document. `Ok(None)` if it does not exist yet.
    fn fetch(&self, user: &UserId) -> std::result::Result<Option<UserDocument>, SyncError>;

    /// Create (or overwrite) a user's document.
    fn create(&mut self, user: &UserId, doc: UserDocument) -> std::result::Result<(), SyncError>;

    /// Replace one field of an existing document.
    fn update_field(
        &mut self,
        user: &UserId,
        slot: Slot,
        value: Value,
    ) -> std::result::Result<(), SyncError>;

    /// Start receiving snapshots of a user's document.
    fn subscribe(&mut self, user: &UserId) -> std::result::Result<Subscription, SyncError>;

    /// Stop deliveries to a subscription.
    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// [`DataStore`] bound to one authenticated session's cloud document.
pub struct CloudStore<D: DocumentStore> {
    docs: D,
    session: Session,
}

impl<D: DocumentStore> CloudStore<D> {
    pub fn new(docs: D, session: Session) -> Self {
        Self { docs, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn docs(&self) -> &D {
        &self.docs
    }

    pub fn docs_mut(&mut self) -> &mut D {
        &mut self.docs
    }

    /// Tear down the session and hand the document store back.
    pub fn logout(mut self) -> D {
        self.session.end(&mut self.docs);
        self.docs
    }
}

impl<D: DocumentStore> DataStore for CloudStore<D> {
    fn load(&self, slot: Slot) -> Result<Option<Value>> {
        let doc = self.docs.fetch(self.session.user())?;
        Ok(doc.map(|d| d.get(slot)).transpose()?)
    }

    fn store(&mut self, slot: Slot, value: Value) -> Result<()> {
        tracing::debug!("Writing cloud field {} for {}", slot, self.session.user());
        self.docs.update_field(self.session.user(), slot, value)?;
        Ok(())
    }

    fn take_pushed(&mut self) -> Option<AppData> {
        self.session.latest_snapshot().map(|doc| doc.to_app_data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{default_tags, Outcome};
    use serde_json::json;

    #[test]
    fn document_field_roundtrip_by_slot() {
        let mut doc = UserDocument::from_app_data(&AppData::default(), 1);
        doc.set(Slot::Tags, json!(["x"])).unwrap();
        assert_eq!(doc.tags, vec!["x"]);
        assert_eq!(doc.get(Slot::Tags).unwrap(), json!(["x"]));

        doc.set(Slot::Language, json!("zh")).unwrap();
        assert_eq!(doc.language, Language::Zh);
    }

    #[test]
    fn document_set_rejects_wrong_shape() {
        let mut doc = UserDocument::from_app_data(&AppData::default(), 1);
        assert!(doc.set(Slot::Entries, json!("nope")).is_err());
        assert!(doc.entries.is_empty());
    }

    #[test]
    fn document_uses_camel_case_schema() {
        let mut data = AppData::default();
        data.entries.push(Entry {
            id: "a".into(),
            timestamp: 1,
            duration: 2,
            intensity: 3,
            outcome: Outcome::No,
            tags: vec![],
            note: String::new(),
            linked_content: None,
            photo_data: None,
        });
        let doc = UserDocument::from_app_data(&data, 42);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["createdAt"], 42);
        assert_eq!(value["aiAccess"]["attempts"], 0);
        assert_eq!(value["tags"], json!(default_tags()));
    }

    #[test]
    fn subscribers_get_current_state_then_updates() {
        let mut subs = Subscribers::default();
        let user = UserId::new("u1");
        let sub = subs.add(&user, None);
        assert_eq!(sub.latest(), Some(None));

        let doc = UserDocument::from_app_data(&AppData::default(), 7);
        subs.notify(&user, Some(&doc));
        subs.notify(&UserId::new("other"), None);
        assert_eq!(sub.latest(), Some(Some(doc)));
        assert_eq!(sub.latest(), None);
    }

    #[test]
    fn dropped_subscriptions_are_pruned() {
        let mut subs = Subscribers::default();
        let user = UserId::new("u1");
        let sub = subs.add(&user, None);
        assert_eq!(subs.count_for(&user), 1);
        drop(sub);
        subs.notify(&user, None);
        assert_eq!(subs.count_for(&user), 0);
    }
}
