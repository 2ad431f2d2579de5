use super::remote::{DocumentStore, Subscribers, Subscription, SubscriptionId, SyncError, UserDocument, UserId};
use super::Slot;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Default)]
struct Inner {
    docs: HashMap<UserId, UserDocument>,
    subscribers: Subscribers,
    offline: bool,
    denied: HashSet<UserId>,
    writes: usize,
}

impl Inner {
    fn check(&self, user: &UserId) -> Result<(), SyncError> {
        if self.offline {
            return Err(SyncError::Unavailable("network is offline".to_string()));
        }
        if self.denied.contains(user) {
            return Err(SyncError::PermissionDenied(user.to_string()));
        }
        Ok(())
    }
}

/// In-memory cloud for tests.
///
/// Clones share the same documents, so two clones behave like two devices
/// signed into the same account. Uses `Rc<RefCell>` since everything runs on
/// one thread.
#[derive(Clone, Default)]
pub struct MemDocumentStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) connectivity.
    pub fn set_offline(&self, offline: bool) {
        self.inner.borrow_mut().offline = offline;
    }

    /// Make every operation for `user` fail with a permission error.
    pub fn deny(&self, user: &UserId) {
        self.inner.borrow_mut().denied.insert(user.clone());
    }

    /// Number of successful writes (creates and field updates).
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }

    /// Peek at a document without connectivity checks.
    pub fn snapshot(&self, user: &UserId) -> Option<UserDocument> {
        self.inner.borrow().docs.get(user).cloned()
    }

    pub fn subscriber_count(&self, user: &UserId) -> usize {
        self.inner.borrow().subscribers.count_for(user)
    }
}

impl DocumentStore for MemDocumentStore {
    fn fetch(&self, user: &UserId) -> Result<Option<UserDocument>, SyncError> {
        let inner = self.inner.borrow();
        inner.check(user)?;
        Ok(inner.docs.get(user).cloned())
    }

    fn create(&mut self, user: &UserId, doc: UserDocument) -> Result<(), SyncError> {
        let mut inner = self.inner.borrow_mut();
        inner.check(user)?;
        inner.docs.insert(user.clone(), doc.clone());
        inner.writes += 1;
        inner.subscribers.notify(user, Some(&doc));
        Ok(())
    }

    fn update_field(&mut self, user: &UserId, slot: Slot, value: Value) -> Result<(), SyncError> {
        let mut inner = self.inner.borrow_mut();
        inner.check(user)?;
        let mut doc = inner
            .docs
            .get(user)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(user.to_string()))?;
        doc.set(slot, value)
            .map_err(|e| SyncError::Corrupt(user.to_string(), e.to_string()))?;
        inner.docs.insert(user.clone(), doc.clone());
        inner.writes += 1;
        inner.subscribers.notify(user, Some(&doc));
        Ok(())
    }

    fn subscribe(&mut self, user: &UserId) -> Result<Subscription, SyncError> {
        let mut inner = self.inner.borrow_mut();
        inner.check(user)?;
        let current = inner.docs.get(user).cloned();
        Ok(inner.subscribers.add(user, current.as_ref()))
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.inner.borrow_mut().subscribers.remove(id);
    }
}
