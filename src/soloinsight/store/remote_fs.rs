use super::remote::{DocumentStore, Subscribers, Subscription, SubscriptionId, SyncError, UserDocument, UserId};
use super::Slot;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory-backed cloud: `<root>/users/<uid>.json`, one document per user.
///
/// Subscriptions are delivered in-process only: a client sees its own writes
/// echoed back, but writes made by another process show up on the next fetch.
pub struct FsDocumentStore {
    root: PathBuf,
    subscribers: Subscribers,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            subscribers: Subscribers::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    fn doc_path(&self, user: &UserId) -> Result<PathBuf, SyncError> {
        let valid = !user.as_str().is_empty()
            && user
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !user.as_str().starts_with('.');
        if !valid {
            return Err(SyncError::PermissionDenied(user.to_string()));
        }
        Ok(self.users_dir().join(format!("{}.json", user)))
    }

    fn write_doc(&self, user: &UserId, doc: &UserDocument) -> Result<(), SyncError> {
        let path = self.doc_path(user)?;
        let dir = self.users_dir();
        fs::create_dir_all(&dir).map_err(|e| SyncError::Unavailable(e.to_string()))?;
        let content = serde_json::to_string_pretty(doc)
            .map_err(|e| SyncError::Corrupt(user.to_string(), e.to_string()))?;
        let tmp = dir.join(format!(".{}.json.tmp", user));
        fs::write(&tmp, content).map_err(|e| SyncError::Unavailable(e.to_string()))?;
        fs::rename(&tmp, &path).map_err(|e| SyncError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

impl DocumentStore for FsDocumentStore {
    fn fetch(&self, user: &UserId) -> Result<Option<UserDocument>, SyncError> {
        let path = self.doc_path(user)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => SyncError::PermissionDenied(user.to_string()),
            _ => SyncError::Unavailable(e.to_string()),
        })?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| SyncError::Corrupt(user.to_string(), e.to_string()))
    }

    fn create(&mut self, user: &UserId, doc: UserDocument) -> Result<(), SyncError> {
        self.write_doc(user, &doc)?;
        tracing::info!("Created cloud document for {}", user);
        self.subscribers.notify(user, Some(&doc));
        Ok(())
    }

    fn update_field(&mut self, user: &UserId, slot: Slot, value: Value) -> Result<(), SyncError> {
        let mut doc = self
            .fetch(user)?
            .ok_or_else(|| SyncError::NotFound(user.to_string()))?;
        doc.set(slot, value)
            .map_err(|e| SyncError::Corrupt(user.to_string(), e.to_string()))?;
        self.write_doc(user, &doc)?;
        self.subscribers.notify(user, Some(&doc));
        Ok(())
    }

    fn subscribe(&mut self, user: &UserId) -> Result<Subscription, SyncError> {
        let current = self.fetch(user)?;
        Ok(self.subscribers.add(user, current.as_ref()))
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppData;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn create_fetch_and_update() {
        let dir = TempDir::new().unwrap();
        let mut store = FsDocumentStore::new(dir.path());
        let user = UserId::new("bob");

        assert_eq!(store.fetch(&user).unwrap(), None);
        store
            .create(&user, UserDocument::from_app_data(&AppData::default(), 9))
            .unwrap();
        store.update_field(&user, Slot::Tags, json!(["t"])).unwrap();

        let doc = store.fetch(&user).unwrap().unwrap();
        assert_eq!(doc.tags, vec!["t"]);
        assert_eq!(doc.created_at, 9);
        assert!(dir.path().join("users").join("bob.json").exists());
    }

    #[test]
    fn rejects_path_like_user_ids() {
        let dir = TempDir::new().unwrap();
        let store = FsDocumentStore::new(dir.path());
        let err = store.fetch(&UserId::new("../escape")).unwrap_err();
        assert!(matches!(err, SyncError::PermissionDenied(_)));
    }

    #[test]
    fn corrupt_document_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("users")).unwrap();
        fs::write(dir.path().join("users").join("eve.json"), "{oops").unwrap();
        let store = FsDocumentStore::new(dir.path());
        assert!(matches!(
            store.fetch(&UserId::new("eve")),
            Err(SyncError::Corrupt(_, _))
        ));
    }

    #[test]
    fn own_writes_are_echoed() {
        let dir = TempDir::new().unwrap();
        let mut store = FsDocumentStore::new(dir.path());
        let user = UserId::new("carol");
        store
            .create(&user, UserDocument::from_app_data(&AppData::default(), 0))
            .unwrap();
        let sub = store.subscribe(&user).unwrap();
        store.update_field(&user, Slot::Language, json!("zh")).unwrap();
        let latest = sub.latest().flatten().unwrap();
        assert_eq!(latest.language, crate::model::Language::Zh);
    }
}
