//! Authenticated session context.
//!
//! A [`Session`] exists from a successful login until logout. It carries the
//! signed-in identity and owns the standing subscription to that user's cloud
//! document, so nothing outside it needs ambient "current user" state. Ending
//! the session (or switching user) tears the subscription down, which keeps a
//! previous user's snapshots from leaking into the next session.

use crate::model::AppData;
use crate::store::remote::{DocumentStore, Subscription, SyncError, UserDocument, UserId};
use crate::sync::{merge_local_into_cloud, MergeReport};

pub struct Session {
    user: UserId,
    subscription: Option<Subscription>,
}

impl Session {
    /// Log `user` in: merge the local snapshot into the cloud document, then
    /// subscribe to it.
    pub fn login<D: DocumentStore>(
        docs: &mut D,
        user: UserId,
        local: &AppData,
        now_ms: i64,
    ) -> Result<(Session, MergeReport), SyncError> {
        let report = merge_local_into_cloud(docs, &user, local, now_ms)?;
        let session = Self::resume(docs, user)?;
        Ok((session, report))
    }

    /// Re-attach to a user who is already signed in; no merge runs.
    pub fn resume<D: DocumentStore>(docs: &mut D, user: UserId) -> Result<Session, SyncError> {
        let subscription = docs.subscribe(&user)?;
        tracing::debug!("Subscribed to cloud document for {}", user);
        Ok(Session {
            user,
            subscription: Some(subscription),
        })
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// The newest document delivered since the last call. Deliveries saying
    /// the document is gone are ignored; the last known state stands.
    pub fn latest_snapshot(&self) -> Option<UserDocument> {
        match self.subscription.as_ref()?.latest()? {
            Some(doc) => Some(doc),
            None => {
                tracing::warn!("Cloud document for {} is missing", self.user);
                None
            }
        }
    }

    /// Tear down the subscription. Idempotent.
    pub fn end<D: DocumentStore>(&mut self, docs: &mut D) {
        if let Some(subscription) = self.subscription.take() {
            docs.unsubscribe(subscription.id());
            tracing::info!("Session for {} ended", self.user);
        }
    }

    /// End this session and log a different identity in.
    pub fn switch_user<D: DocumentStore>(
        mut self,
        docs: &mut D,
        user: UserId,
        local: &AppData,
        now_ms: i64,
    ) -> Result<(Session, MergeReport), SyncError> {
        self.end(docs);
        Session::login(docs, user, local, now_ms)
    }
}
