use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Collection, Document, MirrorError, RemoteMirror, WriteBatch};

/// Process-local mirror. A batch is applied under one lock, so readers see
/// all of it or none of it.
#[derive(Default)]
pub struct InMemoryMirror {
    collections: Mutex<HashMap<Collection, BTreeMap<String, Document>>>,
    offline: AtomicBool,
    rejecting: std::sync::Mutex<HashSet<Collection>>,
    commits: AtomicUsize,
}

impl InMemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with `Unavailable` until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes commits against `collection` fail with `Rejected`.
    pub fn reject_commits(&self, collection: Collection, reject: bool) {
        let mut rejecting = self.rejecting.lock().unwrap_or_else(|e| e.into_inner());
        if reject {
            rejecting.insert(collection);
        } else {
            rejecting.remove(&collection);
        }
    }

    /// Number of batches committed so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Seeds a document directly, bypassing the commit path.
    pub async fn insert_raw(&self, collection: Collection, id: &str, document: Document) {
        self.collections
            .lock()
            .await
            .entry(collection)
            .or_default()
            .insert(id.to_string(), document);
    }

    fn check_online(&self) -> Result<(), MirrorError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(MirrorError::Unavailable("in-memory mirror is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn is_rejecting(&self, collection: Collection) -> bool {
        self.rejecting
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&collection)
    }
}

#[async_trait]
impl RemoteMirror for InMemoryMirror {
    async fn ping(&self) -> Result<(), MirrorError> {
        self.check_online()
    }

    async fn list_all(&self, collection: Collection) -> Result<BTreeMap<String, Document>, MirrorError> {
        self.check_online()?;
        let collections = self.collections.lock().await;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn commit(&self, collection: Collection, batch: WriteBatch) -> Result<(), MirrorError> {
        self.check_online()?;
        if self.is_rejecting(collection) {
            return Err(MirrorError::Rejected(format!(
                "PERMISSION_DENIED: writes to {} are rejected",
                collection
            )));
        }

        let mut collections = self.collections.lock().await;
        let documents = collections.entry(collection).or_default();
        for id in &batch.deletes {
            documents.remove(id);
        }
        documents.extend(batch.upserts);
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_all(&self, collection: Collection) -> Result<usize, MirrorError> {
        self.check_online()?;
        if self.is_rejecting(collection) {
            return Err(MirrorError::Rejected(format!(
                "PERMISSION_DENIED: writes to {} are rejected",
                collection
            )));
        }

        let mut collections = self.collections.lock().await;
        let removed = collections.remove(&collection).map(|d| d.len()).unwrap_or(0);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(name: &str) -> Document {
        json!({ "name": name }).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn commit_applies_upserts_and_deletes_together() {
        let mirror = InMemoryMirror::new();
        mirror.insert_raw(Collection::Courses, "1", doc("old")).await;
        mirror.insert_raw(Collection::Courses, "3", doc("gone")).await;

        let mut batch = WriteBatch::default();
        batch.upserts.insert("1".to_string(), doc("new"));
        batch.upserts.insert("2".to_string(), doc("added"));
        batch.deletes.insert("3".to_string());
        mirror.commit(Collection::Courses, batch).await.unwrap();

        let docs = mirror.list_all(Collection::Courses).await.unwrap();
        assert_eq!(docs.keys().cloned().collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(docs["1"], doc("new"));
        assert_eq!(mirror.commit_count(), 1);
    }

    #[tokio::test]
    async fn rejected_commit_changes_nothing() {
        let mirror = InMemoryMirror::new();
        mirror.insert_raw(Collection::Schedules, "1", doc("keep")).await;
        mirror.reject_commits(Collection::Schedules, true);

        let mut batch = WriteBatch::default();
        batch.deletes.insert("1".to_string());
        assert!(mirror.commit(Collection::Schedules, batch).await.is_err());
        assert_eq!(mirror.list_all(Collection::Schedules).await.unwrap().len(), 1);
        assert_eq!(mirror.commit_count(), 0);
    }

    #[tokio::test]
    async fn offline_mirror_is_unavailable() {
        let mirror = InMemoryMirror::new();
        mirror.set_offline(true);
        assert!(matches!(mirror.ping().await, Err(MirrorError::Unavailable(_))));
        assert!(matches!(
            mirror.list_all(Collection::Courses).await,
            Err(MirrorError::Unavailable(_))
        ));
    }
}
