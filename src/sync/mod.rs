pub mod plan;

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::error::AppError;
use crate::remote::{Collection, MirrorError, RemoteMirror, WriteBatch};

pub use plan::{LAST_UPDATED, MirrorDocument, plan, without_stamp};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileOutcome {
    pub collection: Collection,
    pub upserted: usize,
    pub deleted: usize,
}

/// Converges remote collections onto local records, one atomic batch per
/// collection. Never retries and never writes locally.
#[derive(Clone)]
pub struct Reconciler {
    mirror: Arc<dyn RemoteMirror>,
}

impl Reconciler {
    pub fn new(mirror: Arc<dyn RemoteMirror>) -> Self {
        Self { mirror }
    }

    pub async fn reconcile<E>(&self, local: &[E]) -> Result<ReconcileOutcome, AppError>
    where
        E: MirrorDocument + Sync,
    {
        let collection = E::COLLECTION;

        let remote = self
            .mirror
            .list_all(collection)
            .await
            .map_err(|e| mirror_failure(collection, e))?;

        let stamp = chrono::Utc::now().timestamp_millis();
        let batch = plan(local, remote.keys(), stamp);
        let outcome = ReconcileOutcome {
            collection,
            upserted: batch.upserts.len(),
            deleted: batch.deletes.len(),
        };

        if batch.is_empty() {
            info!("{}: nothing to sync", collection);
            return Ok(outcome);
        }

        self.mirror.commit(collection, batch).await.map_err(|e| {
            error!("{}: batch commit failed: {}", collection, e);
            AppError::RemoteSync {
                step: collection.to_string(),
                completed: Vec::new(),
                message: e.to_string(),
            }
        })?;

        info!(
            "{}: synced {} documents, deleted {}",
            collection, outcome.upserted, outcome.deleted
        );
        Ok(outcome)
    }

    /// Deletes every document in `collection` without looking at local state.
    pub async fn clear(&self, collection: Collection) -> Result<usize, AppError> {
        let removed = self
            .mirror
            .delete_all(collection)
            .await
            .map_err(|e| mirror_failure(collection, e))?;
        info!("{}: cleared {} remote documents", collection, removed);
        Ok(removed)
    }

    /// Deletes single documents by id as one batch. Ids missing remotely are
    /// not an error.
    pub async fn remove(&self, collection: Collection, ids: &[i64]) -> Result<usize, AppError> {
        let batch = WriteBatch {
            deletes: ids.iter().map(i64::to_string).collect(),
            ..WriteBatch::default()
        };
        let removed = batch.len();
        if batch.is_empty() {
            return Ok(0);
        }

        self.mirror
            .commit(collection, batch)
            .await
            .map_err(|e| mirror_failure(collection, e))?;
        info!("{}: removed {} remote documents", collection, removed);
        Ok(removed)
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.mirror.ping().await.map_err(|e| match e {
            MirrorError::Unavailable(msg) => AppError::RemoteUnavailable(msg),
            MirrorError::Rejected(msg) => AppError::RemoteSync {
                step: "connection test".to_string(),
                completed: Vec::new(),
                message: msg,
            },
        })
    }
}

fn mirror_failure(collection: Collection, err: MirrorError) -> AppError {
    match err {
        MirrorError::Unavailable(msg) => AppError::RemoteUnavailable(msg),
        MirrorError::Rejected(msg) => {
            error!("{}: remote request failed: {}", collection, msg);
            AppError::RemoteSync {
                step: collection.to_string(),
                completed: Vec::new(),
                message: msg,
            }
        }
    }
}
