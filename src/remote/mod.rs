pub mod firestore;
pub mod memory;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use firestore::{FirestoreClient, FirestoreConfig};
pub use memory::InMemoryMirror;

/// Field map of one mirrored record.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Remote collection, one per local table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Courses,
    Schedules,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Courses, Collection::Schedules];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Courses => "courses",
            Collection::Schedules => "schedules",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes applied to one collection in a single atomic commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    pub upserts: BTreeMap<String, Document>,
    pub deletes: BTreeSet<String>,
}

impl WriteBatch {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.upserts.len() + self.deletes.len()
    }
}

#[derive(Debug, Error)]
pub enum MirrorError {
    /// The mirror could not be reached or is not configured.
    #[error("{0}")]
    Unavailable(String),

    /// The mirror was reached but refused or failed the request.
    #[error("{0}")]
    Rejected(String),
}

/// Document store holding a non-authoritative copy of the local tables.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    /// Cheap round trip used as a connection test.
    async fn ping(&self) -> Result<(), MirrorError>;

    async fn list_all(&self, collection: Collection) -> Result<BTreeMap<String, Document>, MirrorError>;

    /// Applies every upsert and delete in `batch`, or none of them.
    async fn commit(&self, collection: Collection, batch: WriteBatch) -> Result<(), MirrorError>;

    /// Removes every document in `collection`; returns how many were removed.
    async fn delete_all(&self, collection: Collection) -> Result<usize, MirrorError>;
}

/// Stand-in used when no remote is configured.
pub struct DisabledMirror;

const NOT_CONFIGURED: &str = "remote mirror is not configured";

#[async_trait]
impl RemoteMirror for DisabledMirror {
    async fn ping(&self) -> Result<(), MirrorError> {
        Err(MirrorError::Unavailable(NOT_CONFIGURED.to_string()))
    }

    async fn list_all(&self, _collection: Collection) -> Result<BTreeMap<String, Document>, MirrorError> {
        Err(MirrorError::Unavailable(NOT_CONFIGURED.to_string()))
    }

    async fn commit(&self, _collection: Collection, _batch: WriteBatch) -> Result<(), MirrorError> {
        Err(MirrorError::Unavailable(NOT_CONFIGURED.to_string()))
    }

    async fn delete_all(&self, _collection: Collection) -> Result<usize, MirrorError> {
        Err(MirrorError::Unavailable(NOT_CONFIGURED.to_string()))
    }
}
