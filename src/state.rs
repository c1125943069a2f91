use std::sync::Arc;

use sqlx::SqlitePool;

use crate::remote::RemoteMirror;
use crate::services::{CatalogService, SyncService};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub catalog: CatalogService,
    pub sync: SyncService,
}

impl AppState {
    pub fn new(db: SqlitePool, mirror: Arc<dyn RemoteMirror>) -> Self {
        Self {
            catalog: CatalogService::new(db.clone()),
            sync: SyncService::new(db.clone(), mirror),
            db,
        }
    }
}
