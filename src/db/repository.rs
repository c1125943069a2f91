use async_trait::async_trait;

use crate::error::AppError;

/// CRUD and query access over one table of the local store.
///
/// Every mutating call is committed before it returns. `update` and `delete`
/// report the number of rows touched; zero is not an error at this level.
#[async_trait]
pub trait Repository: Send + Sync {
    type Entity: Send + Sync;
    type Filter: Send + Sync;

    /// Persists `entity` under a fresh id (its own `id` is ignored).
    async fn insert(&self, entity: &Self::Entity) -> Result<i64, AppError>;

    /// Replaces every column of the row matching `entity.id`.
    async fn update(&self, entity: &Self::Entity) -> Result<u64, AppError>;

    async fn delete(&self, id: i64) -> Result<u64, AppError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Self::Entity>, AppError>;

    async fn get_all(&self) -> Result<Vec<Self::Entity>, AppError>;

    async fn find_by(&self, filter: &Self::Filter) -> Result<Vec<Self::Entity>, AppError>;

    async fn delete_all(&self) -> Result<u64, AppError>;

    async fn count(&self) -> Result<i64, AppError>;
}
