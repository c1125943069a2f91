pub mod catalog;
pub mod scheduler;
pub mod sync_service;

pub use catalog::{CatalogService, SavedSchedule};
pub use scheduler::SyncScheduler;
pub use sync_service::{RemoteResetStats, SyncService, SyncStats, WipeStats};
