use std::time::Duration;

use tracing::{info, warn};

use crate::error::AppError;
use crate::services::sync_service::{SyncService, SyncStats};

/// Periodic remote sync. Each tick is an independent `sync_all` call; a
/// failed tick is logged and the next one runs on schedule.
pub struct SyncScheduler {
    service: SyncService,
    interval: Duration,
}

impl SyncScheduler {
    pub fn new(service: SyncService, interval: Duration) -> Self {
        Self { service, interval }
    }

    pub async fn start(self) {
        info!("Starting auto-sync scheduler (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            match self.run_sync().await {
                Ok(stats) => {
                    info!(
                        "Auto-sync completed - courses: {} upserted, {} deleted | schedules: {} upserted, {} deleted",
                        stats.courses.upserted,
                        stats.courses.deleted,
                        stats.schedules.upserted,
                        stats.schedules.deleted
                    );
                }
                Err(e) => {
                    warn!("Auto-sync failed: {}", e);
                }
            }
        }
    }

    async fn run_sync(&self) -> Result<SyncStats, AppError> {
        self.service.sync_all().await
    }
}
