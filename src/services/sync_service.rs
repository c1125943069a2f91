use std::sync::Arc;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{CourseStore, Repository, ScheduleStore};
use crate::error::AppError;
use crate::remote::{Collection, RemoteMirror};
use crate::sync::{ReconcileOutcome, Reconciler};

#[derive(Clone)]
pub struct SyncService {
    courses: CourseStore,
    schedules: ScheduleStore,
    reconciler: Reconciler,
}

#[derive(Debug, Serialize)]
pub struct SyncStats {
    pub courses: ReconcileOutcome,
    pub schedules: ReconcileOutcome,
}

#[derive(Debug, Default, Serialize)]
pub struct RemoteResetStats {
    pub courses_removed: usize,
    pub schedules_removed: usize,
}

#[derive(Debug, Serialize)]
pub struct WipeStats {
    pub local_courses_removed: u64,
    pub local_schedules_removed: i64,
    pub remote: RemoteResetStats,
}

impl SyncService {
    pub fn new(db: SqlitePool, mirror: Arc<dyn RemoteMirror>) -> Self {
        Self {
            courses: CourseStore::new(db.clone()),
            schedules: ScheduleStore::new(db),
            reconciler: Reconciler::new(mirror),
        }
    }

    /// Syncs courses, then schedules. A schedules failure leaves the courses
    /// step in place and names it in the error.
    pub async fn sync_all(&self) -> Result<SyncStats, AppError> {
        info!("Starting sync...");

        info!("Step 1: Syncing courses");
        let courses = self.courses.get_all().await?;
        let course_outcome = self.reconciler.reconcile(&courses).await?;

        info!("Step 2: Syncing schedules");
        let schedules = self.schedules.get_all().await?;
        let schedule_outcome = self
            .reconciler
            .reconcile(&schedules)
            .await
            .map_err(|e| after_step(Collection::Schedules, &[Collection::Courses], e))?;

        let stats = SyncStats {
            courses: course_outcome,
            schedules: schedule_outcome,
        };
        info!("Sync completed successfully: {:?}", stats);
        Ok(stats)
    }

    /// Empties both remote collections. Local data is not read or changed.
    pub async fn reset_remote(&self) -> Result<RemoteResetStats, AppError> {
        let courses_removed = self.reconciler.clear(Collection::Courses).await?;
        let schedules_removed = self
            .reconciler
            .clear(Collection::Schedules)
            .await
            .map_err(|e| after_step(Collection::Schedules, &[Collection::Courses], e))?;

        info!("Remote reset complete");
        Ok(RemoteResetStats {
            courses_removed,
            schedules_removed,
        })
    }

    /// Clears local data, then the remote. The local wipe stands even when
    /// the remote part fails.
    pub async fn wipe_all(&self) -> Result<WipeStats, AppError> {
        let local_schedules_removed = self.schedules.count().await?;
        let local_courses_removed = self.courses.delete_all().await?;
        info!(
            "Local store cleared: {} courses, {} schedules",
            local_courses_removed, local_schedules_removed
        );

        let remote = self.reset_remote().await.map_err(|e| {
            warn!("Local store cleared, but remote reset failed: {}", e);
            AppError::RemoteSync {
                step: "remote reset".to_string(),
                completed: vec!["local data".to_string()],
                message: e.to_string(),
            }
        })?;

        Ok(WipeStats {
            local_courses_removed,
            local_schedules_removed,
            remote,
        })
    }

    /// Deletes a course locally (its schedules cascade), then its remote
    /// document. The local delete stands even when the remote part fails.
    pub async fn delete_course(&self, id: i64) -> Result<(), AppError> {
        if self.courses.delete(id).await? == 0 {
            return Err(AppError::NotFound);
        }
        info!("deleted course {}", id);

        self.reconciler
            .remove(Collection::Courses, &[id])
            .await
            .map_err(|e| {
                warn!("Course {} deleted locally, but remote delete failed: {}", id, e);
                AppError::RemoteSync {
                    step: "remote delete".to_string(),
                    completed: vec!["local delete".to_string()],
                    message: e.to_string(),
                }
            })?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.reconciler.ping().await
    }
}

fn after_step(step: Collection, completed: &[Collection], err: AppError) -> AppError {
    match err {
        AppError::RemoteSync { message, .. } | AppError::RemoteUnavailable(message) => {
            AppError::RemoteSync {
                step: step.to_string(),
                completed: completed.iter().map(Collection::to_string).collect(),
                message,
            }
        }
        other => other,
    }
}
