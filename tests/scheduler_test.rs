use std::sync::Arc;
use std::time::Duration;

use yoga_admin::db;
use yoga_admin::remote::{Collection, InMemoryMirror, RemoteMirror};
use yoga_admin::services::{SyncScheduler, SyncService};

#[tokio::test]
async fn test_scheduler_short_interval() {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create database");

    sqlx::query(
        "INSERT INTO courses (day_of_week, time_of_day, capacity, duration_minutes, price, course_type)
         VALUES ('Monday', '10:00', 10, 60, 12.0, 'Hatha')",
    )
    .execute(&pool)
    .await
    .expect("Failed to seed course");

    let mirror = Arc::new(InMemoryMirror::new());
    let service = SyncService::new(pool, mirror.clone());

    let scheduler = SyncScheduler::new(service, Duration::from_millis(100));
    let scheduler_task = tokio::spawn(async move {
        scheduler.start().await;
    });

    tokio::time::sleep(Duration::from_millis(450)).await;
    scheduler_task.abort();

    // Each tick re-uploads the course as one batch; schedules stay empty.
    assert!(mirror.commit_count() >= 2);
    let remote = mirror
        .list_all(Collection::Courses)
        .await
        .expect("Failed to list remote");
    assert!(remote.contains_key("1"));
}

#[tokio::test]
async fn test_scheduler_survives_failed_ticks() {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create database");
    sqlx::query(
        "INSERT INTO courses (day_of_week, time_of_day, capacity, duration_minutes, price, course_type)
         VALUES ('Friday', '07:30', 8, 45, 9.0, 'Pilates')",
    )
    .execute(&pool)
    .await
    .expect("Failed to seed course");

    let mirror = Arc::new(InMemoryMirror::new());
    mirror.set_offline(true);
    let service = SyncService::new(pool, mirror.clone());

    let scheduler_task = tokio::spawn(SyncScheduler::new(service, Duration::from_millis(100)).start());

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(mirror.commit_count(), 0);

    mirror.set_offline(false);
    tokio::time::sleep(Duration::from_millis(300)).await;
    scheduler_task.abort();

    assert!(mirror.commit_count() >= 1);
}
