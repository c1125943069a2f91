use chrono::NaiveDate;
use proptest::prelude::*;

use yoga_admin::db::{self, CourseStore, Repository, ScheduleStore};
use yoga_admin::models::{Course, DayOfWeek, ScheduleEntry};

fn course(day: DayOfWeek, time: String) -> Course {
    Course {
        id: 0,
        day_of_week: day,
        time_of_day: time,
        capacity: 15,
        duration_minutes: 60,
        price: 12.0,
        course_type: "Vinyasa".to_string(),
        description: Some("all levels".to_string()),
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
}

fn slot() -> impl Strategy<Value = (usize, u32, u32)> {
    (0usize..7, 0u32..24, 0u32..60)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn listing_is_ordered_by_weekday_then_time(slots in prop::collection::vec(slot(), 1..12)) {
        let listed = runtime().block_on(async {
            let pool = db::connect_in_memory().await.expect("Failed to create database");
            let store = CourseStore::new(pool);
            for (day, hour, minute) in &slots {
                let c = course(DayOfWeek::ALL[*day], format!("{:02}:{:02}", hour, minute));
                store.insert(&c).await.expect("Failed to insert course");
            }
            store.get_all().await.expect("Failed to list courses")
        });

        prop_assert_eq!(listed.len(), slots.len());
        for pair in listed.windows(2) {
            let a = (pair[0].day_of_week, pair[0].time_of_day.as_str(), pair[0].id);
            let b = (pair[1].day_of_week, pair[1].time_of_day.as_str(), pair[1].id);
            prop_assert!(a < b, "{:?} listed before {:?}", a, b);
        }
    }

    #[test]
    fn schedules_are_ordered_by_date(days in prop::collection::vec(0i64..365, 1..12)) {
        let listed = runtime().block_on(async {
            let pool = db::connect_in_memory().await.expect("Failed to create database");
            let courses = CourseStore::new(pool.clone());
            let course_id = courses
                .insert(&course(DayOfWeek::Monday, "09:00".to_string()))
                .await
                .expect("Failed to insert course");

            let schedules = ScheduleStore::new(pool);
            let start = NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date");
            for offset in &days {
                let entry = ScheduleEntry {
                    id: 0,
                    course_id,
                    date: start + chrono::Duration::days(*offset),
                    teacher: "Lena".to_string(),
                    comments: None,
                };
                schedules.insert(&entry).await.expect("Failed to insert schedule");
            }
            schedules.get_all().await.expect("Failed to list schedules")
        });

        prop_assert_eq!(listed.len(), days.len());
        for pair in listed.windows(2) {
            prop_assert!((pair[0].date, pair[0].id) < (pair[1].date, pair[1].id));
        }
    }
}

#[tokio::test]
async fn stored_course_reads_back_unchanged() {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create database");
    let store = CourseStore::new(pool);

    let new = course(DayOfWeek::Saturday, "07:15".to_string());
    let id = store.insert(&new).await.expect("Failed to insert course");

    let stored = store
        .get_by_id(id)
        .await
        .expect("Failed to fetch course")
        .expect("Course missing");
    assert_eq!(stored, Course { id, ..new });
}

#[tokio::test]
async fn wiping_courses_removes_schedules() {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create database");
    let courses = CourseStore::new(pool.clone());
    let schedules = ScheduleStore::new(pool);

    let course_id = courses
        .insert(&course(DayOfWeek::Sunday, "17:00".to_string()))
        .await
        .expect("Failed to insert course");
    for day in 1..=3 {
        schedules
            .insert(&ScheduleEntry {
                id: 0,
                course_id,
                date: NaiveDate::from_ymd_opt(2025, 6, day).expect("valid date"),
                teacher: "Omar".to_string(),
                comments: None,
            })
            .await
            .expect("Failed to insert schedule");
    }

    assert_eq!(courses.delete_all().await.expect("Failed to wipe"), 1);
    assert_eq!(schedules.count().await.expect("Failed to count"), 0);
}
