use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{CourseStore, Repository, ScheduleStore};
use crate::error::AppError;
use crate::models::{
    Course, CourseFilter, DayOfWeek, NewCourse, NewScheduleEntry, ScheduleEntry, ScheduleFilter,
};

/// A saved schedule entry plus any non-blocking remarks about it.
#[derive(Debug, Clone, Serialize)]
pub struct SavedSchedule {
    #[serde(flatten)]
    pub entry: ScheduleEntry,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Validated create/update/delete over courses and their schedules.
///
/// Duplicate checks run before the insert without a transaction around them,
/// so two concurrent creates of the same slot can both succeed.
#[derive(Clone)]
pub struct CatalogService {
    courses: CourseStore,
    schedules: ScheduleStore,
}

impl CatalogService {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            courses: CourseStore::new(db.clone()),
            schedules: ScheduleStore::new(db),
        }
    }

    pub fn courses(&self) -> &CourseStore {
        &self.courses
    }

    pub fn schedules(&self) -> &ScheduleStore {
        &self.schedules
    }

    pub async fn list_courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, AppError> {
        self.courses.find_by(filter).await
    }

    pub async fn get_course(&self, id: i64) -> Result<Course, AppError> {
        self.courses.get_by_id(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn create_course(&self, req: NewCourse) -> Result<Course, AppError> {
        let course = req.validate()?;

        if let Some(existing) = self
            .courses
            .find_by_slot(course.day_of_week, &course.time_of_day, &course.course_type)
            .await?
        {
            return Err(AppError::DuplicateConflict(format!(
                "A course with the same day, time, and type already exists (id {})",
                existing.id
            )));
        }

        let id = self.courses.insert(&course).await?;
        info!("created course {} ({} {} {})", id, course.day_of_week, course.time_of_day, course.course_type);
        Ok(Course { id, ..course })
    }

    pub async fn update_course(&self, id: i64, req: NewCourse) -> Result<Course, AppError> {
        let course = Course { id, ..req.validate()? };
        if self.courses.update(&course).await? == 0 {
            return Err(AppError::NotFound);
        }
        Ok(course)
    }

    pub async fn course_types(&self) -> Result<Vec<String>, AppError> {
        self.courses.distinct_types().await
    }

    pub async fn course_days(&self) -> Result<Vec<DayOfWeek>, AppError> {
        self.courses.days_with_courses().await
    }

    pub async fn list_schedules(&self, filter: &ScheduleFilter) -> Result<Vec<ScheduleEntry>, AppError> {
        self.schedules.find_by(filter).await
    }

    pub async fn get_schedule(&self, id: i64) -> Result<ScheduleEntry, AppError> {
        self.schedules.get_by_id(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn create_schedule(&self, req: NewScheduleEntry) -> Result<SavedSchedule, AppError> {
        let entry = req.validate()?;
        let course = self.course_for(&entry).await?;

        let same_day = ScheduleFilter {
            course_id: Some(entry.course_id),
            date: Some(entry.date),
            ..ScheduleFilter::default()
        };
        if !self.schedules.find_by(&same_day).await?.is_empty() {
            return Err(AppError::DuplicateConflict(
                "A schedule for this course and date already exists".to_string(),
            ));
        }

        let id = self.schedules.insert(&entry).await?;
        info!("created schedule {} for course {} on {}", id, entry.course_id, entry.date);
        let entry = ScheduleEntry { id, ..entry };
        let warnings = weekday_warnings(&course, &entry);
        Ok(SavedSchedule { entry, warnings })
    }

    pub async fn update_schedule(&self, id: i64, req: NewScheduleEntry) -> Result<SavedSchedule, AppError> {
        let entry = ScheduleEntry { id, ..req.validate()? };
        let course = self.course_for(&entry).await?;

        if self.schedules.update(&entry).await? == 0 {
            return Err(AppError::NotFound);
        }
        let warnings = weekday_warnings(&course, &entry);
        Ok(SavedSchedule { entry, warnings })
    }

    pub async fn delete_schedule(&self, id: i64) -> Result<(), AppError> {
        if self.schedules.delete(id).await? == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn course_for(&self, entry: &ScheduleEntry) -> Result<Course, AppError> {
        self.courses.get_by_id(entry.course_id).await?.ok_or_else(|| {
            AppError::ReferentialIntegrity(format!("course {} does not exist", entry.course_id))
        })
    }
}

fn weekday_warnings(course: &Course, entry: &ScheduleEntry) -> Vec<String> {
    let actual = DayOfWeek::of_date(entry.date);
    if actual == course.day_of_week {
        return Vec::new();
    }
    let message = format!(
        "Selected date {} is a {} but the course runs on {}",
        entry.date, actual, course.day_of_week
    );
    warn!("schedule {}: {}", entry.id, message);
    vec![message]
}
