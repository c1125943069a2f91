use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::Repository;
use crate::error::AppError;
use crate::models::{Course, CourseFilter, DayOfWeek};

const COURSE_COLUMNS: &str =
    "id, day_of_week, time_of_day, capacity, duration_minutes, price, course_type, description";

#[derive(Clone)]
pub struct CourseStore {
    db: SqlitePool,
}

impl CourseStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    fn order_by() -> String {
        format!(
            " ORDER BY {}, time_of_day ASC, id ASC",
            DayOfWeek::order_sql("day_of_week")
        )
    }

    /// Course occupying the exact (day, time, type) slot, if any.
    pub async fn find_by_slot(
        &self,
        day_of_week: DayOfWeek,
        time_of_day: &str,
        course_type: &str,
    ) -> Result<Option<Course>, AppError> {
        let sql = format!(
            "SELECT {} FROM courses WHERE day_of_week = ? AND time_of_day = ? AND course_type = ? LIMIT 1",
            COURSE_COLUMNS
        );
        let course = sqlx::query_as::<_, Course>(&sql)
            .bind(day_of_week.as_str())
            .bind(time_of_day)
            .bind(course_type)
            .fetch_optional(&self.db)
            .await?;
        Ok(course)
    }

    /// Every course type in use, alphabetically.
    pub async fn distinct_types(&self) -> Result<Vec<String>, AppError> {
        let types = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT course_type FROM courses ORDER BY course_type",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(types)
    }

    /// Weekdays that have at least one course, in week order.
    pub async fn days_with_courses(&self) -> Result<Vec<DayOfWeek>, AppError> {
        let days = sqlx::query_scalar::<_, String>("SELECT DISTINCT day_of_week FROM courses")
            .fetch_all(&self.db)
            .await?;

        let mut days: Vec<DayOfWeek> = days
            .iter()
            .filter_map(|d| d.parse::<DayOfWeek>().ok())
            .collect();
        days.sort();
        Ok(days)
    }
}

#[async_trait]
impl Repository for CourseStore {
    type Entity = Course;
    type Filter = CourseFilter;

    async fn insert(&self, course: &Course) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO courses
                (day_of_week, time_of_day, capacity, duration_minutes, price, course_type, description)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(course.day_of_week.as_str())
        .bind(&course.time_of_day)
        .bind(course.capacity)
        .bind(course.duration_minutes)
        .bind(course.price)
        .bind(&course.course_type)
        .bind(&course.description)
        .execute(&self.db)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, course: &Course) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE courses
            SET day_of_week = ?1,
                time_of_day = ?2,
                capacity = ?3,
                duration_minutes = ?4,
                price = ?5,
                course_type = ?6,
                description = ?7
            WHERE id = ?8
            "#,
        )
        .bind(course.day_of_week.as_str())
        .bind(&course.time_of_day)
        .bind(course.capacity)
        .bind(course.duration_minutes)
        .bind(course.price)
        .bind(&course.course_type)
        .bind(&course.description)
        .bind(course.id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Course>, AppError> {
        let sql = format!("SELECT {} FROM courses WHERE id = ?", COURSE_COLUMNS);
        let course = sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(course)
    }

    async fn get_all(&self) -> Result<Vec<Course>, AppError> {
        self.find_by(&CourseFilter::default()).await
    }

    async fn find_by(&self, filter: &CourseFilter) -> Result<Vec<Course>, AppError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM courses WHERE 1 = 1", COURSE_COLUMNS));

        if let Some(query) = non_blank(&filter.query) {
            qb.push(" AND (instr(lower(course_type), lower(")
                .push_bind(query.clone())
                .push(")) > 0 OR instr(lower(day_of_week), lower(")
                .push_bind(query.clone())
                .push(")) > 0 OR instr(lower(coalesce(description, '')), lower(")
                .push_bind(query)
                .push(")) > 0)");
        }
        if let Some(course_type) = non_blank(&filter.course_type) {
            qb.push(" AND instr(lower(course_type), lower(")
                .push_bind(course_type)
                .push(")) > 0");
        }
        if let Some(day) = filter.day_of_week {
            qb.push(" AND day_of_week = ").push_bind(day.as_str());
        }
        if let Some(min_price) = filter.min_price {
            qb.push(" AND price >= ").push_bind(min_price);
        }
        if let Some(max_price) = filter.max_price {
            qb.push(" AND price <= ").push_bind(max_price);
        }
        qb.push(Self::order_by());

        let courses = qb.build_query_as::<Course>().fetch_all(&self.db).await?;
        Ok(courses)
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM courses").execute(&self.db).await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
