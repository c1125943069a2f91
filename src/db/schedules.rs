use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::Repository;
use crate::db::courses::non_blank;
use crate::error::AppError;
use crate::models::{ScheduleEntry, ScheduleFilter};

const SCHEDULE_COLUMNS: &str = "id, course_id, date, teacher, comments";

#[derive(Clone)]
pub struct ScheduleStore {
    db: SqlitePool,
}

impl ScheduleStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Repository for ScheduleStore {
    type Entity = ScheduleEntry;
    type Filter = ScheduleFilter;

    async fn insert(&self, entry: &ScheduleEntry) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO schedules (course_id, date, teacher, comments)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(entry.course_id)
        .bind(entry.date)
        .bind(&entry.teacher)
        .bind(&entry.comments)
        .execute(&self.db)
        .await
        .map_err(|e| AppError::from_schedule_write(e, entry.course_id))?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, entry: &ScheduleEntry) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE schedules
            SET course_id = ?1,
                date = ?2,
                teacher = ?3,
                comments = ?4
            WHERE id = ?5
            "#,
        )
        .bind(entry.course_id)
        .bind(entry.date)
        .bind(&entry.teacher)
        .bind(&entry.comments)
        .bind(entry.id)
        .execute(&self.db)
        .await
        .map_err(|e| AppError::from_schedule_write(e, entry.course_id))?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ScheduleEntry>, AppError> {
        let sql = format!("SELECT {} FROM schedules WHERE id = ?", SCHEDULE_COLUMNS);
        let entry = sqlx::query_as::<_, ScheduleEntry>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(entry)
    }

    async fn get_all(&self) -> Result<Vec<ScheduleEntry>, AppError> {
        self.find_by(&ScheduleFilter::default()).await
    }

    async fn find_by(&self, filter: &ScheduleFilter) -> Result<Vec<ScheduleEntry>, AppError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM schedules WHERE 1 = 1", SCHEDULE_COLUMNS));

        if let Some(query) = non_blank(&filter.query) {
            qb.push(" AND (instr(lower(teacher), lower(")
                .push_bind(query.clone())
                .push(")) > 0 OR instr(lower(coalesce(comments, '')), lower(")
                .push_bind(query)
                .push(")) > 0)");
        }
        if let Some(course_id) = filter.course_id {
            qb.push(" AND course_id = ").push_bind(course_id);
        }
        if let Some(date) = filter.date {
            qb.push(" AND date = ").push_bind(date);
        }
        if let Some(teacher) = non_blank(&filter.teacher) {
            qb.push(" AND instr(lower(teacher), lower(")
                .push_bind(teacher)
                .push(")) > 0");
        }
        qb.push(" ORDER BY date ASC, id ASC");

        let entries = qb
            .build_query_as::<ScheduleEntry>()
            .fetch_all(&self.db)
            .await?;
        Ok(entries)
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM schedules").execute(&self.db).await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM schedules")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}
