use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

pub const MIN_TEACHER_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ScheduleEntry {
    pub id: i64,
    pub course_id: i64,
    pub date: NaiveDate,
    pub teacher: String,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewScheduleEntry {
    pub course_id: i64,
    pub date: String,
    pub teacher: String,
    pub comments: Option<String>,
}

impl NewScheduleEntry {
    /// Checks every field and returns an unsaved entry (`id` 0).
    pub fn validate(self) -> Result<ScheduleEntry, AppError> {
        let mut problems = Vec::new();

        let raw_date = self.date.trim();
        let date = if raw_date.is_empty() {
            problems.push("Date is required".to_string());
            None
        } else {
            match NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") {
                Ok(date) if is_iso_date_shape(raw_date) => Some(date),
                _ => {
                    problems.push(format!("Invalid date format (YYYY-MM-DD): {:?}", self.date));
                    None
                }
            }
        };

        let teacher = self.teacher.trim().to_string();
        if teacher.is_empty() {
            problems.push("Teacher name is required".to_string());
        } else if teacher.chars().count() < MIN_TEACHER_CHARS {
            problems.push(format!(
                "Teacher name must be at least {} characters",
                MIN_TEACHER_CHARS
            ));
        }

        let comments = self
            .comments
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        match date {
            Some(date) if problems.is_empty() => Ok(ScheduleEntry {
                id: 0,
                course_id: self.course_id,
                date,
                teacher,
                comments,
            }),
            _ => Err(AppError::Validation(problems.join("; "))),
        }
    }
}

/// `YYYY-MM-DD` with every digit present.
fn is_iso_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleFilter {
    /// Substring matched against teacher and comments.
    #[serde(default, rename = "q")]
    pub query: Option<String>,
    #[serde(default)]
    pub course_id: Option<i64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub teacher: Option<String>,
}

impl ScheduleFilter {
    pub fn for_course(course_id: i64) -> Self {
        Self {
            course_id: Some(course_id),
            ..Self::default()
        }
    }
}
