use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, sqlite::SqliteRow};

use super::DayOfWeek;
use crate::error::AppError;

pub const MAX_CAPACITY: i64 = 100;
pub const MAX_DURATION_MINUTES: i64 = 300;
pub const MAX_PRICE: f64 = 1000.0;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub day_of_week: DayOfWeek,
    pub time_of_day: String,
    pub capacity: i64,
    pub duration_minutes: i64,
    pub price: f64,
    #[serde(rename = "type")]
    pub course_type: String,
    pub description: Option<String>,
}

impl<'r> FromRow<'r, SqliteRow> for Course {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let day: String = row.try_get("day_of_week")?;
        let day_of_week = day.parse::<DayOfWeek>().map_err(|e| sqlx::Error::ColumnDecode {
            index: "day_of_week".to_string(),
            source: Box::new(e),
        })?;

        Ok(Course {
            id: row.try_get("id")?,
            day_of_week,
            time_of_day: row.try_get("time_of_day")?,
            capacity: row.try_get("capacity")?,
            duration_minutes: row.try_get("duration_minutes")?,
            price: row.try_get("price")?,
            course_type: row.try_get("course_type")?,
            description: row.try_get("description")?,
        })
    }
}

/// Course as submitted by a client, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourse {
    pub day_of_week: String,
    pub time_of_day: String,
    pub capacity: i64,
    pub duration_minutes: i64,
    pub price: f64,
    #[serde(rename = "type")]
    pub course_type: String,
    pub description: Option<String>,
}

impl NewCourse {
    /// Checks every field and returns an unsaved course (`id` 0).
    pub fn validate(self) -> Result<Course, AppError> {
        let mut problems = Vec::new();

        let day_of_week = match self.day_of_week.trim().parse::<DayOfWeek>() {
            Ok(day) => Some(day),
            Err(_) => {
                problems.push(format!(
                    "day_of_week must be one of Monday..Sunday, got {:?}",
                    self.day_of_week
                ));
                None
            }
        };

        let time_of_day = self.time_of_day.trim().to_string();
        if !is_valid_time_of_day(&time_of_day) {
            problems.push(format!("time_of_day must be HH:MM (24-hour), got {:?}", self.time_of_day));
        }

        if self.capacity < 1 {
            problems.push("Capacity must be greater than 0".to_string());
        } else if self.capacity > MAX_CAPACITY {
            problems.push(format!("Capacity cannot exceed {}", MAX_CAPACITY));
        }

        if self.duration_minutes < 1 {
            problems.push("Duration must be greater than 0".to_string());
        } else if self.duration_minutes > MAX_DURATION_MINUTES {
            problems.push(format!("Duration cannot exceed {} minutes", MAX_DURATION_MINUTES));
        }

        if !self.price.is_finite() || self.price <= 0.0 {
            problems.push("Price must be greater than 0".to_string());
        } else if self.price > MAX_PRICE {
            problems.push(format!("Price cannot exceed {}", MAX_PRICE));
        }

        let course_type = self.course_type.trim().to_string();
        if course_type.is_empty() {
            problems.push("Type is required".to_string());
        }

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if let Some(d) = &description {
            let length = d.chars().count();
            if length > MAX_DESCRIPTION_CHARS {
                problems.push(format!(
                    "Description too long ({}/{})",
                    length, MAX_DESCRIPTION_CHARS
                ));
            }
        }

        match day_of_week {
            Some(day_of_week) if problems.is_empty() => Ok(Course {
                id: 0,
                day_of_week,
                time_of_day,
                capacity: self.capacity,
                duration_minutes: self.duration_minutes,
                price: self.price,
                course_type,
                description,
            }),
            _ => Err(AppError::Validation(problems.join("; "))),
        }
    }
}

fn is_valid_time_of_day(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 5
        && bytes[2] == b':'
        && [0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit())
        && NaiveTime::parse_from_str(value, "%H:%M").is_ok()
}

/// Query parameters accepted by course listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseFilter {
    /// Substring matched against type, day and description.
    #[serde(default, rename = "q")]
    pub query: Option<String>,
    #[serde(default, rename = "type")]
    pub course_type: Option<String>,
    #[serde(default, rename = "day")]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewCourse {
        NewCourse {
            day_of_week: "Monday".to_string(),
            time_of_day: "10:00".to_string(),
            capacity: 15,
            duration_minutes: 60,
            price: 20.0,
            course_type: "Hatha Yoga".to_string(),
            description: None,
        }
    }

    fn with_price(price: f64) -> NewCourse {
        NewCourse { price, ..sample() }
    }

    #[test]
    fn price_boundaries() {
        assert!(with_price(0.0).validate().is_err());
        assert!(with_price(0.01).validate().is_ok());
        assert!(with_price(1000.0).validate().is_ok());
        assert!(with_price(1000.01).validate().is_err());
        assert!(with_price(f64::NAN).validate().is_err());
    }

    #[test]
    fn capacity_and_duration_boundaries() {
        assert!(NewCourse { capacity: 0, ..sample() }.validate().is_err());
        assert!(NewCourse { capacity: 1, ..sample() }.validate().is_ok());
        assert!(NewCourse { capacity: 100, ..sample() }.validate().is_ok());
        assert!(NewCourse { capacity: 101, ..sample() }.validate().is_err());
        assert!(NewCourse { duration_minutes: 0, ..sample() }.validate().is_err());
        assert!(NewCourse { duration_minutes: 300, ..sample() }.validate().is_ok());
        assert!(NewCourse { duration_minutes: 301, ..sample() }.validate().is_err());
    }

    #[test]
    fn time_of_day_must_be_zero_padded_24h() {
        for bad in ["7:30", "24:00", "12:60", "noon", "", "07: 3", " 7:30", "+7:30"] {
            let course = NewCourse { time_of_day: bad.to_string(), ..sample() };
            assert!(course.validate().is_err(), "{bad} should be rejected");
        }
        let ok = NewCourse { time_of_day: "07:30".to_string(), ..sample() };
        assert_eq!(ok.validate().unwrap().time_of_day, "07:30");
    }

    #[test]
    fn day_and_type_are_required() {
        assert!(NewCourse { day_of_week: "Funday".to_string(), ..sample() }.validate().is_err());
        assert!(NewCourse { course_type: "   ".to_string(), ..sample() }.validate().is_err());
    }

    #[test]
    fn description_length_limit() {
        let long = NewCourse { description: Some("a".repeat(501)), ..sample() };
        assert!(long.validate().is_err());
        let fits = NewCourse { description: Some("a".repeat(500)), ..sample() };
        assert!(fits.validate().is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let err = NewCourse { capacity: 0, price: 0.0, ..sample() }
            .validate()
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Capacity"));
        assert!(message.contains("Price"));
    }

    #[test]
    fn blank_description_becomes_none() {
        let course = NewCourse { description: Some("  ".to_string()), ..sample() }
            .validate()
            .unwrap();
        assert_eq!(course.description, None);
    }
}
