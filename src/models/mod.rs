pub mod course;
pub mod day_of_week;
pub mod schedule;

pub use course::{Course, CourseFilter, NewCourse};
pub use day_of_week::DayOfWeek;
pub use schedule::{NewScheduleEntry, ScheduleEntry, ScheduleFilter};
