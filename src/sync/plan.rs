use std::collections::BTreeSet;

use serde_json::json;

use crate::models::{Course, ScheduleEntry};
use crate::remote::{Collection, Document, WriteBatch};

/// Field stamped on every mirrored document at sync time.
pub const LAST_UPDATED: &str = "lastUpdated";

/// A local record that can be mirrored as one remote document.
pub trait MirrorDocument {
    const COLLECTION: Collection;

    fn mirror_id(&self) -> i64;

    /// The record's fields, without the sync timestamp.
    fn to_document(&self) -> Document;
}

impl MirrorDocument for Course {
    const COLLECTION: Collection = Collection::Courses;

    fn mirror_id(&self) -> i64 {
        self.id
    }

    fn to_document(&self) -> Document {
        let value = json!({
            "id": self.id,
            "dayOfWeek": self.day_of_week.as_str(),
            "time": self.time_of_day,
            "capacity": self.capacity,
            "duration": self.duration_minutes,
            "price": self.price,
            "type": self.course_type,
            "description": self.description,
        });
        into_document(value)
    }
}

impl MirrorDocument for ScheduleEntry {
    const COLLECTION: Collection = Collection::Schedules;

    fn mirror_id(&self) -> i64 {
        self.id
    }

    fn to_document(&self) -> Document {
        let value = json!({
            "id": self.id,
            "courseId": self.course_id,
            "date": self.date.format("%Y-%m-%d").to_string(),
            "teacher": self.teacher,
            "comments": self.comments,
        });
        into_document(value)
    }
}

fn into_document(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// Strips the sync timestamp so documents can be compared by content.
pub fn without_stamp(document: &Document) -> Document {
    let mut document = document.clone();
    document.remove(LAST_UPDATED);
    document
}

/// Builds the batch that makes a remote collection equal to `local`.
///
/// Every local record is upserted unconditionally; remote ids with no local
/// counterpart are deleted.
pub fn plan<'a, E, I>(local: &[E], remote_ids: I, stamp_millis: i64) -> WriteBatch
where
    E: MirrorDocument,
    I: IntoIterator<Item = &'a String>,
{
    let mut batch = WriteBatch::default();

    for entity in local {
        let mut document = entity.to_document();
        document.insert(LAST_UPDATED.to_string(), json!(stamp_millis));
        batch.upserts.insert(entity.mirror_id().to_string(), document);
    }

    let stale: BTreeSet<String> = remote_ids
        .into_iter()
        .filter(|id| !batch.upserts.contains_key(id.as_str()))
        .cloned()
        .collect();
    batch.deletes = stale;

    batch
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use proptest::prelude::*;

    use super::*;
    use crate::models::DayOfWeek;

    fn course(id: i64) -> Course {
        Course {
            id,
            day_of_week: DayOfWeek::Thursday,
            time_of_day: "19:15".to_string(),
            capacity: 10,
            duration_minutes: 75,
            price: 18.5,
            course_type: "Vinyasa".to_string(),
            description: None,
        }
    }

    #[test]
    fn upserts_all_local_and_deletes_remote_only() {
        let remote = vec!["1".to_string(), "3".to_string()];
        let batch = plan(&[course(1), course(2)], &remote, 1_700_000_000_000);

        assert_eq!(batch.upserts.keys().cloned().collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(batch.deletes.iter().cloned().collect::<Vec<_>>(), vec!["3"]);
        assert_eq!(batch.upserts["2"][LAST_UPDATED], json!(1_700_000_000_000_i64));
    }

    #[test]
    fn empty_local_deletes_everything() {
        let remote = vec!["5".to_string(), "6".to_string()];
        let batch = plan::<Course, _>(&[], &remote, 0);
        assert!(batch.upserts.is_empty());
        assert_eq!(batch.deletes.len(), 2);
    }

    #[test]
    fn course_document_uses_mirror_field_names() {
        let document = course(4).to_document();
        assert_eq!(document["dayOfWeek"], json!("Thursday"));
        assert_eq!(document["time"], json!("19:15"));
        assert_eq!(document["duration"], json!(75));
        assert_eq!(document["type"], json!("Vinyasa"));
        assert_eq!(document["description"], json!(null));
        assert!(!document.contains_key(LAST_UPDATED));
    }

    #[test]
    fn schedule_document_uses_mirror_field_names() {
        let entry = ScheduleEntry {
            id: 9,
            course_id: 4,
            date: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
            teacher: "Maya".to_string(),
            comments: Some("Room B".to_string()),
        };
        let document = entry.to_document();
        assert_eq!(document["courseId"], json!(4));
        assert_eq!(document["date"], json!("2025-06-05"));
        assert_eq!(document["comments"], json!("Room B"));
    }

    proptest! {
        #[test]
        fn plan_converges_to_local_id_set(
            local_ids in proptest::collection::btree_set(1_i64..200, 0..20),
            remote_ids in proptest::collection::btree_set(1_i64..200, 0..20),
        ) {
            let local: Vec<Course> = local_ids.iter().map(|id| course(*id)).collect();
            let remote: Vec<String> = remote_ids.iter().map(|id| id.to_string()).collect();
            let batch = plan(&local, &remote, 1);

            let mut after: BTreeSet<String> = remote.iter().cloned().collect();
            for id in &batch.deletes {
                after.remove(id);
            }
            after.extend(batch.upserts.keys().cloned());

            let expected: BTreeSet<String> = local_ids.iter().map(|id| id.to_string()).collect();
            prop_assert_eq!(after, expected);
            prop_assert!(batch.deletes.iter().all(|id| !batch.upserts.contains_key(id)));
        }
    }
}
