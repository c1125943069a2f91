use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<FirestoreDocument>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirestoreDocument {
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default, skip_serializing)]
    pub update_time: Option<String>,
}

impl FirestoreDocument {
    /// Last path segment of the resource name, i.e. the document id.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    StringValue(String),
    TimestampValue(String),
    ReferenceValue(String),
    BytesValue(String),
    MapValue(MapValue),
    ArrayValue(ArrayValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

impl Value {
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::NullValue(()),
            serde_json::Value::Bool(b) => Value::BooleanValue(*b),
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => {
                Value::IntegerValue(n.to_string())
            }
            serde_json::Value::Number(n) => Value::DoubleValue(n.as_f64().unwrap_or_default()),
            serde_json::Value::String(s) => Value::StringValue(s.clone()),
            serde_json::Value::Array(items) => Value::ArrayValue(ArrayValue {
                values: items.iter().map(Value::from_json).collect(),
            }),
            serde_json::Value::Object(map) => Value::MapValue(MapValue {
                fields: map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))).collect(),
            }),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::NullValue(()) => serde_json::Value::Null,
            Value::BooleanValue(b) => serde_json::Value::Bool(*b),
            Value::IntegerValue(s) => s
                .parse::<i64>()
                .map(serde_json::Value::from)
                .unwrap_or_else(|_| serde_json::Value::String(s.clone())),
            Value::DoubleValue(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::StringValue(s)
            | Value::TimestampValue(s)
            | Value::ReferenceValue(s)
            | Value::BytesValue(s) => serde_json::Value::String(s.clone()),
            Value::ArrayValue(array) => {
                serde_json::Value::Array(array.values.iter().map(Value::to_json).collect())
            }
            Value::MapValue(map) => serde_json::Value::Object(
                map.fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommitRequest {
    pub writes: Vec<Write>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Write {
    Update(FirestoreDocument),
    Delete(String),
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_scalars_with_firestore_tags() {
        let encoded = serde_json::to_value(Value::from_json(&json!(15))).unwrap();
        assert_eq!(encoded, json!({ "integerValue": "15" }));

        let encoded = serde_json::to_value(Value::from_json(&json!(20.5))).unwrap();
        assert_eq!(encoded, json!({ "doubleValue": 20.5 }));

        let encoded = serde_json::to_value(Value::from_json(&json!(null))).unwrap();
        assert_eq!(encoded, json!({ "nullValue": null }));
    }

    #[test]
    fn decodes_list_response() {
        let body = json!({
            "documents": [{
                "name": "projects/p/databases/(default)/documents/courses/7",
                "fields": {
                    "type": { "stringValue": "Yin" },
                    "capacity": { "integerValue": "12" },
                    "price": { "doubleValue": 9.5 },
                    "description": { "nullValue": null }
                },
                "createTime": "2025-01-01T00:00:00Z",
                "updateTime": "2025-01-01T00:00:00Z"
            }],
            "nextPageToken": "abc"
        });

        let parsed: ListDocumentsResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.next_page_token.as_deref(), Some("abc"));
        let document = &parsed.documents[0];
        assert_eq!(document.id(), "7");
        assert_eq!(document.fields["capacity"].to_json(), json!(12));
        assert_eq!(document.fields["price"].to_json(), json!(9.5));
        assert_eq!(document.fields["description"].to_json(), json!(null));
    }

    #[test]
    fn commit_writes_are_tagged() {
        let request = CommitRequest {
            writes: vec![
                Write::Update(FirestoreDocument {
                    name: "docs/courses/1".to_string(),
                    fields: BTreeMap::from([("id".to_string(), Value::IntegerValue("1".to_string()))]),
                    update_time: None,
                }),
                Write::Delete("docs/courses/3".to_string()),
            ],
        };
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(
            encoded,
            json!({
                "writes": [
                    { "update": { "name": "docs/courses/1", "fields": { "id": { "integerValue": "1" } } } },
                    { "delete": "docs/courses/3" }
                ]
            })
        );
    }
}
