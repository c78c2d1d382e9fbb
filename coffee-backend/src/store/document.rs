//! Schema-less documents and equality filters shared by both store backends.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use super::StoreError;

/// A record: field name to JSON value.
pub type Document = Map<String, Value>;

/// Exact-match filter. Every field must be present in the document and equal
/// to the given value (logical AND). An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: Vec<(String, Value)>,
}

impl Filter {
    /// A filter that matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.fields.iter().all(|(field, expected)| {
            doc.get(field)
                .map(|actual| values_equal(actual, expected))
                .unwrap_or(false)
        })
    }
}

/// JSON equality where numbers compare by value, so `2` matches `2.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).map(|y| values_equal(x, y)).unwrap_or(false))
        }
        _ => a == b,
    }
}

/// Integers compare exactly. Floats only come into play when one side is a float.
fn numbers_equal(x: &Number, y: &Number) -> bool {
    if x.is_f64() || y.is_f64() {
        return match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        };
    }
    match (x.as_i64(), y.as_i64()) {
        (Some(x), Some(y)) => x == y,
        // at least one side is above i64::MAX
        _ => x.as_u64().is_some() && x.as_u64() == y.as_u64(),
    }
}

/// Serialize a typed record into a document. Records must serialize to a JSON object.
pub fn to_document<T: Serialize>(record: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// Return the document's `id`, generating one if it has none.
pub(crate) fn ensure_id(doc: &mut Document) -> String {
    match doc.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(other) => other.to_string(),
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            doc.insert("id".to_string(), Value::String(id.clone()));
            id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::all().matches(&doc(json!({"a": 1}))));
        assert!(Filter::all().matches(&Document::new()));
    }

    #[test]
    fn test_all_fields_must_match() {
        let record = doc(json!({"id": "x", "available": true}));
        assert!(Filter::all().eq("id", "x").eq("available", true).matches(&record));
        assert!(!Filter::all().eq("id", "x").eq("available", false).matches(&record));
    }

    #[test]
    fn test_absent_field_is_non_match() {
        let record = doc(json!({"name": "Kenya AA"}));
        assert!(!Filter::all().eq("available", true).matches(&record));
        assert!(!Filter::all().eq("available", Value::Null).matches(&record));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let record = doc(json!({"price": 4.0, "qty": 2}));
        assert!(Filter::all().eq("price", 4).matches(&record));
        assert!(Filter::all().eq("qty", 2.0).matches(&record));
        assert!(!Filter::all().eq("qty", "2").matches(&record));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let record = doc(json!({"n": 9007199254740993_u64, "big": u64::MAX}));
        assert!(!Filter::all().eq("n", 9007199254740992_i64).matches(&record));
        assert!(Filter::all().eq("n", 9007199254740993_i64).matches(&record));
        assert!(Filter::all().eq("big", u64::MAX).matches(&record));
        assert!(!Filter::all().eq("big", -1).matches(&record));
    }

    #[test]
    fn test_ensure_id_keeps_existing_and_fills_missing() {
        let mut with_id = doc(json!({"id": "abc"}));
        assert_eq!(ensure_id(&mut with_id), "abc");

        let mut without = Document::new();
        let id = ensure_id(&mut without);
        assert_eq!(without.get("id"), Some(&Value::String(id)));
    }

    #[test]
    fn test_to_document_rejects_non_objects() {
        assert!(matches!(
            to_document(&vec![1, 2]),
            Err(StoreError::InvalidDocument(_))
        ));
    }
}
