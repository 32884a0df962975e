//! JSON rendering for resource records.
//!
//! Output is an ordered object: `id` first, then the declared fields in
//! declaration order (unset fields as `null`), then `errors` when the record
//! failed validation.

use crate::models::{Record, Resource};
use serde_json::{Map, Value};

pub fn serialize<R: Resource>(record: &Record<R>) -> Result<Value, serde_json::Error> {
    let mut body = record.to_body()?;
    let mut data = Map::new();
    data.insert("id".into(), Value::String(record.id.clone()));
    for field in R::FIELDS {
        let value = body.remove(*field).unwrap_or(Value::Null);
        data.insert((*field).into(), value);
    }
    if !record.errors.is_empty() {
        data.insert("errors".into(), serde_json::to_value(&record.errors)?);
    }
    Ok(Value::Object(data))
}

pub fn serialize_all<R: Resource>(records: &[Record<R>]) -> Result<Vec<Value>, serde_json::Error> {
    records.iter().map(serialize).collect()
}
