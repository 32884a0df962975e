//! Resource models served by the API.
//!
//! Each resource is a plain serde struct whose fields are all optional, so a
//! payload that fails validation can still be carried around and rendered
//! back to the client. The [`Resource`] trait declares everything the
//! generic service and handlers need to know about a type: its collection,
//! the fields it accepts, which of them are filterable and how, and the
//! indexes the store should keep for it.

pub mod book;
pub mod filter;
pub mod movie;
pub mod show;

use crate::store::{Document, IndexSpec};
use serde::{Serialize, Serializer, de::DeserializeOwned, ser::SerializeMap};
use serde_json::{Map, Value};
use std::{borrow::Cow, fmt};
use validator::{Validate, ValidationError};

pub use book::Book;
pub use filter::{FilterError, FilterKind, parse_filters};
pub use movie::Movie;
pub use show::Show;

pub const BLANK: &str = "can't be blank";
pub const TAKEN: &str = "is already taken";

pub trait Resource:
    Serialize + DeserializeOwned + Validate + Clone + fmt::Debug + PartialEq + Send + Sync + 'static
{
    /// Store collection and URL segment, e.g. `books`.
    const COLLECTION: &'static str;

    /// Human-facing type name used in messages, e.g. `Book`.
    const NAME: &'static str;

    /// Declared fields in rendering order. Anything else in a payload is dropped.
    const FIELDS: &'static [&'static str];

    /// Query parameters honoured by `list`, with their comparison strategy.
    const FILTERS: &'static [(&'static str, FilterKind)];

    /// Fields that must not repeat across the collection.
    const UNIQUE: &'static [&'static str] = &[];

    const INDEXES: &'static [IndexSpec];
}

/// Rejects strings that hold nothing but whitespace. `required` covers the
/// unset case.
pub fn not_blank<T: AsRef<str>>(value: T) -> Result<(), ValidationError> {
    if value.as_ref().trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(BLANK.into());
        return Err(err);
    }
    Ok(())
}

/// Field-level failures for one record, rendered in field declaration order.
///
/// Fields outside `order` sort after the declared ones, in the order they
/// were added.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    order: &'static [&'static str],
    entries: Vec<(&'static str, &'static str)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ordered(order: &'static [&'static str]) -> Self {
        Self {
            order,
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, field: &'static str, message: &'static str) {
        if !self.entries.contains(&(field, message)) {
            self.entries.push((field, message));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct failing field names.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = Vec::new();
        for &(field, _) in &self.entries {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        fields.sort_by_key(|field| {
            self.order
                .iter()
                .position(|declared| declared == field)
                .unwrap_or(usize::MAX)
        });
        fields
    }

    pub fn messages(&self, field: &str) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(f, _)| *f == field)
            .map(|(_, m)| *m)
            .collect()
    }
}

/// Renders as `{"field": ["message", ...], ...}`.
impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for field in fields {
            map.serialize_entry(field, &self.messages(field))?;
        }
        map.end()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields()
            .into_iter()
            .flat_map(|field| {
                self.messages(field)
                    .into_iter()
                    .map(move |message| format!("{} {}", field, message))
            })
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// A resource instance with its identifier and any outstanding errors.
#[derive(Clone, Debug, PartialEq)]
pub struct Record<R> {
    pub id: String,
    pub fields: R,
    pub errors: ValidationErrors,
}

impl<R: Resource> Record<R> {
    pub fn new(id: impl Into<String>, fields: R) -> Self {
        Self {
            id: id.into(),
            fields,
            errors: ValidationErrors::ordered(R::FIELDS),
        }
    }

    /// Re-run presence validation, replacing any previous errors.
    pub fn validate(&mut self) -> bool {
        self.errors = ValidationErrors::ordered(R::FIELDS);
        if let Err(report) = self.fields.validate() {
            let failed = report.field_errors();
            for &field in R::FIELDS {
                let Some(failures) = failed.get(field) else {
                    continue;
                };
                for failure in failures.iter() {
                    let message = match &failure.message {
                        Some(Cow::Borrowed(message)) => *message,
                        _ => BLANK,
                    };
                    self.errors.add(field, message);
                }
            }
        }
        self.errors.is_empty()
    }

    pub fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
        let fields = serde_json::from_value(Value::Object(doc.body))?;
        Ok(Self::new(doc.id, fields))
    }

    /// The stored body: declared fields only.
    pub fn to_body(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(&self.fields)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

/// Keep only the declared fields of `R` from an incoming payload.
pub fn declared_fields<R: Resource>(payload: Map<String, Value>) -> Map<String, Value> {
    payload
        .into_iter()
        .filter(|(key, _)| R::FIELDS.contains(&key.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn not_blank_rejects_whitespace() {
        assert!(not_blank("").is_err());
        assert!(not_blank("  \t").is_err());
        assert!(not_blank("Dune").is_ok());

        let err = not_blank(&String::from(" ")).unwrap_err();
        assert_eq!(err.message.as_deref(), Some(BLANK));
    }

    #[test]
    fn validation_errors_group_by_field() {
        let mut errors = ValidationErrors::new();
        errors.add("title", BLANK);
        errors.add("isbn", BLANK);
        errors.add("isbn", TAKEN);
        errors.add("isbn", TAKEN);

        assert_eq!(errors.fields(), vec!["title", "isbn"]);
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({ "title": [BLANK], "isbn": [BLANK, TAKEN] })
        );
        assert_eq!(
            errors.to_string(),
            "title can't be blank, isbn can't be blank, isbn is already taken"
        );
    }

    #[test]
    fn declared_fields_drops_unknown_keys() {
        let payload = json!({ "title": "Dune", "id": "forged", "platform": "tv" });
        let kept = declared_fields::<Movie>(payload.as_object().cloned().unwrap());
        assert_eq!(Value::Object(kept), json!({ "title": "Dune" }));
    }

    #[test]
    fn validate_lists_missing_fields_in_declaration_order() {
        let mut record = Record::new(
            "id-1",
            Book {
                title: Some("Dune".into()),
                isbn: Some(" ".into()),
                ..Book::default()
            },
        );
        assert!(!record.validate());
        assert_eq!(record.errors.fields(), vec!["author", "isbn", "image"]);
        assert_eq!(record.errors.messages("isbn"), vec![BLANK]);
    }

    #[test]
    fn errors_follow_declaration_order_not_discovery_order() {
        let mut errors = ValidationErrors::ordered(Book::FIELDS);
        errors.add("image", BLANK);
        errors.add("isbn", TAKEN);
        errors.add("title", BLANK);

        assert_eq!(errors.fields(), vec!["title", "isbn", "image"]);
        let rendered = serde_json::to_string(&errors).unwrap();
        assert_eq!(
            rendered,
            r#"{"title":["can't be blank"],"isbn":["is already taken"],"image":["can't be blank"]}"#
        );
        assert_eq!(
            errors.to_string(),
            "title can't be blank, isbn is already taken, image can't be blank"
        );
    }
}
