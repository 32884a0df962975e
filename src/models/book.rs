//! A book in the catalogue.

use super::{FilterKind, Resource, not_blank};
use crate::store::IndexSpec;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Validate, Clone, Debug, Default, PartialEq)]
pub struct Book {
    #[validate(required(message = "can't be blank"), custom(function = "not_blank"))]
    pub title: Option<String>,
    #[validate(required(message = "can't be blank"), custom(function = "not_blank"))]
    pub author: Option<String>,
    /// Unique across all books.
    #[validate(required(message = "can't be blank"), custom(function = "not_blank"))]
    pub isbn: Option<String>,
    /// Cover image URL.
    #[validate(required(message = "can't be blank"), custom(function = "not_blank"))]
    pub image: Option<String>,
}

impl Resource for Book {
    const COLLECTION: &'static str = "books";
    const NAME: &'static str = "Book";
    const FIELDS: &'static [&'static str] = &["title", "author", "isbn", "image"];
    const FILTERS: &'static [(&'static str, FilterKind)] = &[
        ("title", FilterKind::Prefix),
        ("isbn", FilterKind::Text),
        ("author", FilterKind::Text),
    ];
    const UNIQUE: &'static [&'static str] = &["isbn"];
    const INDEXES: &'static [IndexSpec] =
        &[IndexSpec::ascending("title"), IndexSpec::unique("isbn")];
}
