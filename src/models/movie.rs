//! A movie entry.

use super::{FilterKind, Resource, not_blank};
use crate::store::IndexSpec;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use validator::Validate;

#[derive(Serialize, Deserialize, Validate, Clone, Debug, Default, PartialEq)]
pub struct Movie {
    #[validate(required(message = "can't be blank"), custom(function = "not_blank"))]
    pub title: Option<String>,
    #[validate(required(message = "can't be blank"), custom(function = "not_blank"))]
    pub director: Option<String>,
    #[validate(required(message = "can't be blank"), custom(function = "not_blank"))]
    pub image: Option<String>,
    /// Kept as a JSON number so `8` and `8.5` round-trip unchanged.
    #[validate(required(message = "can't be blank"))]
    pub rating: Option<Number>,
}

impl Resource for Movie {
    const COLLECTION: &'static str = "movies";
    const NAME: &'static str = "Movie";
    const FIELDS: &'static [&'static str] = &["title", "director", "image", "rating"];
    const FILTERS: &'static [(&'static str, FilterKind)] = &[
        ("title", FilterKind::Prefix),
        ("director", FilterKind::Text),
        ("rating", FilterKind::Number),
    ];
    const INDEXES: &'static [IndexSpec] = &[IndexSpec::ascending("title")];
}
