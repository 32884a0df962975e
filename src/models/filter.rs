//! Translates list query parameters into a store [`Filter`].
//!
//! Only parameters on the resource's allow-list are considered; each one is
//! compared the way its [`FilterKind`] says. Unknown parameters are ignored.

use super::Resource;
use crate::store::{Filter, Match};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    /// Case-sensitive "starts with".
    Prefix,
    /// Exact string equality.
    Text,
    /// Exact numeric equality; the parameter must parse as a number.
    Number,
}

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("filter `{field}` expects a number, got `{value}`")]
    InvalidNumber { field: &'static str, value: String },
}

pub fn parse_filters<R: Resource>(params: &HashMap<String, String>) -> Result<Filter, FilterError> {
    let mut filter = Filter::new();
    for &(field, kind) in R::FILTERS {
        let Some(value) = params.get(field) else {
            continue;
        };
        let matcher = match kind {
            FilterKind::Prefix => Match::Prefix(value.clone()),
            FilterKind::Text => Match::Text(value.clone()),
            FilterKind::Number => match value.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Match::Number(n),
                _ => {
                    return Err(FilterError::InvalidNumber {
                        field,
                        value: value.clone(),
                    });
                }
            },
        };
        filter = filter.with(field, matcher);
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Book, Movie};

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn book_filters_follow_allow_list() {
        let filter = parse_filters::<Book>(&params(&[
            ("author", "Herbert"),
            ("title", "Du"),
            ("image", "x.jpg"),
        ]))
        .unwrap();

        assert_eq!(
            filter,
            Filter::new()
                .with("title", Match::Prefix("Du".into()))
                .with("author", Match::Text("Herbert".into()))
        );
    }

    #[test]
    fn platform_is_not_a_movie_filter() {
        let filter = parse_filters::<Movie>(&params(&[("platform", "netflix")])).unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn rating_must_be_numeric() {
        let ok = parse_filters::<Movie>(&params(&[("rating", "7.5")])).unwrap();
        assert_eq!(ok, Filter::new().with("rating", Match::Number(7.5)));

        let err = parse_filters::<Movie>(&params(&[("rating", "great")])).unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidNumber {
                field: "rating",
                value: "great".into()
            }
        );
    }
}
