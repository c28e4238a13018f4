//! Query string extractor.
//!
//! Splits a request's query string into the JSON:API query options without
//! interpreting them: bracket parameters (`filter[x]`, `fields[type]`,
//! `page[number]`, `page[size]`) are grouped, comma lists are split, and
//! everything else is left as raw strings for the planner to resolve
//! against the resource schema.

use std::collections::BTreeMap;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};

use crate::error::RestError;

/// The raw query options of one request.
///
/// Field and type names are exactly as the client sent them; alias
/// resolution, schema checks and numeric parsing happen in the planner so
/// that parameter errors carry the offending parameter name.
///
/// # Example
///
/// ```rust,ignore
/// use arbor_rest::extractors::QueryOptions;
///
/// async fn index_handler(options: QueryOptions) {
///     for entry in &options.sort {
///         println!("sort by {}", entry);
///     }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// `sort` entries in request order, `-` prefix intact.
    pub sort: Vec<String>,
    /// `include` paths in request order, dots intact.
    pub include: Vec<String>,
    /// `filter[field]` values keyed by the field as sent.
    pub filter: BTreeMap<String, String>,
    /// `fields[type]` lists keyed by the type as sent.
    pub fields: BTreeMap<String, Vec<String>>,
    /// `page[...]` values keyed by the bracketed name.
    pub page: BTreeMap<String, String>,
    /// Raw top-level `limit`.
    pub limit: Option<String>,
    /// Raw top-level `offset`.
    pub offset: Option<String>,
}

impl QueryOptions {
    /// Returns true if the request carried no query options at all.
    pub fn is_empty(&self) -> bool {
        self.sort.is_empty()
            && self.include.is_empty()
            && self.filter.is_empty()
            && self.fields.is_empty()
            && self.page.is_empty()
            && self.limit.is_none()
            && self.offset.is_none()
    }
}

/// Parses a raw query string into [`QueryOptions`].
///
/// Unrecognized parameters are ignored. Repeated parameters keep the last
/// value.
pub fn parse_query(query: &str) -> QueryOptions {
    let mut options = QueryOptions::default();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "sort" => {
                options.sort = split_list(&value);
            }
            "include" => {
                options.include = split_list(&value);
            }
            "limit" => {
                options.limit = Some(value.into_owned());
            }
            "offset" => {
                options.offset = Some(value.into_owned());
            }
            other => {
                let Some((group, name)) = bracket_key(other) else {
                    continue;
                };
                match group {
                    "filter" => {
                        options.filter.insert(name.to_string(), value.into_owned());
                    }
                    "fields" => {
                        options.fields.insert(name.to_string(), split_list(&value));
                    }
                    "page" => {
                        options.page.insert(name.to_string(), value.into_owned());
                    }
                    _ => {}
                }
            }
        }
    }

    options
}

/// Splits `group[name]` into its two parts.
fn bracket_key(key: &str) -> Option<(&str, &str)> {
    let open = key.find('[')?;
    let name = key[open + 1..].strip_suffix(']')?;
    if name.is_empty() {
        return None;
    }
    Some((&key[..open], name))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

impl<S> FromRequestParts<S> for QueryOptions
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parse_query(parts.uri.query().unwrap_or("")))
    }
}
