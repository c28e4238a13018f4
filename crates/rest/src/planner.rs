//! Query planning.
//!
//! The planner turns raw [`QueryOptions`] into a resolved [`QuerySpec`] and
//! a persistence [`Scope`]. Sort and filter keys are unaliased against the
//! target descriptor; unknown filter keys are dropped while unknown sort
//! keys and include paths reject the request with a parameter-sourced 400.
//! Pagination defaults and caps come from the server configuration.

use std::collections::BTreeSet;

use arbor_core::query::{PageSpec, QuerySpec, SortKey};
use arbor_core::schema::{ResourceDescriptor, ResourceRegistry};
use arbor_persistence::scope::{Scope, Window};

use crate::config::ServerConfig;
use crate::error::{RestError, RestResult};
use crate::extractors::QueryOptions;

/// Plans collection queries for one resource type.
pub struct QueryPlanner<'a> {
    registry: &'a ResourceRegistry,
    descriptor: &'a ResourceDescriptor,
    config: &'a ServerConfig,
}

impl<'a> QueryPlanner<'a> {
    /// Creates a planner over `descriptor`.
    pub fn new(
        registry: &'a ResourceRegistry,
        descriptor: &'a ResourceDescriptor,
        config: &'a ServerConfig,
    ) -> Self {
        Self {
            registry,
            descriptor,
            config,
        }
    }

    /// Resolves raw query options into a [`QuerySpec`].
    pub fn plan(&self, options: &QueryOptions) -> RestResult<QuerySpec> {
        let mut spec = QuerySpec::new();

        for raw in &options.sort {
            spec.sort.push(self.sort_key(raw)?);
        }

        for (field, value) in &options.filter {
            let internal = self.descriptor.unalias(field);
            // Filters on unknown fields are dropped, never an error.
            if internal == "id" || self.descriptor.has_attribute(internal) {
                spec.filter.insert(internal.to_string(), value.clone());
            }
        }

        for (public_type, fields) in &options.fields {
            spec.fields.insert(
                public_type.clone(),
                fields.iter().cloned().collect::<BTreeSet<String>>(),
            );
        }

        for raw in &options.include {
            spec.include.push(self.include_path(raw)?);
        }

        spec.page = self.page(options)?;

        Ok(spec)
    }

    /// Builds the persistence scope for a planned spec.
    pub fn scope(&self, spec: &QuerySpec) -> Scope {
        let default = self.config.default_page_size;
        let max = self.config.max_page_size;

        let window = match spec.page {
            PageSpec::Unspecified => Window::OffsetLimit {
                offset: 0,
                limit: default.min(max),
            },
            PageSpec::Numbered { number, size } => {
                let size = size.unwrap_or(default).min(max);
                Window::OffsetLimit {
                    offset: (number.max(1) - 1).saturating_mul(size) as i64,
                    limit: size,
                }
            }
            PageSpec::OffsetLimit { offset, limit } => Window::OffsetLimit {
                offset: offset.unwrap_or(0),
                limit: limit.unwrap_or(default).min(max),
            },
        };

        Scope {
            filter: spec.filter.clone(),
            sort: spec.sort.clone(),
            window,
        }
    }

    fn sort_key(&self, raw: &str) -> RestResult<SortKey> {
        let (name, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };

        let internal = self.descriptor.unalias(name);
        if internal != "id" && !self.descriptor.has_attribute(internal) {
            return Err(RestError::InvalidParameter {
                parameter: "sort".to_string(),
                detail: format!("'{}' is not a sortable field", name),
            });
        }

        Ok(if descending {
            SortKey::descending(internal)
        } else {
            SortKey::ascending(internal)
        })
    }

    fn include_path(&self, raw: &str) -> RestResult<Vec<String>> {
        let mut descriptor = self.descriptor;
        let mut path = Vec::new();

        for segment in raw.split('.') {
            let internal = descriptor.unalias(segment);
            let Some(relationship) = descriptor.relationship(internal) else {
                return Err(RestError::InvalidParameter {
                    parameter: "include".to_string(),
                    detail: format!("'{}' is not a valid include path", raw),
                });
            };
            path.push(internal.to_string());
            descriptor = self
                .registry
                .descriptor(relationship.target())
                .ok_or_else(|| RestError::Internal {
                    message: format!(
                        "relationship {}.{} targets unregistered type {}",
                        descriptor.type_name(),
                        relationship.name(),
                        relationship.target()
                    ),
                })?;
        }

        Ok(path)
    }

    fn page(&self, options: &QueryOptions) -> RestResult<PageSpec> {
        if options.limit.is_some() || options.offset.is_some() {
            let offset = options
                .offset
                .as_deref()
                .map(|raw| parse_param::<i64>("offset", raw))
                .transpose()?;
            let limit = options
                .limit
                .as_deref()
                .map(|raw| parse_param::<u64>("limit", raw))
                .transpose()?;
            return Ok(PageSpec::OffsetLimit { offset, limit });
        }

        if !options.page.is_empty() {
            let number = options
                .page
                .get("number")
                .map(|raw| parse_param::<u64>("page[number]", raw))
                .transpose()?
                .unwrap_or(1);
            let size = options
                .page
                .get("size")
                .map(|raw| parse_param::<u64>("page[size]", raw))
                .transpose()?;
            return Ok(PageSpec::Numbered { number, size });
        }

        Ok(PageSpec::Unspecified)
    }
}

fn parse_param<T: std::str::FromStr>(parameter: &str, raw: &str) -> RestResult<T> {
    raw.parse().map_err(|_| RestError::InvalidParameter {
        parameter: parameter.to_string(),
        detail: format!("'{}' is not a valid number", raw),
    })
}
