//! JSON pointer resolution for error sources.
//!
//! Field errors carry dotted internal paths such as `user.name`. Error
//! documents must point at the place in the request document the error
//! concerns, as an RFC 6901 pointer like
//! `/data/relationships/user/data/attributes/name`. Resolution walks the
//! dotted path against the schema, and echoes the public alias for any
//! segment the client actually wrote aliased, as recorded in
//! [`EngagedAliases`].

use crate::alias::EngagedAliases;
use crate::schema::ResourceRegistry;

/// The one attribute name with a reserved pointer.
const RESERVED_TYPE: &str = "type";

/// Resolves a dotted internal field path to a JSON pointer into a request
/// document for resources of `root_type`.
///
/// `None` resolves to `/data`, the whole primary datum. Each leading
/// segment that names a relationship descends one document level; the
/// final segment lands in `attributes`, `relationships` or the reserved
/// `type` member. Segments are echoed under their public alias when
/// `engaged` records that the client wrote the alias at that level.
pub fn resolve_pointer(
    registry: &ResourceRegistry,
    root_type: &str,
    field: Option<&str>,
    engaged: Option<&EngagedAliases>,
) -> String {
    let field = match field {
        Some(field) => field,
        None => return "/data".to_string(),
    };

    let mut pointer = String::new();
    let mut descriptor = registry.descriptor(root_type);
    let mut engaged = engaged;

    let segments: Vec<&str> = field.split('.').collect();
    for (position, segment) in segments.iter().enumerate() {
        let last = position == segments.len() - 1;
        let relationship = descriptor.is_some_and(|d| d.is_relationship(segment));
        let display = display_name(descriptor, engaged, segment);

        if last {
            if relationship {
                pointer.push_str("/data/relationships/");
                pointer.push_str(&display);
                pointer.push_str("/data");
            } else if *segment == RESERVED_TYPE {
                pointer.push_str("/data/type");
            } else {
                pointer.push_str("/data/attributes/");
                pointer.push_str(&display);
            }
            break;
        }

        if relationship {
            pointer.push_str("/data/relationships/");
            pointer.push_str(&display);
            descriptor = descriptor
                .and_then(|d| d.relationship(segment))
                .and_then(|r| registry.descriptor(r.target()));
            engaged = engaged.and_then(|e| e.descend(segment));
        } else {
            // Not a relationship, so the rest of the path indexes into an
            // attribute value.
            pointer.push_str("/data/attributes/");
            pointer.push_str(&segments[position..].join("/"));
            break;
        }
    }

    pointer
}

/// Picks the name a segment is echoed under: its public alias when the
/// client wrote the alias at this level, otherwise the internal name.
fn display_name(
    descriptor: Option<&crate::schema::ResourceDescriptor>,
    engaged: Option<&EngagedAliases>,
    segment: &str,
) -> String {
    if let (Some(descriptor), Some(engaged)) = (descriptor, engaged) {
        let public = descriptor.alias_for(segment);
        if public != segment && engaged.engaged(public) {
            return public.to_string();
        }
    }
    segment.to_string()
}
