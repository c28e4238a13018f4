//! Error types for the JSON:API layer.
//!
//! This module defines all error types used throughout the REST layer, with
//! automatic conversion to JSON:API error documents.
//!
//! # Error Mapping
//!
//! Store errors from the persistence layer are automatically mapped to
//! appropriate HTTP status codes and error codes:
//!
//! | Store Error | HTTP Status | Code |
//! |-------------|-------------|------|
//! | NotFound | 404 | not_found |
//! | UnknownType | 404 | not_found |
//! | UnknownRelationship | 404 | association_not_found |
//! | Invalid | 422 | per-field codes |
//! | Restricted | 403 | delete_restricted |
//! | MissingLinkage | 404 | not_found |
//! | Internal | 500 | internal |

use std::fmt;

use arbor_persistence::{RecordError, StoreError};
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::MEDIA_TYPE;

/// Where in the request an error originated.
///
/// Serializes to the JSON:API `source` member: `{"pointer": ...}` for
/// document errors, `{"parameter": ...}` for query string errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ErrorSource {
    /// RFC 6901 pointer into the request document.
    #[serde(rename = "pointer")]
    Pointer(String),
    /// The offending query string parameter.
    #[serde(rename = "parameter")]
    Parameter(String),
}

/// One member of a JSON:API `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorObject {
    /// HTTP status code as a string.
    pub status: String,
    /// Application-specific error code.
    pub code: String,
    /// Human-readable explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Request location the error applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

impl ErrorObject {
    /// Creates an error object with no source.
    pub fn new(status: StatusCode, code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status: status.as_u16().to_string(),
            code: code.into(),
            detail: Some(detail.into()),
            source: None,
        }
    }

    /// Attaches a document pointer source.
    pub fn pointer(mut self, pointer: impl Into<String>) -> Self {
        self.source = Some(ErrorSource::Pointer(pointer.into()));
        self
    }

    /// Attaches a query parameter source.
    pub fn parameter(mut self, parameter: impl Into<String>) -> Self {
        self.source = Some(ErrorSource::Parameter(parameter.into()));
        self
    }
}

/// The primary error type for REST operations.
///
/// Every variant renders as a JSON:API error document with the matching
/// HTTP status. Validation variants carry pre-rendered [`ErrorObject`]s so
/// pointers and resolved messages survive the trip through `?`.
#[derive(Debug)]
pub enum RestError {
    /// Record not found (HTTP 404).
    NotFound {
        /// The public or internal type name used in the request.
        type_name: String,
        /// The record ID.
        id: String,
    },

    /// The requested collection does not exist (HTTP 404).
    UnknownType {
        /// The type segment from the URL.
        type_name: String,
    },

    /// The requested relationship does not exist on the type (HTTP 404).
    AssociationNotFound {
        /// The owning type.
        type_name: String,
        /// The relationship segment from the URL.
        relationship: String,
    },

    /// The operation is not permitted (HTTP 403).
    Forbidden {
        /// Human-readable explanation.
        detail: String,
    },

    /// Destroy refused by a restrict delete rule (HTTP 403).
    DeleteRestricted {
        /// Human-readable explanation.
        detail: String,
    },

    /// Wrong request content type (HTTP 415).
    UnsupportedMediaType {
        /// The content type that was sent.
        content_type: String,
    },

    /// A query string parameter could not be interpreted (HTTP 400).
    InvalidParameter {
        /// The offending parameter, bracket syntax included.
        parameter: String,
        /// Human-readable explanation.
        detail: String,
    },

    /// The request document is structurally invalid (HTTP 422).
    DocumentInvalid {
        /// Rendered error objects with document pointers.
        objects: Vec<ErrorObject>,
    },

    /// The record failed validation (HTTP 422).
    RecordInvalid {
        /// Rendered error objects with document pointers.
        objects: Vec<ErrorObject>,
    },

    /// Internal server error (HTTP 500).
    Internal {
        /// Error message, logged but not returned to the client.
        message: String,
    },
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::NotFound { type_name, id } => {
                write!(f, "Record not found: {}/{}", type_name, id)
            }
            RestError::UnknownType { type_name } => {
                write!(f, "Unknown resource type: {}", type_name)
            }
            RestError::AssociationNotFound {
                type_name,
                relationship,
            } => {
                write!(f, "Association not found: {}.{}", type_name, relationship)
            }
            RestError::Forbidden { detail } => {
                write!(f, "Forbidden: {}", detail)
            }
            RestError::DeleteRestricted { detail } => {
                write!(f, "Delete restricted: {}", detail)
            }
            RestError::UnsupportedMediaType { content_type } => {
                write!(f, "Unsupported media type: {}", content_type)
            }
            RestError::InvalidParameter { parameter, detail } => {
                write!(f, "Invalid parameter {}: {}", parameter, detail)
            }
            RestError::DocumentInvalid { objects } => {
                write!(f, "Request document invalid with {} error(s)", objects.len())
            }
            RestError::RecordInvalid { objects } => {
                write!(f, "Record invalid with {} error(s)", objects.len())
            }
            RestError::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for RestError {}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, objects) = match self {
            RestError::NotFound { type_name, id } => (
                StatusCode::NOT_FOUND,
                vec![ErrorObject::new(
                    StatusCode::NOT_FOUND,
                    "not_found",
                    format!("Record {}/{} could not be found", type_name, id),
                )],
            ),
            RestError::UnknownType { type_name } => (
                StatusCode::NOT_FOUND,
                vec![ErrorObject::new(
                    StatusCode::NOT_FOUND,
                    "not_found",
                    format!("Resource type '{}' could not be found", type_name),
                )],
            ),
            RestError::AssociationNotFound {
                type_name,
                relationship,
            } => (
                StatusCode::NOT_FOUND,
                vec![
                    ErrorObject::new(
                        StatusCode::NOT_FOUND,
                        "association_not_found",
                        format!("Association '{}' on {} could not be found", relationship, type_name),
                    ),
                ],
            ),
            RestError::Forbidden { detail } => (
                StatusCode::FORBIDDEN,
                vec![ErrorObject::new(StatusCode::FORBIDDEN, "forbidden", detail)],
            ),
            RestError::DeleteRestricted { detail } => (
                StatusCode::FORBIDDEN,
                vec![ErrorObject::new(
                    StatusCode::FORBIDDEN,
                    "delete_restricted",
                    detail,
                )],
            ),
            RestError::UnsupportedMediaType { content_type } => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                vec![ErrorObject::new(
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "unsupported_media_type",
                    format!("Content type '{}' is not supported; use {}", content_type, MEDIA_TYPE),
                )],
            ),
            RestError::InvalidParameter { parameter, detail } => (
                StatusCode::BAD_REQUEST,
                vec![
                    ErrorObject::new(StatusCode::BAD_REQUEST, "invalid_parameter", detail)
                        .parameter(parameter),
                ],
            ),
            RestError::DocumentInvalid { objects } => (StatusCode::UNPROCESSABLE_ENTITY, objects),
            RestError::RecordInvalid { objects } => (StatusCode::UNPROCESSABLE_ENTITY, objects),
            RestError::Internal { message } => {
                error!(message = %message, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![ErrorObject::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal",
                        "An internal error occurred",
                    )],
                )
            }
        };

        let body = serde_json::json!({ "errors": objects });
        (
            status,
            [(header::CONTENT_TYPE, MEDIA_TYPE)],
            Json(body),
        )
            .into_response()
    }
}

// Conversions from store errors. Validation errors arrive here only when a
// handler did not render them with pointers first; the fallback keeps the
// raw codes.

impl From<StoreError> for RestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Record(e) => e.into(),
            StoreError::Invalid(errors) => RestError::RecordInvalid {
                objects: errors
                    .iter()
                    .map(|entry| {
                        ErrorObject::new(
                            StatusCode::UNPROCESSABLE_ENTITY,
                            entry.code.as_str(),
                            entry.code.as_str(),
                        )
                    })
                    .collect(),
            },
            StoreError::Restricted {
                type_name,
                id,
                reason,
            } => RestError::DeleteRestricted {
                detail: format!("Cannot destroy {}/{}: {}", type_name, id, reason),
            },
            StoreError::MissingLinkage { type_name, id } => RestError::NotFound { type_name, id },
            StoreError::Internal(message) => RestError::Internal { message },
        }
    }
}

impl From<RecordError> for RestError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::NotFound { type_name, id } => RestError::NotFound { type_name, id },
            RecordError::UnknownType { type_name } => RestError::UnknownType { type_name },
            RecordError::UnknownRelationship {
                type_name,
                relationship,
            } => RestError::AssociationNotFound {
                type_name,
                relationship,
            },
        }
    }
}

impl From<serde_json::Error> for RestError {
    fn from(err: serde_json::Error) -> Self {
        RestError::DocumentInvalid {
            objects: vec![
                ErrorObject::new(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "invalid_document",
                    format!("Invalid JSON: {}", err),
                )
                .pointer("/"),
            ],
        }
    }
}

/// Result type alias for REST operations.
pub type RestResult<T> = Result<T, RestError>;
