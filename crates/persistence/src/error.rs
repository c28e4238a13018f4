//! Error types for the persistence layer.
//!
//! Storage failures split into record lookup errors, validation rejections
//! carrying the accumulated field errors, and constraint violations raised
//! by delete rules.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use arbor_core::Errors;
use thiserror::Error;

/// The primary error type for all store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record lookup errors
    #[error(transparent)]
    Record(#[from] RecordError),

    /// The resource graph failed validation; no writes were performed.
    #[error("record invalid with {} error(s)", .0.len())]
    Invalid(Errors),

    /// Destroy was refused by a `Restrict` delete rule.
    #[error("cannot destroy {type_name}/{id}: {reason}")]
    Restricted {
        type_name: String,
        id: String,
        reason: String,
    },

    /// A relationship operation referenced records that do not exist.
    #[error("linkage references missing record {type_name}/{id}")]
    MissingLinkage { type_name: String, id: String },

    /// Internal backend error.
    #[error("internal store error: {0}")]
    Internal(String),
}

/// Errors related to record lookup.
#[derive(Error, Debug)]
pub enum RecordError {
    /// The requested record was not found.
    #[error("record not found: {type_name}/{id}")]
    NotFound { type_name: String, id: String },

    /// The requested resource type is not registered.
    #[error("unknown resource type: {type_name}")]
    UnknownType { type_name: String },

    /// The requested relationship does not exist on the type.
    #[error("unknown relationship: {type_name}.{relationship}")]
    UnknownRelationship {
        type_name: String,
        relationship: String,
    },
}

impl StoreError {
    /// Shorthand for a [`RecordError::NotFound`].
    pub fn not_found(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::Record(RecordError::NotFound {
            type_name: type_name.into(),
            id: id.into(),
        })
    }

    /// Shorthand for a [`RecordError::UnknownType`].
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        StoreError::Record(RecordError::UnknownType {
            type_name: type_name.into(),
        })
    }

    /// Shorthand for a [`RecordError::UnknownRelationship`].
    pub fn unknown_relationship(
        type_name: impl Into<String>,
        relationship: impl Into<String>,
    ) -> Self {
        StoreError::Record(RecordError::UnknownRelationship {
            type_name: type_name.into(),
            relationship: relationship.into(),
        })
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
