//! Request document extractor.
//!
//! Reads a JSON:API request body: the `Content-Type` header must carry the
//! JSON:API media type, and the body must parse as JSON. Interpretation of
//! the `data` member is left to the handlers, which need to distinguish an
//! absent `data` key from an explicit `null`.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
};
use serde_json::Value;

use crate::MEDIA_TYPE;
use crate::error::RestError;

/// A parsed JSON:API request document.
///
/// # Example
///
/// ```rust,ignore
/// use arbor_rest::extractors::JsonApiDocument;
///
/// async fn create_handler(document: JsonApiDocument) {
///     if let Some(data) = document.data() {
///         // ...
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JsonApiDocument {
    document: Value,
}

impl JsonApiDocument {
    /// Wraps an already-parsed document. Intended for tests.
    pub fn from_value(document: Value) -> Self {
        Self { document }
    }

    /// Returns the whole document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Returns the top-level `data` member, `Value::Null` included.
    pub fn data(&self) -> Option<&Value> {
        self.document.get("data")
    }

    /// Returns true if the document carries a `data` key at all.
    pub fn has_data(&self) -> bool {
        self.data().is_some()
    }
}

impl<S> FromRequest<S> for JsonApiDocument
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();

        let mime: mime::Mime = content_type
            .parse()
            .map_err(|_| RestError::UnsupportedMediaType {
                content_type: content_type.clone(),
            })?;
        if mime.essence_str() != MEDIA_TYPE {
            return Err(RestError::UnsupportedMediaType { content_type });
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|err| RestError::Internal {
                message: format!("failed to read request body: {}", err),
            })?;

        if bytes.is_empty() {
            return Ok(Self {
                document: Value::Object(serde_json::Map::new()),
            });
        }

        let document: Value = serde_json::from_slice(&bytes)?;
        Ok(Self { document })
    }
}
