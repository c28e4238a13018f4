//! JSON:API response assertions.
//!
//! Provides assertion utilities for the integration suites.

use axum_test::TestResponse;
use serde_json::Value;

use arbor_rest::MEDIA_TYPE;

/// Asserts that the response carries the JSON:API media type.
pub fn assert_jsonapi_content_type(response: &TestResponse) {
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    assert!(
        content_type.starts_with(MEDIA_TYPE),
        "Expected content type {}, got {}",
        MEDIA_TYPE,
        content_type
    );
}

/// Asserts that the response has a Location header.
pub fn assert_has_location(response: &TestResponse) {
    assert!(
        response.headers().contains_key("location"),
        "Expected Location header"
    );
}

/// Asserts that the body's primary data is an array of the given length.
pub fn assert_data_count(body: &Value, expected: usize) {
    let actual = body
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0);
    assert_eq!(
        actual, expected,
        "Expected {} primary data members, got {} in {}",
        expected, actual, body
    );
}

/// Asserts that the errors array contains an entry with the given status
/// and code.
pub fn assert_error(body: &Value, status: &str, code: &str) {
    assert!(
        find_error(body, |error| {
            error["status"] == status && error["code"] == code
        }),
        "Expected error with status {} and code {} in {}",
        status,
        code,
        body
    );
}

/// Asserts that the errors array contains an entry with the given code and
/// document pointer source.
pub fn assert_error_pointer(body: &Value, code: &str, pointer: &str) {
    assert!(
        find_error(body, |error| {
            error["code"] == code && error["source"]["pointer"] == pointer
        }),
        "Expected error with code {} at pointer {} in {}",
        code,
        pointer,
        body
    );
}

/// Asserts that the errors array contains an entry with the given code and
/// query parameter source.
pub fn assert_error_parameter(body: &Value, code: &str, parameter: &str) {
    assert!(
        find_error(body, |error| {
            error["code"] == code && error["source"]["parameter"] == parameter
        }),
        "Expected error with code {} for parameter {} in {}",
        code,
        parameter,
        body
    );
}

/// Returns true if any member of the errors array satisfies the predicate.
fn find_error(body: &Value, predicate: impl Fn(&Value) -> bool) -> bool {
    body.get("errors")
        .and_then(Value::as_array)
        .is_some_and(|errors| errors.iter().any(predicate))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_find_error_matches_any_member() {
        let body = json!({
            "errors": [
                {"status": "422", "code": "blank", "source": {"pointer": "/data/attributes/title"}},
                {"status": "422", "code": "taken", "source": {"pointer": "/data/attributes/name"}},
            ]
        });
        assert!(find_error(&body, |error| error["code"] == "taken"));
        assert!(!find_error(&body, |error| error["code"] == "invalid"));
    }

    #[test]
    fn test_find_error_tolerates_missing_array() {
        assert!(!find_error(&json!({"data": null}), |_| true));
    }
}
