//! Write pipeline tests.
//!
//! Tests creates and updates end to end: permitted-field enforcement,
//! aliasing round trips, nested record graphs, validation error pointers
//! and the all-or-nothing save.

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::assertions::{assert_error_pointer, assert_jsonapi_content_type};
use common::harness::Harness;

// =============================================================================
// Creation
// =============================================================================

mod creation {
    use super::*;

    #[tokio::test]
    async fn test_create_round_trips_public_names() {
        let harness = Harness::new();

        let response = harness
            .post(
                "/reviews",
                json!({"data": {"type": "reviews", "attributes": {"content": "neat", "rating": 4}}}),
            )
            .await;
        response.assert_status(StatusCode::CREATED);
        assert_jsonapi_content_type(&response);

        let body: Value = response.json();
        assert_eq!(body["data"]["type"], "reviews");
        assert_eq!(body["data"]["attributes"]["content"], "neat");
        assert!(body["data"]["attributes"].get("body").is_none());

        // Internally the record lives under its canonical names.
        let id = body["data"]["id"].as_str().expect("created id");
        let stored = harness.find("comments", id).await;
        assert_eq!(stored.attribute("body"), Some(&json!("neat")));
    }

    #[tokio::test]
    async fn test_unpermitted_attributes_are_dropped_silently() {
        let harness = Harness::new();

        let response = harness
            .post(
                "/posts",
                json!({"data": {"type": "posts", "attributes": {"title": "ok", "secret": "x"}}}),
            )
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        let id = body["data"]["id"].as_str().expect("created id");
        let stored = harness.find("posts", id).await;
        assert_eq!(stored.attribute("secret"), None);
    }

    #[tokio::test]
    async fn test_create_builds_a_nested_graph() {
        let harness = Harness::new();

        let response = harness
            .post(
                "/posts",
                json!({"data": {
                    "type": "posts",
                    "attributes": {"title": "graph"},
                    "relationships": {
                        "user": {"data": {"type": "users", "attributes": {"name": "bo"}}},
                        "comments": {"data": [
                            {"type": "reviews", "attributes": {"content": "nice", "rating": 5}}
                        ]}
                    }
                }}),
            )
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        assert_eq!(body["data"]["relationships"]["user"]["data"]["type"], "users");
        let linkage = body["data"]["relationships"]["comments"]["data"]
            .as_array()
            .expect("comments linkage");
        assert_eq!(linkage.len(), 1);
        assert_eq!(linkage[0]["type"], "reviews");

        assert_eq!(harness.count("users").await, 1);
        assert_eq!(harness.count("comments").await, 1);
    }

    #[tokio::test]
    async fn test_create_without_data_is_rejected() {
        let harness = Harness::new();

        let response = harness.post("/posts", json!({})).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_error_pointer(&body, "blank", "/data");
    }

    #[tokio::test]
    async fn test_type_mismatch_is_rejected_before_any_write() {
        let harness = Harness::new();

        let response = harness
            .post(
                "/posts",
                json!({"data": {"type": "users", "attributes": {"title": "sneaky"}}}),
            )
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_error_pointer(&body, "invalid_type", "/data/type");
        assert_eq!(harness.count("posts").await, 0);
    }

    #[tokio::test]
    async fn test_cardinality_disagreement_is_rejected() {
        let harness = Harness::new();
        let post = harness.seed_post("seed").await;
        let review = harness.seed_comment(&post, "stray", 1).await;

        // A to-many relationship fed a single object.
        let response = harness
            .post(
                "/posts",
                json!({"data": {
                    "type": "posts",
                    "attributes": {"title": "mismatched"},
                    "relationships": {
                        "comments": {"data": {"type": "reviews", "id": review}}
                    }
                }}),
            )
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_error_pointer(&body, "invalid", "/data/relationships/comments/data");
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

mod validation {
    use super::*;

    #[tokio::test]
    async fn test_missing_title_points_at_the_attribute() {
        let harness = Harness::new();

        let response = harness
            .post(
                "/posts",
                json!({"data": {"type": "posts", "attributes": {"body": "untitled"}}}),
            )
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = response.json();
        assert_error_pointer(&body, "blank", "/data/attributes/title");
        let detail = body["errors"][0]["detail"].as_str().expect("detail");
        assert_eq!(detail, "can't be blank");
    }

    #[tokio::test]
    async fn test_duplicate_unique_value_is_taken() {
        let harness = Harness::new();
        harness.seed_user("bo").await;

        let response = harness
            .post(
                "/users",
                json!({"data": {"type": "users", "attributes": {"name": "bo"}}}),
            )
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_error_pointer(&body, "taken", "/data/attributes/name");
    }

    #[tokio::test]
    async fn test_nested_errors_carry_relationship_pointers() {
        let harness = Harness::new();

        let response = harness
            .post(
                "/posts",
                json!({"data": {
                    "type": "posts",
                    "attributes": {"title": "ok"},
                    "relationships": {
                        "user": {"data": {"type": "users", "attributes": {}}}
                    }
                }}),
            )
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_error_pointer(&body, "blank", "/data/relationships/user/data/attributes/name");
    }

    #[tokio::test]
    async fn test_two_levels_of_nesting_resolve_the_full_pointer() {
        let harness = Harness::new();

        let response = harness
            .post(
                "/posts",
                json!({"data": {
                    "type": "posts",
                    "attributes": {"title": "deep"},
                    "relationships": {
                        "comments": {"data": [{
                            "type": "reviews",
                            "attributes": {"content": "fine"},
                            "relationships": {
                                "ratings": {"data": [{"type": "ratings", "attributes": {}}]}
                            }
                        }]}
                    }
                }}),
            )
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_error_pointer(
            &body,
            "blank",
            "/data/relationships/comments/data/relationships/ratings/data/attributes/score",
        );
    }

    #[tokio::test]
    async fn test_alias_written_by_the_client_is_echoed_back() {
        let harness = Harness::new();

        let response = harness
            .post(
                "/reviews",
                json!({"data": {
                    "type": "reviews",
                    "attributes": {"content": "fine"},
                    "relationships": {
                        "submitter": {"data": {"type": "users", "id": "missing"}}
                    }
                }}),
            )
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_error_pointer(&body, "not_found", "/data/relationships/submitter/data");
    }

    #[tokio::test]
    async fn test_failed_graph_save_writes_nothing() {
        let harness = Harness::new();

        let response = harness
            .post(
                "/posts",
                json!({"data": {
                    "type": "posts",
                    "attributes": {"title": "doomed"},
                    "relationships": {
                        "user": {"data": {"type": "users", "attributes": {"name": "bo"}}},
                        "comments": {"data": [{
                            "type": "reviews",
                            "attributes": {"content": "orphaned"},
                            "relationships": {
                                "ratings": {"data": [{"type": "ratings", "attributes": {}}]}
                            }
                        }]}
                    }
                }}),
            )
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(harness.count("posts").await, 0);
        assert_eq!(harness.count("users").await, 0);
        assert_eq!(harness.count("comments").await, 0);
        assert_eq!(harness.count("ratings").await, 0);
    }
}

// =============================================================================
// Updates
// =============================================================================

mod updates {
    use super::*;

    #[tokio::test]
    async fn test_update_changes_only_the_sent_fields() {
        let harness = Harness::new();
        let id = harness.seed_post("original").await;

        let response = harness
            .patch(
                &format!("/posts/{}", id),
                json!({"data": {"type": "posts", "id": id, "attributes": {"body": "revised"}}}),
            )
            .await;
        response.assert_status_ok();

        let stored = harness.find("posts", &id).await;
        assert_eq!(stored.attribute("title"), Some(&json!("original")));
        assert_eq!(stored.attribute("body"), Some(&json!("revised")));
    }

    #[tokio::test]
    async fn test_update_document_id_must_match_the_endpoint() {
        let harness = Harness::new();
        let id = harness.seed_post("original").await;

        let response = harness
            .patch(
                &format!("/posts/{}", id),
                json!({"data": {"type": "posts", "id": "someone-else", "attributes": {"body": "x"}}}),
            )
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_error_pointer(&body, "invalid", "/data/id");
    }

    #[tokio::test]
    async fn test_update_clears_a_to_one_with_null() {
        let harness = Harness::new();
        let author = harness.seed_user("bo").await;
        let id = harness.seed_post_for("owned", &author).await;

        let response = harness
            .patch(
                &format!("/posts/{}", id),
                json!({"data": {
                    "type": "posts",
                    "id": id,
                    "relationships": {"user": {"data": null}}
                }}),
            )
            .await;
        response.assert_status_ok();

        let stored = harness.find("posts", &id).await;
        let user = stored.related("user").and_then(|value| value.as_one());
        assert!(user.is_none(), "author linkage should be cleared");
    }

    #[tokio::test]
    async fn test_update_missing_record_is_404() {
        let harness = Harness::new();

        let response = harness
            .patch(
                "/posts/nonexistent",
                json!({"data": {"type": "posts", "id": "nonexistent", "attributes": {"body": "x"}}}),
            )
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
