//! Relationship surface tests.
//!
//! Tests the linkage endpoints and related-data endpoints end to end:
//! identifier-only linkage documents, the PATCH/POST/DELETE mutation
//! matrix with permit enforcement, related collections under the full
//! query vocabulary and delete restriction through inverse linkage.

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::assertions::{assert_error, assert_error_pointer};
use common::harness::Harness;

// =============================================================================
// Linkage Reads
// =============================================================================

mod linkage_reads {
    use super::*;

    #[tokio::test]
    async fn test_to_one_linkage_is_identifier_only() {
        let harness = Harness::new();
        let author = harness.seed_user("bo").await;
        let post = harness.seed_post_for("owned", &author).await;

        let response = harness
            .get(&format!("/posts/{}/relationships/user", post))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["data"]["type"], "users");
        assert_eq!(body["data"]["id"], Value::String(author));
        assert!(body["data"].get("attributes").is_none());
    }

    #[tokio::test]
    async fn test_empty_to_one_linkage_is_null() {
        let harness = Harness::new();
        let post = harness.seed_post("authorless").await;

        let response = harness
            .get(&format!("/posts/{}/relationships/user", post))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_to_many_linkage_lists_identifiers_under_public_type() {
        let harness = Harness::new();
        let post = harness.seed_post("discussed").await;
        harness.seed_comment(&post, "first", 3).await;
        harness.seed_comment(&post, "second", 4).await;

        let response = harness
            .get(&format!("/posts/{}/relationships/comments", post))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        let data = body["data"].as_array().expect("linkage array");
        assert_eq!(data.len(), 2);
        for member in data {
            assert_eq!(member["type"], "reviews");
            assert!(member.get("attributes").is_none());
        }
    }

    #[tokio::test]
    async fn test_empty_to_many_linkage_is_an_empty_array() {
        let harness = Harness::new();
        let post = harness.seed_post("quiet").await;

        let response = harness
            .get(&format!("/posts/{}/relationships/comments", post))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_aliased_segment_reaches_the_relationship() {
        let harness = Harness::new();
        let post = harness.seed_post("reviewed").await;
        let review = harness.seed_comment(&post, "fine", 3).await;

        let response = harness
            .get(&format!("/reviews/{}/relationships/submitter", review))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert!(body["data"].is_null(), "no submitter was linked");
    }
}

// =============================================================================
// Linkage Mutations
// =============================================================================

mod linkage_mutations {
    use super::*;

    #[tokio::test]
    async fn test_patch_to_one_replaces_the_link() {
        let harness = Harness::new();
        let original = harness.seed_user("bo").await;
        let replacement = harness.seed_user("alice").await;
        let post = harness.seed_post_for("owned", &original).await;

        let response = harness
            .patch(
                &format!("/posts/{}/relationships/user", post),
                json!({"data": {"type": "users", "id": replacement}}),
            )
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let stored = harness.find("posts", &post).await;
        let linked = stored
            .related("user")
            .and_then(|value| value.as_one())
            .expect("linked author");
        assert_eq!(linked.id(), Some(replacement.as_str()));
    }

    #[tokio::test]
    async fn test_patch_to_one_with_null_clears_the_link() {
        let harness = Harness::new();
        let author = harness.seed_user("bo").await;
        let post = harness.seed_post_for("owned", &author).await;

        let response = harness
            .patch(
                &format!("/posts/{}/relationships/user", post),
                json!({"data": null}),
            )
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let stored = harness.find("posts", &post).await;
        assert!(stored.related("user").and_then(|value| value.as_one()).is_none());
    }

    #[tokio::test]
    async fn test_post_to_a_to_one_is_forbidden() {
        let harness = Harness::new();
        let author = harness.seed_user("bo").await;
        let post = harness.seed_post("unowned").await;

        let response = harness
            .post(
                &format!("/posts/{}/relationships/user", post),
                json!({"data": {"type": "users", "id": author}}),
            )
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_error(&body, "403", "forbidden");
    }

    #[tokio::test]
    async fn test_post_appends_to_a_to_many() {
        let harness = Harness::new();
        let post = harness.seed_post("collector").await;
        let stray = harness.seed_stray_comment("homeless", 2).await;

        // The identifier may carry the target's public type name.
        let response = harness
            .post(
                &format!("/posts/{}/relationships/comments", post),
                json!({"data": [{"type": "reviews", "id": stray}]}),
            )
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let stored = harness.find("posts", &post).await;
        let ids: Vec<&str> = stored
            .related("comments")
            .map(|value| value.iter().filter_map(|member| member.id()).collect())
            .unwrap_or_default();
        assert_eq!(ids, vec![stray.as_str()]);
    }

    #[tokio::test]
    async fn test_delete_removes_from_a_to_many() {
        let harness = Harness::new();
        let post = harness.seed_post("pruned").await;
        let doomed = harness.seed_comment(&post, "doomed", 1).await;
        let kept = harness.seed_comment(&post, "kept", 5).await;

        let response = harness
            .delete_with_body(
                &format!("/posts/{}/relationships/comments", post),
                json!({"data": [{"type": "comments", "id": doomed}]}),
            )
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let stored = harness.find("posts", &post).await;
        let ids: Vec<&str> = stored
            .related("comments")
            .map(|value| value.iter().filter_map(|member| member.id()).collect())
            .unwrap_or_default();
        assert_eq!(ids, vec![kept.as_str()]);
    }

    #[tokio::test]
    async fn test_patch_replaces_a_to_many_wholesale() {
        let harness = Harness::new();
        let post = harness.seed_post("rewritten").await;
        harness.seed_comment(&post, "old", 2).await;
        let replacement = harness.seed_stray_comment("new", 4).await;

        let response = harness
            .patch(
                &format!("/posts/{}/relationships/comments", post),
                json!({"data": [{"type": "comments", "id": replacement}]}),
            )
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let stored = harness.find("posts", &post).await;
        let ids: Vec<&str> = stored
            .related("comments")
            .map(|value| value.iter().filter_map(|member| member.id()).collect())
            .unwrap_or_default();
        assert_eq!(ids, vec![replacement.as_str()]);
    }

    #[tokio::test]
    async fn test_mutation_outside_the_permit_set_is_forbidden() {
        let harness = Harness::new();
        let user = harness.seed_user("bo").await;

        // The users permit set covers name only, no relationships.
        let response = harness
            .patch(
                &format!("/users/{}/relationships/posts", user),
                json!({"data": []}),
            )
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_error(&body, "403", "forbidden");
    }

    #[tokio::test]
    async fn test_identifier_with_wrong_type_is_rejected() {
        let harness = Harness::new();
        let author = harness.seed_user("bo").await;
        let post = harness.seed_post_for("owned", &author).await;

        let response = harness
            .patch(
                &format!("/posts/{}/relationships/user", post),
                json!({"data": {"type": "posts", "id": author}}),
            )
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_error_pointer(&body, "invalid_type", "/data/type");
    }

    #[tokio::test]
    async fn test_append_without_data_is_rejected() {
        let harness = Harness::new();
        let post = harness.seed_post("intact").await;

        let response = harness
            .post(&format!("/posts/{}/relationships/comments", post), json!({}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_error_pointer(&body, "blank", "/data");
    }
}

// =============================================================================
// Related Data
// =============================================================================

mod related_data {
    use super::*;

    #[tokio::test]
    async fn test_related_to_one_renders_the_full_record() {
        let harness = Harness::new();
        let author = harness.seed_user("bo").await;
        let post = harness.seed_post_for("owned", &author).await;

        let response = harness.get(&format!("/posts/{}/user", post)).await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["data"]["type"], "users");
        assert_eq!(body["data"]["id"], Value::String(author));
        assert_eq!(body["data"]["attributes"]["name"], "bo");
    }

    #[tokio::test]
    async fn test_related_to_one_without_link_is_null() {
        let harness = Harness::new();
        let post = harness.seed_post("authorless").await;

        let response = harness.get(&format!("/posts/{}/user", post)).await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_related_to_many_applies_the_query_vocabulary() {
        let harness = Harness::new();
        let post = harness.seed_post("debated").await;
        harness.seed_comment(&post, "amazing", 5).await;
        harness.seed_comment(&post, "bland", 2).await;
        harness.seed_comment(&post, "crisp", 5).await;

        let response = harness
            .get(&format!(
                "/posts/{}/comments?filter[rating]=5&sort=-content",
                post
            ))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        let data = body["data"].as_array().expect("primary data array");
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["type"], "reviews");
        assert_eq!(data[0]["attributes"]["content"], "crisp");
        assert_eq!(data[1]["attributes"]["content"], "amazing");
        assert_eq!(body["meta"]["total"], 2);
    }

    #[tokio::test]
    async fn test_related_to_many_paginates() {
        let harness = Harness::new();
        let post = harness.seed_post("serialized").await;
        for body in ["c1", "c2", "c3"] {
            harness.seed_comment(&post, body, 3).await;
        }

        let response = harness
            .get(&format!(
                "/posts/{}/comments?sort=content&page[number]=2&page[size]=2",
                post
            ))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        let data = body["data"].as_array().expect("primary data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["attributes"]["content"], "c3");
        assert_eq!(body["meta"]["total"], 3);
        assert_eq!(body["meta"]["page_number"], 2);
    }

    #[tokio::test]
    async fn test_related_record_is_addressable() {
        let harness = Harness::new();
        let post = harness.seed_post("indexed").await;
        let review = harness.seed_comment(&post, "pinned", 4).await;

        let response = harness
            .get(&format!("/posts/{}/comments/{}", post, review))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["data"]["id"], Value::String(review));
        assert_eq!(body["data"]["type"], "reviews");
    }

    #[tokio::test]
    async fn test_related_record_outside_the_relationship_is_404() {
        let harness = Harness::new();
        let post = harness.seed_post("guarded").await;
        harness.seed_comment(&post, "resident", 3).await;
        let stray = harness.seed_stray_comment("stray", 1).await;

        let response = harness
            .get(&format!("/posts/{}/comments/{}", post, stray))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_error(&body, "404", "not_found");
    }
}

// =============================================================================
// Delete Restriction
// =============================================================================

mod delete_restriction {
    use super::*;

    #[tokio::test]
    async fn test_destroy_with_dependents_is_restricted() {
        let harness = Harness::new();
        let author = harness.seed_user("bo").await;
        harness.seed_post_for("anchored", &author).await;

        let response = harness.delete(&format!("/users/{}", author)).await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_error(&body, "403", "delete_restricted");
        assert_eq!(harness.count("users").await, 1);
    }

    #[tokio::test]
    async fn test_destroy_without_dependents_succeeds() {
        let harness = Harness::new();
        let author = harness.seed_user("bo").await;

        let response = harness.delete(&format!("/users/{}", author)).await;
        response.assert_status(StatusCode::NO_CONTENT);
        assert_eq!(harness.count("users").await, 0);
    }
}
