//! In-memory test server harness.
//!
//! Wraps an [`axum_test::TestServer`] around the full application router
//! with the fixture schema, the fixture permits and a fresh
//! [`MemoryStore`], and offers request helpers that speak the JSON:API
//! media type and seed helpers that write straight to the store.

use std::sync::Arc;

use arbor_core::resource::{Resource, ResourceIdentifier};
use arbor_persistence::memory::MemoryStore;
use arbor_persistence::scope::Scope;
use arbor_persistence::store::RecordStore;
use axum_test::{TestResponse, TestServer};
use serde_json::{Value, json};

use arbor_rest::{AppState, MEDIA_TYPE, ServerConfig, create_app_with_state};

use super::fixtures;

/// Test harness for the JSON:API surface.
pub struct Harness {
    /// The test server instance.
    pub server: TestServer,

    /// The backing store, for seeding and direct inspection.
    pub store: Arc<MemoryStore>,

    /// Server configuration the app was built with.
    pub config: ServerConfig,
}

impl Harness {
    /// Creates a harness over the fixture schema and permits.
    pub fn new() -> Self {
        let registry = fixtures::registry();
        let config = ServerConfig::for_testing();
        let store = Arc::new(MemoryStore::new(Arc::clone(&registry)));

        let state = AppState::new(Arc::clone(&store), registry, config.clone())
            .with_permits(fixtures::permits());
        let app = create_app_with_state(state);
        let server = TestServer::new(app).expect("failed to create test server");

        Self {
            server,
            store,
            config,
        }
    }

    /// Prefixes a path with the configured namespace.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.namespace, path)
    }

    /// Makes a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.server.get(&self.url(path)).await
    }

    /// Makes a POST request with a JSON:API body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.server
            .post(&self.url(path))
            .json(&body)
            .content_type(MEDIA_TYPE)
            .await
    }

    /// Makes a PATCH request with a JSON:API body.
    pub async fn patch(&self, path: &str, body: Value) -> TestResponse {
        self.server
            .patch(&self.url(path))
            .json(&body)
            .content_type(MEDIA_TYPE)
            .await
    }

    /// Makes a DELETE request without a body.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.server.delete(&self.url(path)).await
    }

    /// Makes a DELETE request with a JSON:API body.
    pub async fn delete_with_body(&self, path: &str, body: Value) -> TestResponse {
        self.server
            .delete(&self.url(path))
            .json(&body)
            .content_type(MEDIA_TYPE)
            .await
    }

    /// Seeds a user, returning its id.
    pub async fn seed_user(&self, name: &str) -> String {
        let mut user = Resource::new("users");
        user.set_attribute("name", json!(name));
        self.store.save(&mut user).await.expect("failed to seed user");
        user.id().expect("seeded user has an id").to_string()
    }

    /// Seeds a post with no author, returning its id.
    pub async fn seed_post(&self, title: &str) -> String {
        let mut post = Resource::new("posts");
        post.set_attribute("title", json!(title));
        self.store.save(&mut post).await.expect("failed to seed post");
        post.id().expect("seeded post has an id").to_string()
    }

    /// Seeds a post linked to an existing user, returning its id.
    pub async fn seed_post_for(&self, title: &str, user_id: &str) -> String {
        let mut post = Resource::new("posts");
        post.set_attribute("title", json!(title));
        post.set_one(
            "user",
            Some(Resource::linkage_stub(&ResourceIdentifier::new(
                "users", user_id,
            ))),
        );
        self.store.save(&mut post).await.expect("failed to seed post");
        post.id().expect("seeded post has an id").to_string()
    }

    /// Seeds a comment on an existing post, returning its id.
    pub async fn seed_comment(&self, post_id: &str, body: &str, rating: i64) -> String {
        let mut comment = Resource::new("comments");
        comment.set_attribute("body", json!(body));
        comment.set_attribute("rating", json!(rating));
        comment.set_one(
            "post",
            Some(Resource::linkage_stub(&ResourceIdentifier::new(
                "posts", post_id,
            ))),
        );
        self.store
            .save(&mut comment)
            .await
            .expect("failed to seed comment");
        comment.id().expect("seeded comment has an id").to_string()
    }

    /// Seeds a comment linked to no post, returning its id.
    pub async fn seed_stray_comment(&self, body: &str, rating: i64) -> String {
        let mut comment = Resource::new("comments");
        comment.set_attribute("body", json!(body));
        comment.set_attribute("rating", json!(rating));
        self.store
            .save(&mut comment)
            .await
            .expect("failed to seed comment");
        comment.id().expect("seeded comment has an id").to_string()
    }

    /// Seeds a rating on an existing comment, returning its id.
    pub async fn seed_rating(&self, comment_id: &str, score: i64) -> String {
        let mut rating = Resource::new("ratings");
        rating.set_attribute("score", json!(score));
        rating.set_one(
            "comment",
            Some(Resource::linkage_stub(&ResourceIdentifier::new(
                "comments", comment_id,
            ))),
        );
        self.store
            .save(&mut rating)
            .await
            .expect("failed to seed rating");
        rating.id().expect("seeded rating has an id").to_string()
    }

    /// Loads one persisted record straight from the store.
    pub async fn find(&self, type_name: &str, id: &str) -> Resource {
        self.store
            .find(type_name, id)
            .await
            .expect("failed to load record")
    }

    /// Counts persisted records of a type through the store.
    pub async fn count(&self, type_name: &str) -> u64 {
        self.store
            .select(type_name, &Scope::all())
            .await
            .expect("failed to count records")
            .total
    }
}
