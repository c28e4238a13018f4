//! Schema and permit fixtures shared by the integration suites.
//!
//! The fixture domain is a small blog: `users` write `posts`, `posts`
//! collect `comments`, `comments` collect `ratings`. Comments are exposed
//! under the public type `reviews` with aliased fields (`content` for
//! `body`, `submitter` for `user`), so the suites exercise aliasing on
//! every surface. Deleting a user with posts is restricted.

use std::sync::Arc;

use arbor_core::schema::{
    DeleteRule, RelationshipDescriptor, ResourceDescriptor, ResourceRegistry, Validation,
};
use arbor_core::{PermitTable, PermittedFields};

/// Builds the blog-domain schema registry.
pub fn registry() -> Arc<ResourceRegistry> {
    Arc::new(
        ResourceRegistry::builder()
            .resource(
                ResourceDescriptor::build("users")
                    .attribute("name")
                    .relationship(
                        RelationshipDescriptor::to_many("posts", "posts")
                            .inverse("user")
                            .on_delete(DeleteRule::Restrict),
                    )
                    .validate(Validation::Presence {
                        field: "name".to_string(),
                    })
                    .validate(Validation::Unique {
                        field: "name".to_string(),
                    })
                    .finish(),
            )
            .resource(
                ResourceDescriptor::build("posts")
                    .attribute("title")
                    .attribute("body")
                    .relationship(
                        RelationshipDescriptor::to_one("user", "users").inverse("posts"),
                    )
                    .relationship(
                        RelationshipDescriptor::to_many("comments", "comments").inverse("post"),
                    )
                    .validate(Validation::Presence {
                        field: "title".to_string(),
                    })
                    .finish(),
            )
            .resource(
                ResourceDescriptor::build("comments")
                    .public_type("reviews")
                    .attribute("body")
                    .attribute("rating")
                    .alias("content", "body")
                    .alias("submitter", "user")
                    .relationship(
                        RelationshipDescriptor::to_one("post", "posts").inverse("comments"),
                    )
                    .relationship(RelationshipDescriptor::to_one("user", "users"))
                    .relationship(
                        RelationshipDescriptor::to_many("ratings", "ratings").inverse("comment"),
                    )
                    .finish(),
            )
            .resource(
                ResourceDescriptor::build("ratings")
                    .attribute("score")
                    .relationship(
                        RelationshipDescriptor::to_one("comment", "comments").inverse("ratings"),
                    )
                    .validate(Validation::Presence {
                        field: "score".to_string(),
                    })
                    .finish(),
            )
            .finish()
            .expect("fixture registry is well-formed"),
    )
}

/// Builds the permit table the suites write through.
///
/// Post writes may carry a whole nested graph; user and review writes are
/// flat. Users deliberately permit no relationships on update, so the
/// relationship-mutation suites can assert the forbidden path.
pub fn permits() -> PermitTable {
    let rating_fields = PermittedFields::new().field("score");
    let comment_fields = PermittedFields::new()
        .fields(["body", "rating", "post", "user"])
        .nested("ratings", rating_fields.clone());

    PermitTable::new()
        .permit_create("users", PermittedFields::new().field("name"))
        .permit_update("users", PermittedFields::new().field("name"))
        .permit_create(
            "posts",
            PermittedFields::new()
                .fields(["title", "body"])
                .nested("user", PermittedFields::new().field("name"))
                .nested("comments", comment_fields.clone()),
        )
        .permit_update(
            "posts",
            PermittedFields::new()
                .fields(["title", "body"])
                .nested("user", PermittedFields::new().field("name"))
                .nested("comments", comment_fields.clone()),
        )
        .permit_create("comments", comment_fields.clone())
        .permit_update("comments", comment_fields)
        .permit_create("ratings", rating_fields.clone())
        .permit_update("ratings", rating_fields)
}
