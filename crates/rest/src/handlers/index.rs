//! Collection reads.

use arbor_persistence::store::RecordStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;

use crate::error::RestResult;
use crate::extractors::QueryOptions;
use crate::planner::QueryPlanner;
use crate::responses::{DocumentRenderer, collect_included};
use crate::state::AppState;

use super::{json_response, routed_descriptor};

/// `GET /{type}`: renders the collection under the request's filter, sort
/// and page, with side-loaded records for `include` paths. The scope
/// policy narrows the evaluated scope before the store sees it.
pub async fn index<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(type_segment): Path<String>,
    options: QueryOptions,
) -> RestResult<Response> {
    let descriptor = routed_descriptor(state.registry(), &type_segment)?;
    let type_name = descriptor.type_name().to_string();

    let planner = QueryPlanner::new(state.registry(), descriptor, state.config());
    let spec = planner.plan(&options)?;
    let scope = state
        .scope_policy()
        .collection(&type_name, planner.scope(&spec));

    let selection = state.store().select(&type_name, &scope).await?;
    let included = collect_included(
        state.store(),
        state.scope_policy(),
        &selection.resources,
        &spec.include,
    )
    .await?;

    let renderer = DocumentRenderer::new(state.registry(), state.config(), &spec);
    let body = renderer.collection(&type_name, &selection, scope.window, &included);
    Ok(json_response(state.config(), StatusCode::OK, body))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arbor_core::resource::Resource;
    use arbor_core::schema::{ResourceDescriptor, ResourceRegistry};
    use arbor_persistence::memory::MemoryStore;
    use serde_json::json;

    use super::*;
    use crate::config::ServerConfig;
    use crate::error::RestError;
    use crate::handlers::read_body;

    fn state() -> AppState<MemoryStore> {
        let registry = Arc::new(
            ResourceRegistry::builder()
                .resource(ResourceDescriptor::build("posts").attribute("title").finish())
                .resource(
                    ResourceDescriptor::build("drafts")
                        .attribute("title")
                        .routed(false)
                        .finish(),
                )
                .finish()
                .unwrap(),
        );
        let store = Arc::new(MemoryStore::new(Arc::clone(&registry)));
        AppState::new(store, registry, ServerConfig::for_testing())
    }

    async fn seed_posts(state: &AppState<MemoryStore>, titles: &[&str]) {
        for title in titles {
            let mut post = Resource::new("posts");
            post.set_attribute("title", json!(title));
            state.store().save(&mut post).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_index_renders_sorted_collection() {
        let state = state();
        seed_posts(&state, &["beta", "alpha"]).await;

        let response = index(
            State(state),
            Path("posts".to_string()),
            crate::extractors::query_options::parse_query("sort=title"),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "application/vnd.api+json"
        );
        let body = read_body(response).await;
        assert_eq!(body["data"][0]["attributes"]["title"], "alpha");
        assert_eq!(body["data"][1]["attributes"]["title"], "beta");
        assert_eq!(body["meta"]["total"], 2);
    }

    #[tokio::test]
    async fn test_index_applies_filter() {
        let state = state();
        seed_posts(&state, &["keep", "drop"]).await;

        let response = index(
            State(state),
            Path("posts".to_string()),
            crate::extractors::query_options::parse_query("filter[title]=keep"),
        )
        .await
        .unwrap();

        let body = read_body(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["attributes"]["title"], "keep");
    }

    #[tokio::test]
    async fn test_index_unknown_type_is_404() {
        let err = index(
            State(state()),
            Path("widgets".to_string()),
            QueryOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RestError::UnknownType { .. }));
    }

    #[tokio::test]
    async fn test_index_unrouted_type_is_404() {
        let err = index(
            State(state()),
            Path("drafts".to_string()),
            QueryOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RestError::UnknownType { .. }));
    }
}
