//! HTTP route table.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the application router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::api_health));

    let activity_routes = Router::new().route(
        "/api/workflows/{workflow_id}/activities/{activity_id}/execute",
        post(handlers::execute_activity),
    );

    Router::new()
        .merge(health_routes)
        .merge(activity_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use bizflow_executors::default_registry;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::{AppConfig, EngineConfig};
    use crate::engine::ActivityEngine;
    use crate::model::{Activity, ActivityStatus, ActivityTemplate, Workflow};
    use crate::store::MemoryStore;

    async fn app(store: Arc<MemoryStore>) -> Router {
        let engine = ActivityEngine::with_store(
            store,
            Arc::new(default_registry()),
            EngineConfig::default(),
        );
        build_router(AppState::new(None, engine, AppConfig::default()))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn execute_request(workflow_id: Uuid, activity_id: Uuid) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!(
                "/api/workflows/{}/activities/{}/execute",
                workflow_id, activity_id
            ))
            .header("x-request-id", "req-router")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_routes() {
        let app = app(Arc::new(MemoryStore::new())).await;

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["database"], "not_configured");
        assert_eq!(body["executors"], json!(["system.echo"]));
    }

    #[tokio::test]
    async fn test_execute_echo_activity() {
        let store = Arc::new(MemoryStore::new());
        let workflow = Workflow::new("onboarding").with_context(json!({"seed": {"n": 3}}));
        let template = ActivityTemplate::new("Echo", "system.echo")
            .with_input_mapping(json!({"n": "seed.n"}))
            .with_output_mapping(json!({"echoed": "n"}));
        let activity = Activity::new(workflow.id, template.id, "Echo", 0, 0);
        let (workflow_id, activity_id) = (workflow.id, activity.id);

        store.insert_workflow(workflow).await;
        store.insert_template(template).await;
        store.insert_activity(activity).await;

        let response = app(store.clone())
            .await
            .oneshot(execute_request(workflow_id, activity_id))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["output_payload"], json!({"data": [{"n": 3}]}));

        let stored = store.workflow(workflow_id).await.unwrap();
        assert_eq!(
            stored.context.unwrap()["stage"]["0"]["activity"]["0"]["output"],
            json!({"echoed": 3})
        );
        assert_eq!(
            store.activity(activity_id).await.unwrap().status,
            ActivityStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let store = Arc::new(MemoryStore::new());
        let app = app(store.clone()).await;

        let response = app
            .clone()
            .oneshot(execute_request(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(execute_request(Uuid::nil(), Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let workflow = Workflow::new("onboarding");
        let template = ActivityTemplate::new("Echo", "system.echo");
        let mut activity = Activity::new(workflow.id, template.id, "Echo", 0, 0);
        activity.mark_skipped("false").unwrap();
        let (workflow_id, activity_id) = (workflow.id, activity.id);
        store.insert_workflow(workflow).await;
        store.insert_template(template).await;
        store.insert_activity(activity).await;

        let response = app
            .oneshot(execute_request(workflow_id, activity_id))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_malformed_ids_are_rejected() {
        let response = app(Arc::new(MemoryStore::new()))
            .await
            .oneshot(
                Request::post("/api/workflows/not-a-uuid/activities/also-not/execute")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
