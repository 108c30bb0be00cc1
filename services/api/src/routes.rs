use crate::infra::{AppState, Marketplace};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use pet_adoption::store::EntityStore;
use pet_adoption::workflows::adoption::application_router;
use pet_adoption::workflows::catalog::{pet_router, shelter_router};
use serde_json::json;

/// Mount the catalog and adoption routers next to the operational endpoints.
pub(crate) fn with_marketplace_routes<S>(marketplace: &Marketplace<S>) -> Router
where
    S: EntityStore + 'static,
{
    Router::new()
        .merge(pet_router(marketplace.pets.clone()))
        .merge(shelter_router(marketplace.shelters.clone()))
        .merge(application_router(marketplace.applications.clone()))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{in_memory_marketplace, seed_demo_data};
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use pet_adoption::config::{CacheConfig, PagingConfig};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_flagged() {
        let state = app_state(false);
        let marketplace = in_memory_marketplace(&CacheConfig::default(), PagingConfig::default());
        let app = with_marketplace_routes(&marketplace).layer(Extension(state.clone()));

        let response = app
            .clone()
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["status"], json!("initializing"));

        state.readiness.store(true, Ordering::Release);
        let response = app
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn public_catalog_is_mounted_beside_health() {
        let marketplace = in_memory_marketplace(&CacheConfig::default(), PagingConfig::default());
        let seed = seed_demo_data(&marketplace).expect("seeded");
        let app = with_marketplace_routes(&marketplace).layer(Extension(app_state(true)));

        let health = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(health.status(), StatusCode::OK);

        let pets = app
            .oneshot(
                Request::get("/api/v1/pets?kind=Cat")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(pets.status(), StatusCode::OK);
        let payload = body_json(pets).await;
        assert_eq!(payload["total_count"], json!(1));
        assert_eq!(payload["items"][0]["shelter_name"], json!(seed.shelter.name));
    }
}
