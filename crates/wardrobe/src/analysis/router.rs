use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::error;

use super::service::{AnalysisServiceError, WardrobeAnalysisService};
use super::views::{CapsuleRequest, CompatibilityRequest};
use crate::catalog::ItemCatalog;

/// Router builder exposing the compatibility, utilization and capsule endpoints.
pub fn analysis_router<C>(service: Arc<WardrobeAnalysisService<C>>) -> Router
where
    C: ItemCatalog + 'static,
{
    Router::new()
        .route(
            "/api/analyze/compatibility",
            post(compatibility_handler::<C>),
        )
        .route("/api/analyze/utilization", get(utilization_handler::<C>))
        .route("/api/capsule/recommendations", post(capsule_handler::<C>))
        .with_state(service)
}

pub(crate) async fn compatibility_handler<C>(
    State(service): State<Arc<WardrobeAnalysisService<C>>>,
    axum::Json(request): axum::Json<CompatibilityRequest>,
) -> Response
where
    C: ItemCatalog + 'static,
{
    match off_runtime(service, move |service| service.analyze_compatibility(&request)).await {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => error_response(err, "Failed to analyze outfit compatibility"),
    }
}

pub(crate) async fn utilization_handler<C>(
    State(service): State<Arc<WardrobeAnalysisService<C>>>,
) -> Response
where
    C: ItemCatalog + 'static,
{
    match off_runtime(service, |service| service.analyze_utilization()).await {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(err) => error_response(err, "Failed to fetch utilization data"),
    }
}

pub(crate) async fn capsule_handler<C>(
    State(service): State<Arc<WardrobeAnalysisService<C>>>,
    axum::Json(request): axum::Json<CapsuleRequest>,
) -> Response
where
    C: ItemCatalog + 'static,
{
    match off_runtime(service, move |service| service.recommend_capsule(&request)).await {
        Ok(capsule) => (StatusCode::OK, axum::Json(capsule)).into_response(),
        Err(err) => error_response(err, "Failed to generate recommendations"),
    }
}

/// Runs an engine call on the blocking pool so large catalogs never stall
/// the async workers.
pub(crate) async fn off_runtime<C, T, F>(
    service: Arc<WardrobeAnalysisService<C>>,
    job: F,
) -> Result<T, AnalysisServiceError>
where
    C: ItemCatalog + 'static,
    T: Send + 'static,
    F: FnOnce(&WardrobeAnalysisService<C>) -> Result<T, AnalysisServiceError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || job(&service))
        .await
        .map_err(|err| AnalysisServiceError::Worker(err.to_string()))?
}

fn error_response(err: AnalysisServiceError, context: &str) -> Response {
    match err {
        AnalysisServiceError::Engine(engine) => {
            let payload = json!({
                "error": engine.to_string(),
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        AnalysisServiceError::Catalog(_) | AnalysisServiceError::Worker(_) => {
            error!(error = %err, "{context}");
            let payload = json!({
                "error": context,
                "detail": err.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
