//! HTTP surface: healthcheck and `POST /analyze_call`.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use std::time::Instant;

use crate::error::InsightError;
use crate::metrics::MetricsCollector;
use crate::models::{AnalyzeCallResponse, ErrorBody, HealthStatus, TranscriptInput};
use crate::service::AnalysisService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Analysis pipeline for `POST /analyze_call`
    pub service: Arc<AnalysisService>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(healthcheck))
        .route("/analyze_call", post(analyze_call))
        .with_state(state)
        .layer(axum::middleware::from_fn(track_requests))
}

async fn healthcheck() -> Json<HealthStatus> {
    tracing::debug!("api: healthcheck");
    Json(HealthStatus {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    })
}

async fn analyze_call(
    State(state): State<AppState>,
    payload: Result<Json<TranscriptInput>, JsonRejection>,
) -> Result<Json<AnalyzeCallResponse>, Response> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::info!(error = %rejection, "api: rejected request body");
        let status = match &rejection {
            JsonRejection::JsonSyntaxError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => rejection.status(),
        };
        error_response(status, rejection.body_text())
    })?;

    let response = state
        .service
        .analyze(&payload.transcript)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(response))
}

impl IntoResponse for InsightError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self, "api: request failed");
        }
        error_response(status, self.to_string())
    }
}

fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorBody { detail })).into_response()
}

/// Metric label for a request: the route template, or "unmatched".
fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |matched| matched.as_str().to_string())
}

async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = route_label(&request);
    let start = Instant::now();

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    tracing::info!(
        %method,
        path = %path,
        route = %route,
        status = response.status().as_u16(),
        duration_ms = elapsed.as_millis() as u64,
        "request served"
    );
    MetricsCollector::default().record_request(&route, response.status().as_u16(), elapsed);
    response
}
