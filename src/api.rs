use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::{OpenApi, ToSchema};

use crate::forecast::ForecastError;
use crate::services::{ForecastOrchestrator, ForecastReport};

/// Message returned when the flow horizon is out of range
pub const INVALID_HORIZON_MESSAGE: &str =
    "Selecciona un mes futuro válido (hasta 12 meses adelante)";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: ForecastOrchestrator,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PredictRequest {
    /// Target month, `YYYY-MM`
    #[schema(example = "2025-03")]
    pub fecha: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Request failures mapped to HTTP responses.
///
/// Only an out-of-range flow horizon is a client rejection (400); an
/// unreadable body or month and model faults are reported as 500.
#[derive(Debug)]
pub enum ApiError {
    InvalidHorizon,
    MalformedInput(String),
    Internal(String),
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::InvalidHorizon { horizon } => {
                warn!("Rejected flow horizon {}", horizon);
                ApiError::InvalidHorizon
            }
            ForecastError::InvalidDate(_) => {
                error!("Unreadable target month: {}", err);
                ApiError::MalformedInput(err.to_string())
            }
            ForecastError::Model { .. } => {
                error!("Forecast failed: {}", err);
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidHorizon => {
                (StatusCode::BAD_REQUEST, INVALID_HORIZON_MESSAGE.to_string())
            }
            ApiError::MalformedInput(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(predict, health),
    components(schemas(PredictRequest, ForecastReport, ErrorResponse, HealthResponse)),
    tags((name = "forecast", description = "Hydrological supply forecast and risk narrative"))
)]
pub struct ApiDoc;

pub fn generate_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/predecir", post(predict))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "forecast",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
#[instrument]
async fn health() -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[utoipa::path(
    post,
    path = "/predecir",
    tag = "forecast",
    request_body = PredictRequest,
    responses(
        (status = 200, description = "Forecast and narrative", body = ForecastReport),
        (status = 400, description = "Flow horizon outside 1..=12", body = ErrorResponse),
        (status = 500, description = "Malformed body or month, or model failure", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<ForecastReport>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        error!("Unreadable request body: {}", rejection.body_text());
        ApiError::MalformedInput(rejection.body_text())
    })?;

    debug!("Forecast requested for {}", request.fecha);
    let report = state.orchestrator.predict(&request.fecha).await?;

    info!(
        "Forecast for {}: flow {} l/s, temperature {}, precipitation {}",
        report.target, report.flow_lps, report.temperature, report.precipitation
    );
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::{ModelError, Variable};

    fn status_of(err: ForecastError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            status_of(ForecastError::InvalidHorizon { horizon: 0 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ForecastError::InvalidDate("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ForecastError::Model {
                variable: Variable::Flow,
                source: ModelError::NonFiniteForecast { step: 1 },
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_openapi_lists_predict_route() {
        let spec = serde_json::to_value(generate_openapi_spec()).unwrap();
        assert!(spec["paths"]["/predecir"]["post"].is_object());
        assert!(spec["paths"]["/health"]["get"].is_object());
    }
}
